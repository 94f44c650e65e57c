use indexmap::IndexMap;

use crate::{
    render::layout::{VertexAttribute, VertexBufferLayout, VertexLayout},
    types::*,
    util::{any_as_u8_slice_array, read_unaligned_at},
};

pub mod builder;

/// Format of a single per-vertex attribute.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
    Float32x4,
}

impl VertexFormat {
    pub const fn size(&self) -> u32 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy)]
pub struct MeshPropertyType {
    pub name: &'static str,
    pub format: VertexFormat,
}

impl MeshPropertyType {
    pub const fn new(name: &'static str, format: VertexFormat) -> Self {
        Self { name, format }
    }

    pub const fn size(&self) -> u32 {
        self.format.size()
    }
}

pub const NORMAL_PROPERTY: MeshPropertyType =
    MeshPropertyType::new("normal_vertex", VertexFormat::Float32x3);
pub const TEXCOORD_PROPERTY: MeshPropertyType =
    MeshPropertyType::new("texcoord", VertexFormat::Float32x2);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldOffset {
    offset: u32,
    len: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    U16,
    U32,
}

#[derive(Debug, Clone)]
pub(crate) enum Indices {
    U32(Vec<u32>),
    U16(Vec<u16>),
}

impl Indices {
    fn len(&self) -> usize {
        match self {
            Indices::U32(i) => i.len(),
            Indices::U16(i) => i.len(),
        }
    }

    fn get(&self, idx: usize) -> Option<u32> {
        match self {
            Indices::U32(i) => i.get(idx).copied(),
            Indices::U16(i) => i.get(idx).map(|v| *v as u32),
        }
    }
}

/// Triangle-list mesh: a position stream, an interleaved property stream and an index stream.
pub struct Mesh {
    pub(crate) position_vertices: Vec<Vec3f>,
    pub(crate) indices: Indices,

    pub(crate) properties_offset: IndexMap<MeshPropertyType, FieldOffset>,
    pub(crate) row_strip_size: u32,
    pub(crate) properties: Vec<u8>,

    pub(crate) aabb: BoundBox,
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("vertices", &self.position_vertices.len())
            .field("indices", &self.indices.len())
            .field("properties", &self.properties_offset.keys())
            .field("aabb", &self.aabb)
            .finish()
    }
}

impl Mesh {
    pub(crate) fn new<'a, I: Iterator<Item = &'a MeshPropertyType>>(properties: I) -> Self {
        let mut properties_offset = IndexMap::new();
        let mut offset = 0;

        for prop in properties {
            properties_offset.insert(
                *prop,
                FieldOffset {
                    offset,
                    len: prop.size(),
                },
            );
            offset += prop.size();
        }

        Self {
            position_vertices: Vec::new(),
            indices: Indices::U32(Vec::new()),
            properties_offset,
            row_strip_size: offset,
            properties: Vec::new(),
            aabb: BoundBox::default(),
        }
    }

    pub fn row_strip_size(&self) -> u32 {
        self.row_strip_size
    }

    pub fn aabb(&self) -> &BoundBox {
        &self.aabb
    }

    pub fn positions(&self) -> &[Vec3f] {
        &self.position_vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.position_vertices.len()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn index_format(&self) -> IndexFormat {
        match &self.indices {
            Indices::U32(_) => IndexFormat::U32,
            Indices::U16(_) => IndexFormat::U16,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.position_vertices.is_empty() || self.indices.len() == 0
    }

    pub fn has_property(&self, property: MeshPropertyType) -> bool {
        self.properties_offset.contains_key(&property)
    }

    pub fn vertices_view(&self) -> &[u8] {
        any_as_u8_slice_array(&self.position_vertices)
    }

    pub fn indices_view(&self) -> &[u8] {
        match &self.indices {
            Indices::U32(d) => any_as_u8_slice_array(d),
            Indices::U16(d) => any_as_u8_slice_array(d),
        }
    }

    pub fn properties_view(&self) -> &[u8] {
        &self.properties
    }

    /// Index stream widened to `u32`.
    pub fn indices_u32(&self) -> Vec<u32> {
        match &self.indices {
            Indices::U32(d) => d.clone(),
            Indices::U16(d) => d.iter().map(|v| *v as u32).collect(),
        }
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        (0..self.triangle_count()).filter_map(move |t| {
            Some([
                self.indices.get(t * 3)?,
                self.indices.get(t * 3 + 1)?,
                self.indices.get(t * 3 + 2)?,
            ])
        })
    }

    /// Copies one property column out of the interleaved stream.
    /// Returns `None` when the mesh has no such property or `T` has the wrong size.
    pub fn property_vertices<T: Copy>(&self, property: MeshPropertyType) -> Option<Vec<T>> {
        let o = self.properties_offset.get(&property)?;
        if std::mem::size_of::<T>() as u32 != o.len {
            return None;
        }
        let row_strip = self.row_strip_size as usize;
        (0..self.vertex_count())
            .map(|row| read_unaligned_at::<T>(&self.properties, row * row_strip + o.offset as usize))
            .collect()
    }

    /// Buffer layout: positions in slot 0 (location 0), properties interleaved in slot 1
    /// (locations 1.. in declaration order).
    pub fn vertex_layout(&self) -> VertexLayout {
        let mut buffers = vec![VertexBufferLayout {
            slot: 0,
            stride: VertexFormat::Float32x3.size() as u64,
            attributes: vec![VertexAttribute {
                name: "position",
                format: VertexFormat::Float32x3,
                offset: 0,
                location: 0,
            }],
        }];

        if !self.properties_offset.is_empty() {
            let attributes = self
                .properties_offset
                .iter()
                .enumerate()
                .map(|(idx, (prop, o))| VertexAttribute {
                    name: prop.name,
                    format: prop.format,
                    offset: o.offset as u64,
                    location: idx as u32 + 1,
                })
                .collect();
            buffers.push(VertexBufferLayout {
                slot: 1,
                stride: self.row_strip_size as u64,
                attributes,
            });
        }

        VertexLayout { buffers }
    }
}
