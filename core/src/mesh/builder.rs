use std::collections::HashMap;

use crate::{types::Vec3f, util::any_as_u8_slice};

use super::{Indices, Mesh, MeshPropertyType};

#[derive(Default)]
pub struct MeshBuilder {
    properties: Vec<MeshPropertyType>,
    mesh: Option<Mesh>,
    has_positions: bool,
    has_indices: bool,
    properties_written: HashMap<MeshPropertyType, usize>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_property(&mut self, property: MeshPropertyType) -> anyhow::Result<()> {
        if self.mesh.is_some() {
            anyhow::bail!("please add property {} before vertex data", property.name);
        }
        if self.properties.contains(&property) {
            anyhow::bail!("property {} added twice", property.name);
        }

        self.properties.push(property);
        self.properties_written.insert(property, 0);
        Ok(())
    }

    fn finish_property(&mut self) -> &mut Mesh {
        let properties = &self.properties;
        self.mesh
            .get_or_insert_with(|| Mesh::new(properties.iter()))
    }

    pub fn add_indices32(&mut self, indices: &[u32]) -> anyhow::Result<()> {
        let has_indices = self.has_indices;
        let mesh = self.finish_property();
        if !has_indices {
            mesh.indices = Indices::U32(Vec::with_capacity(indices.len()));
        }
        match &mut mesh.indices {
            Indices::U32(d) => d.extend_from_slice(indices),
            Indices::U16(_) => anyhow::bail!("different index type"),
        }
        self.has_indices = true;
        Ok(())
    }

    pub fn add_indices16(&mut self, indices: &[u16]) -> anyhow::Result<()> {
        let has_indices = self.has_indices;
        let mesh = self.finish_property();
        if !has_indices {
            mesh.indices = Indices::U16(Vec::with_capacity(indices.len()));
        }
        match &mut mesh.indices {
            Indices::U16(d) => d.extend_from_slice(indices),
            Indices::U32(_) => anyhow::bail!("different index type"),
        }
        self.has_indices = true;
        Ok(())
    }

    pub fn add_position_vertices3(&mut self, position: &[Vec3f]) {
        let mesh = self.finish_property();
        for p in position {
            mesh.aabb = &mesh.aabb + p;
        }
        mesh.position_vertices.extend_from_slice(position);
        self.has_positions = true;
    }

    pub fn add_property_vertices<T: Copy>(
        &mut self,
        property: MeshPropertyType,
        vertices: &[T],
    ) -> anyhow::Result<()> {
        let written = match self.properties_written.get(&property) {
            Some(v) => *v,
            None => anyhow::bail!("unknown property {}", property.name),
        };
        let mesh = self.finish_property();
        let o = match mesh.properties_offset.get(&property) {
            Some(o) => *o,
            None => anyhow::bail!("unknown property {}", property.name),
        };
        if std::mem::size_of::<T>() as u32 != o.len {
            anyhow::bail!("invalid property size, {:?}", property);
        }
        let row_strip = mesh.row_strip_size as usize;
        let final_size = row_strip * (vertices.len() + written);
        if mesh.properties.len() < final_size {
            mesh.properties.resize(final_size, 0);
        }

        let mut cur_offset = row_strip * written + o.offset as usize;
        for vertex in vertices {
            let src = any_as_u8_slice(vertex);
            mesh.properties[cur_offset..cur_offset + o.len as usize].copy_from_slice(src);
            cur_offset += row_strip;
        }
        if let Some(count) = self.properties_written.get_mut(&property) {
            *count += vertices.len();
        }
        Ok(())
    }

    pub fn build(mut self) -> anyhow::Result<Mesh> {
        if !self.has_positions {
            anyhow::bail!("set position vertices first");
        }
        if !self.has_indices {
            anyhow::bail!("set indices first");
        }
        let mesh = match self.mesh.take() {
            Some(mesh) => mesh,
            None => anyhow::bail!("empty mesh"),
        };

        // check properties vertex count
        for (property, count) in &self.properties_written {
            if *count != mesh.vertex_count() {
                anyhow::bail!(
                    "property {} has {} vertices, position has {}",
                    property.name,
                    count,
                    mesh.vertex_count()
                );
            }
        }

        // check index count
        if mesh.indices.len() % 3 != 0 {
            anyhow::bail!("index count {} is not a triangle list", mesh.indices.len());
        }
        let vertex_count = mesh.vertex_count();
        if let Some(i) = (0..mesh.indices.len())
            .filter_map(|i| mesh.indices.get(i))
            .find(|i| *i as usize >= vertex_count)
        {
            anyhow::bail!("index {} out of range, vertex count {}", i, vertex_count);
        }

        if mesh.is_empty() {
            log::info!("empty mesh");
        }

        Ok(mesh)
    }
}

impl std::fmt::Debug for MeshBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshBuilder")
            .field("properties", &self.properties)
            .field("mesh", &self.mesh)
            .finish()
    }
}
