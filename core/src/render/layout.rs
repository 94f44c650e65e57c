use std::fmt::Display;

use crate::mesh::VertexFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub format: VertexFormat,
    pub offset: u64,
    pub location: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBufferLayout {
    pub slot: u32,
    pub stride: u64,
    pub attributes: Vec<VertexAttribute>,
}

/// Vertex buffers a mesh binds, or a pipeline consumes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexLayout {
    pub buffers: Vec<VertexBufferLayout>,
}

impl VertexLayout {
    pub fn buffer(&self, slot: u32) -> Option<&VertexBufferLayout> {
        self.buffers.iter().find(|b| b.slot == slot)
    }

    /// A pipeline layout is satisfied when every attribute it reads is present in the mesh
    /// at the same slot, offset and stride. Extra mesh attributes are ignored.
    pub fn is_satisfied_by(&self, mesh: &VertexLayout) -> bool {
        self.buffers.iter().all(|expected| {
            let Some(actual) = mesh.buffer(expected.slot) else {
                return false;
            };
            expected.stride == actual.stride
                && expected.attributes.iter().all(|a| {
                    actual.attributes.iter().any(|b| {
                        a.location == b.location && a.format == b.format && a.offset == b.offset
                    })
                })
        })
    }
}

impl Display for VertexLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, buffer) in self.buffers.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "slot {} stride {}:", buffer.slot, buffer.stride)?;
            for a in &buffer.attributes {
                write!(f, " {}@{}={:?}+{}", a.name, a.location, a.format, a.offset)?;
            }
        }
        write!(f, "]")
    }
}
