use std::sync::atomic::{AtomicU64, Ordering};

use crate::mesh::Mesh;

pub mod layout;
pub mod recording;

pub use layout::VertexLayout;
pub use recording::{DrawRecord, RecordingContext};

/// Process-unique identity of a mesh, used by drawing contexts to cache uploaded buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

impl MeshId {
    pub fn next() -> Self {
        Self(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MeshId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrontFace {
    #[default]
    Ccw,
    Cw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveState {
    pub front_face: FrontFace,
    pub cull_back: bool,
}

impl Default for PrimitiveState {
    fn default() -> Self {
        Self {
            front_face: FrontFace::Ccw,
            cull_back: true,
        }
    }
}

/// A single indexed triangle-list submission.
#[derive(Debug, Clone, Copy)]
pub struct DrawMesh<'a> {
    pub id: MeshId,
    pub mesh: &'a Mesh,
    pub primitive: PrimitiveState,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderContextError {
    #[error("no pipeline bound on the drawing context")]
    NoPipeline,
    #[error("vertex layout mismatch: pipeline expects {expected}, mesh provides {actual}")]
    LayoutMismatch { expected: String, actual: String },
    #[error("{0} has no vertices or indices")]
    EmptyMesh(MeshId),
    #[error("graphics backend: {0}")]
    Backend(String),
}

/// Externally owned drawing state able to rasterize submitted meshes.
///
/// Implementations expect the caller to have configured everything except the mesh buffers
/// (target, pipeline, transforms).
pub trait DrawContext {
    fn draw_mesh(&mut self, draw: &DrawMesh<'_>) -> Result<(), RenderContextError>;
}

impl<T: DrawContext + ?Sized> DrawContext for &mut T {
    fn draw_mesh(&mut self, draw: &DrawMesh<'_>) -> Result<(), RenderContextError> {
        (**self).draw_mesh(draw)
    }
}

/// Checks shared by every context before touching the backend.
pub fn validate_draw(
    draw: &DrawMesh<'_>,
    expected: Option<&VertexLayout>,
) -> Result<(), RenderContextError> {
    let expected = expected.ok_or(RenderContextError::NoPipeline)?;
    if draw.mesh.is_empty() {
        return Err(RenderContextError::EmptyMesh(draw.id));
    }
    let actual = draw.mesh.vertex_layout();
    if !expected.is_satisfied_by(&actual) {
        return Err(RenderContextError::LayoutMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_ids_are_unique() {
        let a = MeshId::next();
        let b = MeshId::next();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
        assert_eq!(format!("{}", a), format!("mesh#{}", a.raw()));
    }

    #[test]
    fn errors_render_readably() {
        let err = RenderContextError::LayoutMismatch {
            expected: "a".into(),
            actual: "b".into(),
        };
        assert_eq!(
            err.to_string(),
            "vertex layout mismatch: pipeline expects a, mesh provides b"
        );
        assert_eq!(
            RenderContextError::NoPipeline.to_string(),
            "no pipeline bound on the drawing context"
        );
    }
}
