use std::sync::Arc;

use geometry::{
    mesh::{SphereParams, UVSphereBuilder},
    GeometryError,
};
use mesh_core::{
    mesh::Mesh,
    render::{
        DrawContext, DrawMesh, FrontFace, MeshId, PrimitiveState, RenderContextError,
        VertexLayout,
    },
    types::BoundBox,
};

/// A parametric sphere or hemisphere, tessellated once at construction and drawn on demand.
///
/// The mesh carries positions, unit normals and texture coordinates. Triangles are
/// counter-clockwise when seen from the side the normals point to, so back-face culling
/// keeps the outside of a sphere and the inside of a skydome.
#[derive(Debug, Clone)]
pub struct Model {
    id: MeshId,
    params: SphereParams,
    mesh: Arc<Mesh>,
}

impl Model {
    pub fn new_sphere(
        radius: f32,
        radial_segments: u32,
        vertical_segments: u32,
        inward_normals: bool,
        hemisphere: bool,
    ) -> Result<Self, GeometryError> {
        Self::from_params(SphereParams {
            radius,
            radial_segments,
            vertical_segments,
            inward_normals,
            hemisphere,
        })
    }

    pub fn from_params(params: SphereParams) -> Result<Self, GeometryError> {
        let mesh = UVSphereBuilder::from_params(params)
            .enable_normal()
            .enable_texcoord()
            .build()?;
        let id = MeshId::next();
        log::debug!(
            "model {} built: {} vertices, {} triangles",
            id,
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(Self {
            id,
            params,
            mesh: Arc::new(mesh),
        })
    }

    /// Primitive state every model is drawn with.
    pub fn primitive() -> PrimitiveState {
        PrimitiveState::default()
    }

    pub fn front_face(&self) -> FrontFace {
        Self::primitive().front_face
    }

    /// Submits the mesh to `ctx`. The context must already have a pipeline bound.
    pub fn render(&self, ctx: &mut dyn DrawContext) -> Result<(), RenderContextError> {
        ctx.draw_mesh(&DrawMesh {
            id: self.id,
            mesh: &self.mesh,
            primitive: Self::primitive(),
        })
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn params(&self) -> &SphereParams {
        &self.params
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    pub fn vertex_layout(&self) -> VertexLayout {
        self.mesh.vertex_layout()
    }

    pub fn aabb(&self) -> &BoundBox {
        self.mesh.aabb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_core::render::RecordingContext;

    #[test]
    fn render_records_one_draw_per_call() {
        let model = Model::new_sphere(1f32, 8, 4, false, false).unwrap();
        let mut ctx = RecordingContext::with_pipeline(model.vertex_layout());
        model.render(&mut ctx).unwrap();
        model.render(&mut ctx).unwrap();

        let records = ctx.records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.id == model.id()));
        assert_eq!(records[0].vertex_count, 9 * 5);
        assert_eq!(records[0].index_count, 8 * 4 * 6);
    }

    #[test]
    fn render_without_pipeline_propagates() {
        let model = Model::new_sphere(1f32, 8, 4, false, false).unwrap();
        let err = model.render(&mut RecordingContext::new()).unwrap_err();
        assert!(matches!(err, RenderContextError::NoPipeline));
    }

    #[test]
    fn clones_share_the_mesh() {
        let model = Model::new_sphere(1f32, 8, 4, true, true).unwrap();
        let other = model.clone();
        assert!(Arc::ptr_eq(model.mesh(), other.mesh()));
        assert_eq!(model.id(), other.id());
    }

    #[test]
    fn every_model_gets_its_own_id() {
        let a = Model::new_sphere(1f32, 8, 4, false, false).unwrap();
        let b = Model::new_sphere(1f32, 8, 4, false, false).unwrap();
        assert_ne!(a.id(), b.id());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn model_is_send_sync() {
        assert_send_sync::<Model>();
    }
}
