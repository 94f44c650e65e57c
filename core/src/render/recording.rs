use crate::mesh::IndexFormat;

use super::{
    validate_draw, DrawContext, DrawMesh, FrontFace, MeshId, RenderContextError, VertexLayout,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    pub id: MeshId,
    pub vertex_count: usize,
    pub index_count: u32,
    pub index_format: IndexFormat,
    pub front_face: FrontFace,
    pub cull_back: bool,
}

/// Headless drawing context. Validates submissions like a GPU context would and keeps a log
/// of what was drawn.
#[derive(Debug, Default)]
pub struct RecordingContext {
    layout: Option<VertexLayout>,
    records: Vec<DrawRecord>,
}

impl RecordingContext {
    /// A context with no pipeline bound; every draw fails until `set_pipeline` is called.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pipeline(layout: VertexLayout) -> Self {
        Self {
            layout: Some(layout),
            records: Vec::new(),
        }
    }

    pub fn set_pipeline(&mut self, layout: VertexLayout) {
        self.layout = Some(layout);
    }

    pub fn records(&self) -> &[DrawRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl DrawContext for RecordingContext {
    fn draw_mesh(&mut self, draw: &DrawMesh<'_>) -> Result<(), RenderContextError> {
        validate_draw(draw, self.layout.as_ref())?;
        let record = DrawRecord {
            id: draw.id,
            vertex_count: draw.mesh.vertex_count(),
            index_count: draw.mesh.index_count(),
            index_format: draw.mesh.index_format(),
            front_face: draw.primitive.front_face,
            cull_back: draw.primitive.cull_back,
        };
        log::trace!("record draw {:?}", record);
        self.records.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mesh::{builder::MeshBuilder, Mesh, NORMAL_PROPERTY},
        render::PrimitiveState,
        types::Vec3f,
    };

    fn triangle() -> Mesh {
        let mut builder = MeshBuilder::new();
        builder.add_property(NORMAL_PROPERTY).unwrap();
        builder.add_position_vertices3(&[
            Vec3f::new(0.0, 0.0, 0.0),
            Vec3f::new(1.0, 0.0, 0.0),
            Vec3f::new(0.0, 1.0, 0.0),
        ]);
        builder
            .add_property_vertices(NORMAL_PROPERTY, &[Vec3f::z(); 3])
            .unwrap();
        builder.add_indices32(&[0, 1, 2]).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn draw_without_pipeline_fails() {
        let mesh = triangle();
        let mut ctx = RecordingContext::new();
        let err = ctx
            .draw_mesh(&DrawMesh {
                id: MeshId::next(),
                mesh: &mesh,
                primitive: PrimitiveState::default(),
            })
            .unwrap_err();
        assert!(matches!(err, RenderContextError::NoPipeline));
        assert!(ctx.records().is_empty());
    }

    #[test]
    fn draw_is_recorded() {
        let mesh = triangle();
        let id = MeshId::next();
        let mut ctx = RecordingContext::with_pipeline(mesh.vertex_layout());
        ctx.draw_mesh(&DrawMesh {
            id,
            mesh: &mesh,
            primitive: PrimitiveState::default(),
        })
        .unwrap();

        assert_eq!(
            ctx.records(),
            &[DrawRecord {
                id,
                vertex_count: 3,
                index_count: 3,
                index_format: IndexFormat::U32,
                front_face: FrontFace::Ccw,
                cull_back: true,
            }]
        );
        ctx.clear();
        assert!(ctx.records().is_empty());
    }

    #[test]
    fn layout_mismatch_is_reported() {
        let mesh = triangle();
        let mut expected = mesh.vertex_layout();
        expected.buffers[1].stride = 24;
        let mut ctx = RecordingContext::with_pipeline(expected);
        let err = ctx
            .draw_mesh(&DrawMesh {
                id: MeshId::next(),
                mesh: &mesh,
                primitive: PrimitiveState::default(),
            })
            .unwrap_err();
        assert!(matches!(err, RenderContextError::LayoutMismatch { .. }));
    }
}
