use fxhash::FxHashMap;
use wgpu::util::DeviceExt;

use crate::{
    mesh::{IndexFormat, Mesh, VertexFormat},
    render::{
        validate_draw, DrawContext, DrawMesh, FrontFace, MeshId, PrimitiveState,
        RenderContextError, VertexLayout,
    },
};

pub fn to_wgpu_vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}

pub fn to_wgpu_index_format(format: IndexFormat) -> wgpu::IndexFormat {
    match format {
        IndexFormat::U16 => wgpu::IndexFormat::Uint16,
        IndexFormat::U32 => wgpu::IndexFormat::Uint32,
    }
}

pub fn to_wgpu_primitive(primitive: PrimitiveState) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        front_face: match primitive.front_face {
            FrontFace::Ccw => wgpu::FrontFace::Ccw,
            FrontFace::Cw => wgpu::FrontFace::Cw,
        },
        cull_mode: primitive.cull_back.then_some(wgpu::Face::Back),
        ..Default::default()
    }
}

/// Owned wgpu attribute lists for a [`VertexLayout`], so pipelines can borrow
/// `wgpu::VertexBufferLayout`s from it.
#[derive(Debug, Clone)]
pub struct WgpuVertexLayout {
    buffers: Vec<(u64, Vec<wgpu::VertexAttribute>)>,
}

impl WgpuVertexLayout {
    pub fn new(layout: &VertexLayout) -> Self {
        let mut sorted: Vec<_> = layout.buffers.iter().collect();
        sorted.sort_by_key(|b| b.slot);
        let buffers = sorted
            .into_iter()
            .map(|b| {
                let attributes = b
                    .attributes
                    .iter()
                    .map(|a| wgpu::VertexAttribute {
                        format: to_wgpu_vertex_format(a.format),
                        offset: a.offset,
                        shader_location: a.location,
                    })
                    .collect();
                (b.stride, attributes)
            })
            .collect();
        Self { buffers }
    }

    pub fn buffers(&self) -> Vec<wgpu::VertexBufferLayout<'_>> {
        self.buffers
            .iter()
            .map(|(stride, attributes)| wgpu::VertexBufferLayout {
                array_stride: *stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect()
    }
}

pub struct ObjectBuffer {
    pub index: wgpu::Buffer,
    pub vertex: wgpu::Buffer,
    pub vertex_properties: Option<wgpu::Buffer>,
    pub index_format: wgpu::IndexFormat,
    pub index_count: u32,
}

impl ObjectBuffer {
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex.slice(..));
        if let Some(p) = &self.vertex_properties {
            pass.set_vertex_buffer(1, p.slice(..));
        }
        pass.set_index_buffer(self.index.slice(..), self.index_format);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

fn create_static_object_buffer(id: MeshId, mesh: &Mesh, device: &wgpu::Device) -> ObjectBuffer {
    let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} index buffer", id)),
        contents: mesh.indices_view(),
        usage: wgpu::BufferUsages::INDEX,
    });

    let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} vertex buffer", id)),
        contents: mesh.vertices_view(),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let vertex_properties = if !mesh.properties_view().is_empty() {
        Some(
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} vertex properties buffer", id)),
                contents: mesh.properties_view(),
                usage: wgpu::BufferUsages::VERTEX,
            }),
        )
    } else {
        None
    };

    ObjectBuffer {
        index,
        vertex,
        vertex_properties,
        index_format: to_wgpu_index_format(mesh.index_format()),
        index_count: mesh.index_count(),
    }
}

/// GPU buffers of meshes already uploaded, keyed by [`MeshId`]. Meshes are immutable, so an
/// entry stays valid for the cache's lifetime.
#[derive(Default)]
pub struct MeshBufferCache {
    buffers: FxHashMap<MeshId, ObjectBuffer>,
}

impl MeshBufferCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, device: &wgpu::Device, id: MeshId, mesh: &Mesh) -> &ObjectBuffer {
        self.buffers.entry(id).or_insert_with(|| {
            log::debug!(
                "upload {}: {} vertices, {} indices",
                id,
                mesh.vertex_count(),
                mesh.index_count()
            );
            create_static_object_buffer(id, mesh, device)
        })
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

struct BoundPipeline {
    layout: VertexLayout,
    primitive: PrimitiveState,
}

/// Drawing context over an active wgpu render pass.
///
/// The host binds a pipeline with [`WgpuDrawContext::set_pipeline`]; meshes are uploaded on
/// first use through the cache and drawn with `draw_indexed`.
pub struct WgpuDrawContext<'a, 'p> {
    device: &'a wgpu::Device,
    pass: &'a mut wgpu::RenderPass<'p>,
    cache: &'a mut MeshBufferCache,
    pipeline: Option<BoundPipeline>,
}

impl<'a, 'p> WgpuDrawContext<'a, 'p> {
    pub fn new(
        device: &'a wgpu::Device,
        pass: &'a mut wgpu::RenderPass<'p>,
        cache: &'a mut MeshBufferCache,
    ) -> Self {
        Self {
            device,
            pass,
            cache,
            pipeline: None,
        }
    }

    /// `layout` and `primitive` must be the ones `pipeline` was created with.
    pub fn set_pipeline(
        &mut self,
        pipeline: &wgpu::RenderPipeline,
        layout: VertexLayout,
        primitive: PrimitiveState,
    ) {
        self.pass.set_pipeline(pipeline);
        self.pipeline = Some(BoundPipeline { layout, primitive });
    }
}

impl<'a, 'p> DrawContext for WgpuDrawContext<'a, 'p> {
    fn draw_mesh(&mut self, draw: &DrawMesh<'_>) -> Result<(), RenderContextError> {
        let bound = self.pipeline.as_ref();
        validate_draw(draw, bound.map(|b| &b.layout))?;
        if let Some(bound) = bound {
            if bound.primitive != draw.primitive {
                return Err(RenderContextError::Backend(format!(
                    "pipeline primitive state {:?} does not match {:?}",
                    bound.primitive, draw.primitive
                )));
            }
        }

        let buffer = self.cache.get_or_create(self.device, draw.id, draw.mesh);
        buffer.draw(self.pass);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{builder::MeshBuilder, NORMAL_PROPERTY, TEXCOORD_PROPERTY};
    use crate::types::{Vec2f, Vec3f};

    #[test]
    fn wgpu_layout_mirrors_mesh_layout() {
        let mut builder = MeshBuilder::new();
        builder.add_property(NORMAL_PROPERTY).unwrap();
        builder.add_property(TEXCOORD_PROPERTY).unwrap();
        builder.add_position_vertices3(&[Vec3f::zeros(); 3]);
        builder
            .add_property_vertices(NORMAL_PROPERTY, &[Vec3f::y(); 3])
            .unwrap();
        builder
            .add_property_vertices(TEXCOORD_PROPERTY, &[Vec2f::zeros(); 3])
            .unwrap();
        builder.add_indices16(&[0, 1, 2]).unwrap();
        let mesh = builder.build().unwrap();

        let layout = WgpuVertexLayout::new(&mesh.vertex_layout());
        let buffers = layout.buffers();
        assert_eq!(buffers.len(), 2);
        assert_eq!(buffers[0].array_stride, 12);
        assert_eq!(buffers[0].attributes[0].format, wgpu::VertexFormat::Float32x3);
        assert_eq!(buffers[1].array_stride, 20);
        assert_eq!(buffers[1].attributes[1].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(buffers[1].attributes[1].shader_location, 2);
        assert_eq!(
            to_wgpu_index_format(mesh.index_format()),
            wgpu::IndexFormat::Uint16
        );
    }

    #[test]
    fn primitive_maps_cull_mode() {
        let p = to_wgpu_primitive(PrimitiveState::default());
        assert_eq!(p.front_face, wgpu::FrontFace::Ccw);
        assert_eq!(p.cull_mode, Some(wgpu::Face::Back));
        let p = to_wgpu_primitive(PrimitiveState {
            front_face: FrontFace::Cw,
            cull_back: false,
        });
        assert_eq!(p.front_face, wgpu::FrontFace::Cw);
        assert_eq!(p.cull_mode, None);
    }
}
