use std::path::Path;

use mesh_core::{
    backends::wgpu_backend::{to_wgpu_primitive, MeshBufferCache, WgpuDrawContext, WgpuVertexLayout},
    mesh::{VertexFormat, NORMAL_PROPERTY, TEXCOORD_PROPERTY},
    render::{
        layout::{VertexAttribute, VertexBufferLayout},
        RenderContextError, VertexLayout,
    },
    types::{Mat4x4f, Point3, Size, Vec3f, Vec4f},
    util::any_as_u8_slice,
};

use crate::model::Model;

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

/// Maps OpenGL clip depth `[-1, 1]` to wgpu's `[0, 1]`.
#[rustfmt::skip]
fn opengl_to_wgpu() -> Mat4x4f {
    Mat4x4f::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

#[repr(C)]
#[derive(Clone, Copy)]
struct GlobalUniform {
    view_proj: Mat4x4f,
    light: Vec4f,
}

impl GlobalUniform {
    /// Outside view for spheres, inside view looking at the horizon for inward shells.
    fn for_model(model: &Model, aspect: f32) -> Self {
        let r = model.params().radius;
        let (eye, target, light) = if model.params().inward_normals {
            (
                Point3::new(0f32, 0.05 * r, 0f32),
                Point3::new(0f32, 0.35 * r, r),
                Vec4f::new(0f32, -1f32, -0.3, 0f32),
            )
        } else {
            (
                Point3::new(0f32, 1.2 * r, 3f32 * r),
                Point3::origin(),
                Vec4f::new(0.4, 1f32, 0.6, 0f32),
            )
        };
        let view = Mat4x4f::look_at_rh(&eye, &target, &Vec3f::y());
        let proj = Mat4x4f::new_perspective(aspect, std::f32::consts::FRAC_PI_3, 0.01 * r, 10f32 * r);
        Self {
            view_proj: opengl_to_wgpu() * proj * view,
            light,
        }
    }
}

/// Vertex layout `shaders/mesh.wgsl` reads.
pub fn shader_layout() -> VertexLayout {
    VertexLayout {
        buffers: vec![
            VertexBufferLayout {
                slot: 0,
                stride: VertexFormat::Float32x3.size() as u64,
                attributes: vec![VertexAttribute {
                    name: "position",
                    format: VertexFormat::Float32x3,
                    offset: 0,
                    location: 0,
                }],
            },
            VertexBufferLayout {
                slot: 1,
                stride: (NORMAL_PROPERTY.size() + TEXCOORD_PROPERTY.size()) as u64,
                attributes: vec![
                    VertexAttribute {
                        name: NORMAL_PROPERTY.name,
                        format: NORMAL_PROPERTY.format,
                        offset: 0,
                        location: 1,
                    },
                    VertexAttribute {
                        name: TEXCOORD_PROPERTY.name,
                        format: TEXCOORD_PROPERTY.format,
                        offset: NORMAL_PROPERTY.size() as u64,
                        location: 2,
                    },
                ],
            },
        ],
    }
}

fn backend_err(e: impl std::fmt::Display) -> RenderContextError {
    RenderContextError::Backend(e.to_string())
}

/// Headless wgpu host: owns the device, a colour and depth target, the mesh pipeline and the
/// read-back of the last frame.
pub struct Offscreen {
    device: wgpu::Device,
    queue: wgpu::Queue,
    size: Size,
    color: wgpu::Texture,
    depth_view: wgpu::TextureView,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    readback: wgpu::Buffer,
    padded_row: u32,
    cache: MeshBufferCache,
    frame: Vec<u8>,
}

impl Offscreen {
    pub fn new(width: u32, height: u32) -> Result<Self, RenderContextError> {
        pollster::block_on(Self::new_async(width, height))
    }

    async fn new_async(width: u32, height: u32) -> Result<Self, RenderContextError> {
        if width == 0 || height == 0 {
            return Err(backend_err(format!("invalid target size {}x{}", width, height)));
        }

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| backend_err("no suitable graphics adapter"))?;
        log::info!("using adapter {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("offscreen device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(backend_err)?;

        let max = device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(backend_err(format!(
                "target size {}x{} exceeds the device limit of {}",
                width, height, max
            )));
        }
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_row = width
            .checked_mul(4)
            .and_then(|row| row.checked_next_multiple_of(align))
            .ok_or_else(|| backend_err(format!("target width {} is too large", width)))?;

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen color"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen depth"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("global uniform"),
            size: std::mem::size_of::<GlobalUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("global uniform"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("global uniform"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/mesh.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let vertex_layout = WgpuVertexLayout::new(&shader_layout());
        let vertex_buffers = vertex_layout.buffers();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &vertex_buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: to_wgpu_primitive(Model::primitive()),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("offscreen readback"),
            size: padded_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let validation = device.pop_error_scope().await;
        let oom = device.pop_error_scope().await;
        if let Some(err) = validation.or(oom) {
            return Err(backend_err(err));
        }

        Ok(Self {
            device,
            queue,
            size: Size::new(width, height),
            color,
            depth_view,
            uniform,
            bind_group,
            pipeline,
            readback,
            padded_row,
            cache: MeshBufferCache::new(),
            frame: Vec::new(),
        })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// RGBA8 pixels of the last rendered frame, row-major without padding.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.x || y >= self.size.y {
            return None;
        }
        let at = (y as usize * self.size.x as usize + x as usize) * 4;
        let p = self.frame.get(at..at + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    pub fn cached_meshes(&self) -> usize {
        self.cache.len()
    }

    pub fn render(&mut self, model: &Model) -> Result<(), RenderContextError> {
        let aspect = self.size.x as f32 / self.size.y as f32;
        let uniform = GlobalUniform::for_model(model, aspect);
        self.queue
            .write_buffer(&self.uniform, 0, any_as_u8_slice(&uniform));

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let color_view = self
            .color
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("offscreen encoder"),
            });

        let drawn = {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("offscreen pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.bind_group, &[]);

            let mut ctx = WgpuDrawContext::new(&self.device, &mut pass, &mut self.cache);
            ctx.set_pipeline(&self.pipeline, shader_layout(), Model::primitive());
            model.render(&mut ctx)
        };

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.color,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_row),
                    rows_per_image: Some(self.size.y),
                },
            },
            wgpu::Extent3d {
                width: self.size.x,
                height: self.size.y,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(backend_err(err));
        }
        drawn?;

        self.read_frame()
    }

    fn read_frame(&mut self) -> Result<(), RenderContextError> {
        let slice = self.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(backend_err)?
            .map_err(backend_err)?;

        let row = (self.size.x * 4) as usize;
        let mut frame = Vec::with_capacity(row * self.size.y as usize);
        {
            let mapped = slice.get_mapped_range();
            for chunk in mapped.chunks(self.padded_row as usize) {
                frame.extend_from_slice(&chunk[..row]);
            }
        }
        self.readback.unmap();
        self.frame = frame;
        Ok(())
    }

    pub fn save_png(&self, path: &Path) -> anyhow::Result<()> {
        if self.frame.is_empty() {
            anyhow::bail!("nothing rendered yet");
        }
        image::save_buffer(
            path,
            &self.frame,
            self.size.x,
            self.size.y,
            image::ColorType::Rgba8,
        )?;
        Ok(())
    }
}
