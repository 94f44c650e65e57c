pub mod wgpu_backend;
