pub mod app;
pub mod cli;
pub mod config;
pub mod model;
pub mod offscreen;

pub use geometry::{mesh::SphereParams, GeometryError};
pub use mesh_core::render::{DrawContext, RenderContextError};
pub use model::Model;
