pub mod backends;
pub mod mesh;
pub mod render;
pub mod types;
pub mod util;
