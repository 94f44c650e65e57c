mod uvsphere;

pub use uvsphere::*;
