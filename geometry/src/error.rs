#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
    #[error("mesh build failed: {0}")]
    Mesh(String),
}

impl GeometryError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        GeometryError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, GeometryError::InvalidArgument { .. })
    }
}
