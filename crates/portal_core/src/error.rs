use thiserror::Error;

/// Errors raised when values cross into the portal library from outside.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PortalError {
    #[error("world index {0} is outside 0..6")]
    WorldOutOfRange(i32),
    #[error("expected a 3-component point, got {len} components")]
    InvalidPoint { len: usize },
    #[error("point has non-finite coordinates")]
    NonFinitePoint,
}
