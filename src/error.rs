use thiserror::Error;

use crate::era::EraVariant;

/// Rejections from build, impact and repair requests.
///
/// All variants are local and recoverable. The addressed quadrant is left
/// untouched whenever one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("coordinates ({x}, {z}) are outside the grid")]
    InvalidCoordinates { x: i32, z: i32 },
    #[error("layer index {index} is outside 0..=3")]
    InvalidLayerIndex { index: usize },
    #[error("layers must be built in order; expected layer {expected}")]
    OutOfSequence { expected: usize },
    #[error("layer {index} is already completed")]
    AlreadyCompleted { index: usize },
}

impl BuildError {
    /// Whether the caller may retry with a different layer index.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BuildError::OutOfSequence { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("no template configured for era {0:?}")]
    MissingEraTemplate(EraVariant),
    #[error("config validation error: {0}")]
    Validation(String),
}
