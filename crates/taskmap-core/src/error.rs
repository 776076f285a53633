//! Error types for TaskMap

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskmapError {
    // Geometry errors
    #[error("Invalid bounding box: {reason}")]
    InvalidBoundingBox { reason: String },

    // Model errors
    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    // Backend errors
    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    #[error("Backend responded with status {status}: {message}")]
    Backend { status: u16, message: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TaskmapError {
    /// Whether this error came from talking to the search backend
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, TaskmapError::Transport { .. } | TaskmapError::Backend { .. })
    }
}

impl From<serde_json::Error> for TaskmapError {
    fn from(err: serde_json::Error) -> Self {
        TaskmapError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TaskmapError>;
