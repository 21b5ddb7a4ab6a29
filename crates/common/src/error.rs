//! Error types shared across Photostrip crates.

/// Top-level error type for Photostrip operations.
#[derive(Debug, thiserror::Error)]
pub enum PhotostripError {
    #[error("Camera frame unavailable")]
    CaptureUnavailable,

    #[error("Session full: all {capacity} photos already taken")]
    SessionFull { capacity: usize },

    #[error("Not enough photos: have {have}, need {need}")]
    NotEnoughPhotos { have: usize, need: usize },

    #[error("Not in editing mode")]
    NotEditing,

    #[error("Unknown frame style: {name}")]
    UnknownStyle { name: String },

    #[error("An export is already in progress")]
    ExportInProgress,

    #[error("Timed out after {timeout_ms}ms waiting for {pending} image(s) to decode")]
    DecodeTimeout { pending: usize, timeout_ms: u64 },

    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using PhotostripError.
pub type PhotostripResult<T> = Result<T, PhotostripError>;

impl PhotostripError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error is a session-level rejection that leaves state untouched.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::CaptureUnavailable
                | Self::SessionFull { .. }
                | Self::NotEnoughPhotos { .. }
                | Self::NotEditing
                | Self::UnknownStyle { .. }
        )
    }
}
