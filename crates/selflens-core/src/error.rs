// ── Error Types ──

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelfLensError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record {key} is not valid UTF-8")]
    Undecodable { key: String },

    #[error("severity must be between 1 and 10, got {0}")]
    InvalidSeverity(i64),

    #[error("unknown incident type: {0}")]
    UnknownType(String),

    #[error("unknown context: {0}")]
    UnknownContext(String),

    #[error("unknown emotion: {0}")]
    UnknownEmotion(String),

    #[error("emotion listed twice: {0}")]
    DuplicateEmotion(String),

    #[error("access code must be at least {min} characters")]
    AccessCodeTooShort { min: usize },

    #[error("Incorrect password")]
    IncorrectAccessCode,
}

pub type Result<T> = std::result::Result<T, SelfLensError>;
