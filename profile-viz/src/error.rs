//! One error enum per failure domain, following the teacher's
//! `state-reader::error::StateReaderError` shape: `#[error(...)]` per
//! variant, `#[from]` for wrapped causes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("input does not match any known profile format")]
    InvalidFormat,
    #[error("input was truncated before a complete profile could be read")]
    Truncated,
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(String),
    #[error("timestamps are not monotonic or are out of the declared profile range")]
    InconsistentTimestamps,
    #[error("failed to reconstruct the span tree: {0}")]
    TreeConstructionFailed(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no profile is loaded under this handle")]
    UnknownProfileHandle,
    #[error("the session has no profiles loaded")]
    EmptySession,
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("the sandwich view requires a selected span")]
    SandwichRequiresSelection,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no profile is loaded")]
    NoProfileLoaded,
    #[error(transparent)]
    SerializationFailed(#[from] serde_json::Error),
}
