use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the chat statistics crates.
#[derive(Error, Debug)]
pub enum StatsError {
    /// The export directory layout does not match `<inbox>/<chat>/message_1.json`.
    #[error("Invalid export layout at {path}: {reason}")]
    Layout { path: PathBuf, reason: String },

    /// A required top-level field is missing or has the wrong JSON type.
    #[error("Schema error: {0}")]
    Schema(String),

    /// The `thread_type` value is not one the loader knows how to map.
    #[error("Unsupported thread type: {0}")]
    UnsupportedThreadType(String),

    /// A message record could not be normalised.
    #[error("Malformed record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// An aggregate operation was called with input it cannot summarise.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StatsError {
    /// Shorthand for building a [`StatsError::Layout`].
    pub fn layout(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StatsError::Layout {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the chat statistics crates.
pub type Result<T> = std::result::Result<T, StatsError>;
