use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the ingestion core.
///
/// Every variant except [`IngestError::Config`] is attributable to a single
/// file or video id; batch callers attach them to that item and carry on.
#[derive(Error, Debug)]
pub enum IngestError {
    /// A required external tool is missing or misconfigured. Fatal to the run.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to hash {path}: {source}")]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Probing or transcoding failed, or no usable codec was found.
    #[error("media error for {path}: {message}")]
    Media { path: PathBuf, message: String },

    /// Malformed cue-sheet text.
    #[error("malformed cue sheet (line {line}): {message}")]
    Format { line: usize, message: String },

    #[error("path {path} is outside of {root}")]
    Path { path: PathBuf, root: PathBuf },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// A caller-supplied value was rejected before touching any state.
    #[error("invalid value: {0}")]
    Invalid(String),

    /// The record database could not be parsed or serialized.
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn media(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Media {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }

    /// True when the whole run must stop, not just the current item.
    #[must_use]
    pub const fn is_run_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
