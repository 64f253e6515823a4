//! Error types for the bibshelf store.
//!
//! Caller-actionable outcomes (missing library, duplicate citation key, missing
//! key) get their own variants so a transport layer can map them precisely.

use crate::codec::CodecError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for library operations.
#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("Library not found: {library}")]
    LibraryNotFound { library: String },

    #[error("Library already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("Library {library} already contains an entry with citation key {citation_key}")]
    Conflict {
        library: String,
        citation_key: String,
    },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Failed to decode {path}: {message}")]
    Decode {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<CodecError>,
    },

    #[error("Failed to encode entries: {message}")]
    Encode {
        message: String,
        #[source]
        source: Option<CodecError>,
    },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for bibshelf operations.
pub type Result<T> = std::result::Result<T, ShelfError>;

impl From<std::io::Error> for ShelfError {
    fn from(err: std::io::Error) -> Self {
        ShelfError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl ShelfError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        ShelfError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Error for an entry that cannot be written because it has no citation key.
    pub fn missing_citation_key() -> Self {
        ShelfError::Validation {
            field: "citation_key".to_string(),
            message: "Entry does not contain a citation key".to_string(),
        }
    }

    /// Map to an HTTP-style status code.
    ///
    /// - 400: validation failure
    /// - 404: library not found
    /// - 409: duplicate citation key or library already exists
    /// - 422: stored library cannot be decoded
    /// - 500: everything else
    pub fn to_status_code(&self) -> u16 {
        match self {
            ShelfError::Validation { .. } => 400,
            ShelfError::LibraryNotFound { .. } => 404,
            ShelfError::Conflict { .. } | ShelfError::AlreadyExists(_) => 409,
            ShelfError::Decode { .. } => 422,
            ShelfError::Encode { .. } | ShelfError::Io { .. } | ShelfError::Config { .. } => 500,
        }
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ShelfError::Validation { .. }
                | ShelfError::LibraryNotFound { .. }
                | ShelfError::Conflict { .. }
                | ShelfError::AlreadyExists(_)
        )
    }
}
