//! Library file codecs.
//!
//! The store never parses library files itself. It hands bytes to a
//! [`LibraryCodec`] and gets an ordered entry list back, and the reverse on
//! persist. Two codecs ship with the crate:
//! - [`BibtexCodec`] - plain BibTeX text (default)
//! - [`JsonCodec`] - a JSON array of entries

mod bibtex;
mod json;

pub use bibtex::BibtexCodec;
pub use json::JsonCodec;

use crate::models::{Entry, LibraryDocument};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("File is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot encode entry: {0}")]
    Unencodable(String),
}

/// Decode/encode capability for library files.
///
/// Contract:
/// - `decode` is total over well-formed input and fails on malformed input.
/// - `encode` is total over documents whose entries pass `validate` and
///   have unique non-empty citation keys.
/// - `decode(encode(doc)).into_entries() == doc.into_entries()`.
pub trait LibraryCodec: Send + Sync {
    /// Parse file contents, preserving file order.
    fn decode(&self, bytes: &[u8]) -> Result<LibraryDocument, CodecError>;

    /// Serialize a document into file contents.
    fn encode(&self, document: &LibraryDocument) -> Result<Vec<u8>, CodecError>;

    /// Check that `encode` can write this entry.
    ///
    /// Called before a mutation touches the disk.
    fn validate(&self, _entry: &Entry) -> Result<(), CodecError> {
        Ok(())
    }

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Codec selectable by name (CLI flag, config value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecKind {
    #[default]
    Bibtex,
    Json,
}

impl CodecKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bibtex" | "bib" => Some(CodecKind::Bibtex),
            "json" => Some(CodecKind::Json),
            _ => None,
        }
    }

    /// Build the codec instance.
    pub fn codec(&self) -> Arc<dyn LibraryCodec> {
        match self {
            CodecKind::Bibtex => Arc::new(BibtexCodec),
            CodecKind::Json => Arc::new(JsonCodec),
        }
    }
}
