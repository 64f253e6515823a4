//! JSON array codec.

use super::{CodecError, LibraryCodec};
use crate::models::{Entry, LibraryDocument};

/// Stores a library as a pretty-printed JSON array of entries.
///
/// An empty (or whitespace-only) file decodes to an empty library, so files
/// made by `create_library` are readable. There is no place for text outside
/// entries, so verbatim blocks are not written.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl LibraryCodec for JsonCodec {
    fn decode(&self, bytes: &[u8]) -> Result<LibraryDocument, CodecError> {
        let text = std::str::from_utf8(bytes)?;
        if text.trim().is_empty() {
            return Ok(LibraryDocument::new());
        }
        let entries: Vec<Entry> = serde_json::from_str(text)?;
        Ok(LibraryDocument::from_entries(entries))
    }

    fn encode(&self, document: &LibraryDocument) -> Result<Vec<u8>, CodecError> {
        let entries: Vec<&Entry> = document.entries().collect();
        let mut bytes = serde_json::to_vec_pretty(&entries)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_empty_library() {
        assert_eq!(JsonCodec.decode(b"").unwrap().entry_count(), 0);
        assert_eq!(JsonCodec.decode(b"  \n").unwrap().entry_count(), 0);
    }

    #[test]
    fn test_round_trip() {
        let entries = vec![
            Entry::new("article")
                .with_citation_key("abc1")
                .with_field("title", "X"),
            Entry::new("book").with_field("title", "No key"),
        ];
        let bytes = JsonCodec
            .encode(&LibraryDocument::from_entries(entries.clone()))
            .unwrap();
        assert_eq!(JsonCodec.decode(&bytes).unwrap().into_entries(), entries);
    }

    #[test]
    fn test_malformed_json_fails() {
        let result = JsonCodec.decode(b"[{\"citation_key\": ");
        assert!(matches!(result, Err(CodecError::Json(_))));
    }
}
