//! BibTeX codec on top of the `biblatex` raw parser.
//!
//! Decoding keeps the file intact around the entries: `@string`, `@preamble`
//! and `@comment` blocks, `%` comments and any other text between entries
//! become verbatim blocks, and each entry remembers its source text. Encoding
//! writes verbatim blocks and unmodified entries back unchanged and formats
//! only new or replaced entries.
//!
//! Field values are exposed with `@string` macros resolved. Macros that are
//! not defined in the file (such as month names) keep their name. Entries
//! must use braces; `@type(...)` entries are a syntax error.

use super::{CodecError, LibraryCodec};
use crate::models::{Block, Entry, LibraryDocument};
use biblatex::{RawBibliography, RawChunk, Spanned};
use std::borrow::Cow;
use std::collections::HashMap;

/// Block types that are not bibliography entries.
const NON_ENTRY_BLOCKS: &[&str] = &["comment", "preamble", "string"];

#[derive(Debug, Clone, Copy, Default)]
pub struct BibtexCodec;

impl LibraryCodec for BibtexCodec {
    fn decode(&self, bytes: &[u8]) -> Result<LibraryDocument, CodecError> {
        let text = std::str::from_utf8(bytes)?;
        decode_document(text)
    }

    fn encode(&self, document: &LibraryDocument) -> Result<Vec<u8>, CodecError> {
        let mut out = String::new();
        for block in document.blocks() {
            match block {
                Block::Verbatim(text) => out.push_str(text),
                Block::Entry {
                    source: Some(source),
                    ..
                } => out.push_str(source),
                Block::Entry {
                    entry,
                    source: None,
                } => {
                    if !out.is_empty() {
                        while !out.ends_with("\n\n") {
                            out.push('\n');
                        }
                    }
                    write_entry(&mut out, entry)?;
                }
            }
        }
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out.into_bytes())
    }

    fn validate(&self, entry: &Entry) -> Result<(), CodecError> {
        if !is_identifier(&entry.entry_type)
            || NON_ENTRY_BLOCKS.contains(&entry.entry_type.to_lowercase().as_str())
        {
            return Err(CodecError::Unencodable(format!(
                "invalid entry type {:?}",
                entry.entry_type
            )));
        }
        let key = entry.citation_key().unwrap_or("");
        if key
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, ',' | '{' | '}'))
        {
            return Err(CodecError::Unencodable(format!(
                "invalid citation key {:?}",
                key
            )));
        }
        for (name, value) in &entry.fields {
            if !is_identifier(name) {
                return Err(CodecError::Unencodable(format!(
                    "invalid field name {:?}",
                    name
                )));
            }
            if !braces_balanced(value) {
                return Err(CodecError::Unencodable(format!(
                    "unbalanced braces in field {}",
                    name
                )));
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "bibtex"
    }
}

fn decode_document(src: &str) -> Result<LibraryDocument, CodecError> {
    let masked = mask_stray_markers(src);
    let raw = RawBibliography::parse(&masked).map_err(|e| CodecError::Syntax {
        line: line_of(src, e.span.start),
        message: e.kind.to_string(),
    })?;

    let macros = resolve_macros(&raw);
    let mut document = LibraryDocument::new();
    let mut cursor = 0;
    for spanned in &raw.entries {
        let start = spanned.span.start;
        let end = entry_end(&masked, spanned.span.end);
        document.push_verbatim(&src[cursor..start]);

        let raw_entry = &spanned.v;
        let mut entry = Entry::new(raw_entry.kind.v);
        if !raw_entry.key.v.is_empty() {
            entry.citation_key = Some(raw_entry.key.v.to_string());
        }
        for pair in &raw_entry.fields {
            entry
                .fields
                .insert(pair.key.v.to_string(), field_text(&pair.value.v, &macros));
        }
        document.push_decoded(entry, &src[start..end]);
        cursor = end;
    }
    document.push_verbatim(&src[cursor..]);
    Ok(document)
}

/// `@string` definitions, keyed by lowercased name.
fn resolve_macros(raw: &RawBibliography<'_>) -> HashMap<String, String> {
    let mut macros = HashMap::new();
    for pair in &raw.abbreviations {
        let value = field_text(&pair.value.v, &macros);
        macros.insert(pair.key.v.to_lowercase(), value);
    }
    macros
}

fn field_text(chunks: &[Spanned<RawChunk<'_>>], macros: &HashMap<String, String>) -> String {
    let mut text = String::new();
    for chunk in chunks {
        match chunk.v {
            RawChunk::Normal(s) => text.push_str(s),
            RawChunk::Abbreviation(name) => match macros.get(&name.to_lowercase()) {
                Some(value) => text.push_str(value),
                None => text.push_str(name),
            },
        }
    }
    text
}

/// End of an entry's source, just past its closing delimiter.
///
/// The parser's entry span stops before the closing brace.
fn entry_end(src: &str, span_end: usize) -> usize {
    let rest = &src[span_end..];
    let trimmed = rest.trim_start();
    let skipped = rest.len() - trimmed.len();
    match trimmed.chars().next() {
        Some(c @ ('}' | '"')) => span_end + skipped + c.len_utf8(),
        _ => span_end,
    }
}

/// Blank out `@` characters that do not open a block.
///
/// BibTeX ignores text between entries, so an address like
/// `jane@example.org` in a header must not be read as an entry. Only an `@`
/// followed by an identifier and an opening delimiter starts a block. The
/// replacement is one byte wide, so parser offsets still index `src`.
fn mask_stray_markers(src: &str) -> Cow<'_, str> {
    let bytes = src.as_bytes();
    let mut masked: Option<Vec<u8>> = None;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                i = bytes[i..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(bytes.len(), |n| i + n);
            }
            b'@' => match block_open(bytes, i) {
                Some(open) => i = block_close(bytes, open),
                None => {
                    masked.get_or_insert_with(|| bytes.to_vec())[i] = b' ';
                    i += 1;
                }
            },
            _ => i += 1,
        }
    }
    match masked.map(String::from_utf8) {
        Some(Ok(text)) => Cow::Owned(text),
        _ => Cow::Borrowed(src),
    }
}

/// Index of the opening delimiter if the `@` at `at` starts a block.
fn block_open(bytes: &[u8], at: usize) -> Option<usize> {
    let mut i = at + 1;
    match bytes.get(i).copied() {
        Some(b) if is_identifier_byte(b) && !matches!(b, b':' | b'<' | b'-' | b'>') => {}
        _ => return None,
    }
    while bytes.get(i).is_some_and(|&b| is_identifier_byte(b)) {
        i += 1;
    }
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    match bytes.get(i).copied() {
        Some(b'{' | b'(') => Some(i),
        _ => None,
    }
}

/// Index just past the block whose delimiter is at `open`.
fn block_close(bytes: &[u8], open: usize) -> usize {
    if bytes[open] != b'{' {
        return open + 1;
    }
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

fn is_identifier_byte(b: u8) -> bool {
    !b.is_ascii() || is_identifier_char(b as char)
}

fn line_of(src: &str, offset: usize) -> usize {
    src.as_bytes()[..offset.min(src.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

fn write_entry(out: &mut String, entry: &Entry) -> Result<(), CodecError> {
    BibtexCodec.validate(entry)?;

    out.push('@');
    out.push_str(&entry.entry_type);
    out.push('{');
    out.push_str(entry.citation_key().unwrap_or(""));
    out.push_str(",\n");
    for (name, value) in &entry.fields {
        out.push_str("  ");
        out.push_str(name);
        out.push_str(" = {");
        out.push_str(value);
        out.push_str("},\n");
    }
    out.push('}');
    Ok(())
}

fn is_identifier(s: &str) -> bool {
    match s.chars().next() {
        Some(first) if !matches!(first, ':' | '<' | '-' | '>') => {
            s.chars().all(is_identifier_char)
        }
        _ => false,
    }
}

fn is_identifier_char(c: char) -> bool {
    !c.is_whitespace()
        && !c.is_control()
        && !matches!(
            c,
            '@' | '{' | '}' | '"' | '#' | '\'' | '(' | ')' | ',' | '=' | '%' | '\\' | '~'
        )
}

/// Whether a value can sit inside `{...}` and be read back unchanged.
///
/// A backslash escapes the next character, so a trailing backslash would
/// swallow the closing brace.
fn braces_balanced(s: &str) -> bool {
    let mut depth = 0usize;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if chars.next().is_none() {
                    return false;
                }
            }
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"% exported library
@Comment{jabref-meta: databaseType:bibtex;}

@string{acm = "ACM Press"}

@article{smith2020,
  author = {Smith, J. and {Doe Corp}},
  title = "A {Nested} Title",
  year = 2020,
  journal = jan # { Issue},
  publisher = acm,
}
"#;

    fn decode_entries(text: &str) -> Vec<Entry> {
        BibtexCodec.decode(text.as_bytes()).unwrap().into_entries()
    }

    #[test]
    fn test_decode_sample() {
        let entries = decode_entries(SAMPLE);
        assert_eq!(entries.len(), 1);

        let article = &entries[0];
        assert_eq!(article.entry_type, "article");
        assert_eq!(article.citation_key(), Some("smith2020"));
        assert_eq!(article.field("author"), Some("Smith, J. and {Doe Corp}"));
        assert_eq!(article.field("title"), Some("A {Nested} Title"));
        assert_eq!(article.field("year"), Some("2020"));
        assert_eq!(article.field("journal"), Some("jan Issue"));
        assert_eq!(article.field("publisher"), Some("ACM Press"));
    }

    #[test]
    fn test_unchanged_document_is_byte_identical() {
        let doc = BibtexCodec.decode(SAMPLE.as_bytes()).unwrap();
        assert_eq!(BibtexCodec.encode(&doc).unwrap(), SAMPLE.as_bytes());
    }

    #[test]
    fn test_append_keeps_surrounding_text() {
        let mut doc = BibtexCodec.decode(SAMPLE.as_bytes()).unwrap();
        doc.push(Entry::new("misc").with_citation_key("k2"));
        let text = String::from_utf8(BibtexCodec.encode(&doc).unwrap()).unwrap();

        assert!(text.starts_with(SAMPLE));
        assert!(text.contains("@string{acm = \"ACM Press\"}"));
        assert!(text.contains("  publisher = acm,\n"));
        assert!(text.ends_with("}\n\n@misc{k2,\n}\n"));
    }

    #[test]
    fn test_replace_is_stable() {
        let mut doc = BibtexCodec.decode(SAMPLE.as_bytes()).unwrap();
        let index = doc.position("smith2020").unwrap();
        doc.replace(index, Entry::new("article").with_citation_key("smith2020"));
        let once = BibtexCodec.encode(&doc).unwrap();

        let mut again = BibtexCodec.decode(&once).unwrap();
        let index = again.position("smith2020").unwrap();
        again.replace(index, Entry::new("article").with_citation_key("smith2020"));
        assert_eq!(BibtexCodec.encode(&again).unwrap(), once);
    }

    #[test]
    fn test_at_sign_in_free_text() {
        let text = "maintained by jane@example.org\n\
                    % or mail jane@example.org\n\
                    @article{k1, title = {T},}";
        let entries = decode_entries(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field("title"), Some("T"));

        let doc = BibtexCodec.decode(text.as_bytes()).unwrap();
        let encoded = BibtexCodec.encode(&doc).unwrap();
        assert!(String::from_utf8(encoded).unwrap().starts_with("maintained by jane@example.org"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(BibtexCodec.decode(b"").unwrap().entry_count(), 0);
        assert!(BibtexCodec.encode(&LibraryDocument::new()).unwrap().is_empty());
    }

    #[test]
    fn test_round_trip() {
        let entries = vec![
            Entry::new("article")
                .with_citation_key("abc1")
                .with_field("title", "X {Y} Z")
                .with_field("year", "2021"),
            Entry::new("misc").with_field("note", "no key here"),
            Entry::new("inproceedings").with_citation_key("k:2"),
        ];
        let bytes = BibtexCodec
            .encode(&LibraryDocument::from_entries(entries.clone()))
            .unwrap();
        assert_eq!(BibtexCodec.decode(&bytes).unwrap().into_entries(), entries);
    }

    #[test]
    fn test_unterminated_entry_reports_line() {
        let err = BibtexCodec
            .decode(b"@article{a,\n  title = {open\n")
            .unwrap_err();
        match err {
            CodecError::Syntax { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_equals_is_syntax_error() {
        let result = BibtexCodec.decode(b"@article{a, title {X}}");
        assert!(matches!(result, Err(CodecError::Syntax { .. })));
    }

    #[test]
    fn test_validate_rejects_unwritable_entries() {
        let entry = Entry::new("article")
            .with_citation_key("a")
            .with_field("title", "oops }");
        assert!(matches!(
            BibtexCodec.validate(&entry),
            Err(CodecError::Unencodable(_))
        ));

        let entry = Entry::new("article").with_field("title", "ends in \\");
        assert!(BibtexCodec.validate(&entry).is_err());

        let entry = Entry::new("article").with_citation_key("a b");
        assert!(BibtexCodec.validate(&entry).is_err());

        let entry = Entry::new("string").with_citation_key("a");
        assert!(BibtexCodec.validate(&entry).is_err());

        let entry = Entry::new("article")
            .with_citation_key("a")
            .with_field("title", "\\{ fine");
        assert!(BibtexCodec.validate(&entry).is_ok());
    }

    #[test]
    fn test_encode_rejects_unwritable_entry() {
        let doc = LibraryDocument::from_entries(vec![Entry::new("article").with_citation_key("a b")]);
        assert!(matches!(
            BibtexCodec.encode(&doc),
            Err(CodecError::Unencodable(_))
        ));
    }
}
