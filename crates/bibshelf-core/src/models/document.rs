//! Decoded contents of one library file.

use super::Entry;

/// One piece of a library file, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Source text that is not an entry: string macros, preambles, comments
    /// and anything between entries. Written back unchanged.
    Verbatim(String),
    /// A decoded entry. `source` holds the entry's original text and is
    /// dropped as soon as the entry is replaced.
    Entry { entry: Entry, source: Option<String> },
}

/// A library file as a sequence of blocks.
///
/// The store reads and edits entries only. A codec that understands more of
/// its format keeps the rest as [`Block::Verbatim`] so that a mutation does
/// not lose it, and may keep each entry's source so unmodified entries are
/// written back byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryDocument {
    blocks: Vec<Block>,
}

impl LibraryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document holding only the given entries, without source text.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            blocks: entries
                .into_iter()
                .map(|entry| Block::Entry {
                    entry,
                    source: None,
                })
                .collect(),
        }
    }

    /// Append verbatim text. Empty text is ignored.
    pub fn push_verbatim(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.blocks.push(Block::Verbatim(text));
        }
    }

    /// Append an entry decoded from `source`.
    pub fn push_decoded(&mut self, entry: Entry, source: impl Into<String>) {
        self.blocks.push(Block::Entry {
            entry,
            source: Some(source.into()),
        });
    }

    /// Append a new entry.
    pub fn push(&mut self, entry: Entry) {
        self.blocks.push(Block::Entry {
            entry,
            source: None,
        });
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Entries in file order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Entry { entry, .. } => Some(entry),
            Block::Verbatim(_) => None,
        })
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.blocks
            .into_iter()
            .filter_map(|block| match block {
                Block::Entry { entry, .. } => Some(entry),
                Block::Verbatim(_) => None,
            })
            .collect()
    }

    pub fn entry_count(&self) -> usize {
        self.entries().count()
    }

    /// Block index of the first entry carrying `citation_key`.
    pub fn position(&self, citation_key: &str) -> Option<usize> {
        self.blocks.iter().position(|block| {
            matches!(block, Block::Entry { entry, .. } if entry.has_citation_key(citation_key))
        })
    }

    pub fn contains_key(&self, citation_key: &str) -> bool {
        self.position(citation_key).is_some()
    }

    /// Replace the entry at block `index`. Its source text is discarded.
    pub fn replace(&mut self, index: usize, entry: Entry) {
        if let Some(block @ Block::Entry { .. }) = self.blocks.get_mut(index) {
            *block = Block::Entry {
                entry,
                source: None,
            };
        }
    }

    /// Remove the entry at block `index`.
    ///
    /// Blank text directly after it goes too, so repeated deletes do not
    /// pile up empty lines.
    pub fn remove(&mut self, index: usize) -> Option<Entry> {
        if !matches!(self.blocks.get(index), Some(Block::Entry { .. })) {
            return None;
        }
        let removed = self.blocks.remove(index);
        if matches!(self.blocks.get(index), Some(Block::Verbatim(text)) if text.trim().is_empty())
        {
            self.blocks.remove(index);
        }
        match removed {
            Block::Entry { entry, .. } => Some(entry),
            Block::Verbatim(_) => None,
        }
    }
}
