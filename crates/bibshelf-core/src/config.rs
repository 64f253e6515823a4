//! Centralized configuration for bibshelf.
//!
//! File naming constants plus the per-store options applied by
//! [`LibraryServiceBuilder`](crate::LibraryServiceBuilder).

/// Library file naming.
pub struct LibraryConfig;

impl LibraryConfig {
    /// Required library file extension, without the dot.
    pub const EXTENSION: &'static str = "bib";
    /// Suffix appended to library names that lack the extension.
    pub const EXTENSION_SUFFIX: &'static str = ".bib";
    /// Extension used for the previous version kept by atomic persist.
    pub const BACKUP_EXTENSION: &'static str = "bib.bak";
    /// Trailing suffix of temporary files written during persist.
    pub const TEMP_SUFFIX: &'static str = "tmp";
    /// Entry type assigned when a record does not name one.
    pub const DEFAULT_ENTRY_TYPE: &'static str = "misc";
}

/// How `update_entry` replaces an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateStrategy {
    /// Single load, replace, persist cycle. Either the whole update lands or
    /// nothing changes.
    #[default]
    ReplaceInPlace,
    /// Delete the old entry and persist, then insert the new one and persist.
    ///
    /// Matches older stores. Not atomic: if the insert step fails (crash or
    /// key conflict) the old entry is already gone.
    DeleteThenInsert,
}

impl UpdateStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStrategy::ReplaceInPlace => "replace-in-place",
            UpdateStrategy::DeleteThenInsert => "delete-then-insert",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "replace-in-place" | "replace" => Some(UpdateStrategy::ReplaceInPlace),
            "delete-then-insert" | "delete-insert" => Some(UpdateStrategy::DeleteThenInsert),
            _ => None,
        }
    }
}

impl std::fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options shared by every store a registry opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Keep `<name>.bib.bak` with the previous file contents on each persist.
    pub keep_backup: bool,
    pub update_strategy: UpdateStrategy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            keep_backup: true,
            update_strategy: UpdateStrategy::default(),
        }
    }
}
