//! Bibliography entry types.

use crate::config::LibraryConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A bibliographic record.
///
/// The citation key addresses the entry inside its library. An empty key is
/// treated the same as a missing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default = "default_entry_type")]
    pub entry_type: String,
    #[serde(default)]
    pub citation_key: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

fn default_entry_type() -> String {
    LibraryConfig::DEFAULT_ENTRY_TYPE.to_string()
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            entry_type: default_entry_type(),
            citation_key: None,
            fields: BTreeMap::new(),
        }
    }
}

impl Entry {
    /// Create an entry of the given type with no key and no fields.
    pub fn new(entry_type: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into(),
            ..Default::default()
        }
    }

    pub fn with_citation_key(mut self, key: impl Into<String>) -> Self {
        self.citation_key = Some(key.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// The citation key, if present and non-empty.
    pub fn citation_key(&self) -> Option<&str> {
        self.citation_key.as_deref().filter(|key| !key.is_empty())
    }

    pub fn has_citation_key(&self, key: &str) -> bool {
        self.citation_key() == Some(key)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Load status of one library as seen by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySummary {
    pub name: String,
    pub entry_count: usize,
    /// Set when the library failed to load and was counted as empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
