//! Catalog - merged view over every library in a working directory.
//!
//! # Algorithm
//!
//! 1. **List**: enumerate libraries in filesystem listing order
//! 2. **Load**: decode each library independently; a library that fails to
//!    load counts as empty (logged, never propagated)
//! 3. **Fold**: merge each record set into a running accumulator
//!
//! # Merge rule
//!
//! A keyed entry whose key is already in the accumulator replaces the earlier
//! entry at the earlier entry's position (last applied wins). Any other entry
//! is appended. Entries without a key are always appended.
//!
//! Listing order is not stable across platforms, so which library "wins" a
//! key collision depends on the platform. Use [`merge_entries`] directly to
//! fold in a fixed order.

use crate::error::Result;
use crate::library::LibraryService;
use crate::models::{Entry, LibrarySummary};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Fold record sets together in the given order.
pub fn merge_entries<I>(record_sets: I) -> Vec<Entry>
where
    I: IntoIterator<Item = Vec<Entry>>,
{
    let mut merged: Vec<Entry> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record_set in record_sets {
        for entry in record_set {
            match entry.citation_key().map(str::to_string) {
                Some(key) => match positions.get(&key) {
                    Some(&i) => merged[i] = entry,
                    None => {
                        positions.insert(key, merged.len());
                        merged.push(entry);
                    }
                },
                None => merged.push(entry),
            }
        }
    }

    merged
}

impl LibraryService {
    /// Merge the entries of every library in the working directory.
    ///
    /// Only a failure to list the directory is an error. Libraries that fail
    /// to load contribute no entries.
    pub fn get_all_entries(&self) -> Result<Vec<Entry>> {
        let names = self.list_libraries()?;
        let record_sets = names.iter().map(|name| self.load_or_empty(name).0);
        let merged = merge_entries(record_sets);
        debug!(
            "Merged {} entries from {} libraries",
            merged.len(),
            names.len()
        );
        Ok(merged)
    }

    /// Per-library load status, in the order `get_all_entries` folds them.
    pub fn catalog_summary(&self) -> Result<Vec<LibrarySummary>> {
        let names = self.list_libraries()?;
        Ok(names
            .into_iter()
            .map(|name| {
                let (entries, error) = self.load_or_empty(&name);
                LibrarySummary {
                    entry_count: entries.len(),
                    name,
                    error,
                }
            })
            .collect())
    }

    fn load_or_empty(&self, name: &str) -> (Vec<Entry>, Option<String>) {
        let loaded = self
            .library_path(name)
            .and_then(|path| self.load_existing(name, &path))
            .map(|document| document.into_entries());
        match loaded {
            Ok(entries) => (entries, None),
            Err(e) => {
                warn!("Skipping library {} in catalog: {}", name, e);
                (Vec::new(), Some(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn keyed(key: &str, title: &str) -> Entry {
        Entry::new("article")
            .with_citation_key(key)
            .with_field("title", title)
    }

    #[test]
    fn test_merge_last_applied_wins_in_place() {
        let a = vec![keyed("k1", "from-a"), keyed("k2", "only-a")];
        let b = vec![keyed("k3", "only-b"), keyed("k1", "from-b")];

        let merged = merge_entries([a, b]);
        let titles: Vec<_> = merged.iter().map(|e| e.field("title").unwrap()).collect();
        assert_eq!(titles, vec!["from-b", "only-a", "only-b"]);
    }

    #[test]
    fn test_merge_order_decides_winner() {
        let a = vec![keyed("k1", "from-a")];
        let b = vec![keyed("k1", "from-b")];

        let ab = merge_entries([a.clone(), b.clone()]);
        let ba = merge_entries([b, a]);
        assert_eq!(ab.len(), 1);
        assert_eq!(ab[0].field("title"), Some("from-b"));
        assert_eq!(ba[0].field("title"), Some("from-a"));
    }

    #[test]
    fn test_merge_keeps_unkeyed_entries() {
        let unkeyed = Entry::new("misc").with_field("note", "n");
        let merged = merge_entries([vec![unkeyed.clone()], vec![unkeyed.clone()]]);
        assert_eq!(merged, vec![unkeyed.clone(), unkeyed]);
    }

    #[test]
    fn test_get_all_entries_absorbs_broken_library() {
        let temp_dir = TempDir::new().unwrap();
        let service = LibraryService::open(temp_dir.path()).unwrap();
        service.create_library("good").unwrap();
        service.insert_entry("good", keyed("k1", "ok")).unwrap();
        std::fs::write(temp_dir.path().join("bad.bib"), b"@article{x, title = {").unwrap();

        let merged = service.get_all_entries().unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].citation_key(), Some("k1"));

        let mut summary = service.catalog_summary().unwrap();
        summary.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].name, "bad.bib");
        assert!(summary[0].error.is_some());
        assert_eq!(summary[1].entry_count, 1);
        assert!(summary[1].error.is_none());
    }

    #[test]
    fn test_get_all_entries_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let service = LibraryService::open(temp_dir.path()).unwrap();
        assert!(service.get_all_entries().unwrap().is_empty());
    }
}
