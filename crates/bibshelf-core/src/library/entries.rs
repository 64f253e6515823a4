//! Entry operations on LibraryService.
//!
//! Every mutation is a full load, modify, persist cycle under the write lock.
//! Text outside entries and unmodified entries survive the cycle as the codec
//! decoded them.

use crate::config::UpdateStrategy;
use crate::error::{Result, ShelfError};
use crate::library::LibraryService;
use crate::models::Entry;
use crate::storage::library_file_name;
use std::path::Path;
use tracing::debug;

impl LibraryService {
    // ========================================
    // Reads
    // ========================================

    /// Load all entries of a library, in file order.
    pub fn get_entries(&self, library: &str) -> Result<Vec<Entry>> {
        let path = self.library_path(library)?;
        Ok(self.load_existing(library, &path)?.into_entries())
    }

    /// Find the entry with the given citation key.
    ///
    /// If the file was edited externally and holds several entries with the
    /// same key, the first one in file order is returned. `update_entry` and
    /// `delete_entry` act on that same first entry and leave later copies
    /// alone.
    pub fn get_entry(&self, library: &str, citation_key: &str) -> Result<Option<Entry>> {
        let entries = self.get_entries(library)?;
        Ok(entries
            .into_iter()
            .find(|entry| entry.has_citation_key(citation_key)))
    }

    // ========================================
    // Mutations
    // ========================================

    /// Append an entry to a library.
    ///
    /// # Errors
    ///
    /// - [`ShelfError::Validation`] if the entry has no citation key or the
    ///   codec cannot write it (checked before any file access)
    /// - [`ShelfError::LibraryNotFound`] if the library file does not exist
    /// - [`ShelfError::Conflict`] if the key is already used in the library
    pub fn insert_entry(&self, library: &str, entry: Entry) -> Result<()> {
        self.validate_entry(&entry)?;
        let path = self.library_path(library)?;
        let _lock = self.lock_writes();
        self.insert_locked(library, &path, entry)
    }

    /// Replace the entry stored under `citation_key` with `entry`.
    ///
    /// The new entry may carry a different key. If no entry has
    /// `citation_key`, the new entry is added. Behavior on failure depends on
    /// [`UpdateStrategy`]:
    /// - `ReplaceInPlace`: nothing changes unless the whole update succeeds.
    /// - `DeleteThenInsert`: the old entry is removed and persisted first; if
    ///   the insert then fails (for example with a key conflict) the old
    ///   entry stays removed.
    pub fn update_entry(&self, library: &str, citation_key: &str, entry: Entry) -> Result<()> {
        self.validate_entry(&entry)?;
        let path = self.library_path(library)?;
        let _lock = self.lock_writes();

        match self.options().update_strategy {
            UpdateStrategy::ReplaceInPlace => {
                self.replace_locked(library, &path, citation_key, entry)
            }
            UpdateStrategy::DeleteThenInsert => {
                self.delete_locked(&path, citation_key)?;
                self.insert_locked(library, &path, entry)
            }
        }
    }

    /// Remove the entry with the given citation key.
    ///
    /// Returns `false` when the library does not exist or holds no such
    /// entry; the file is not rewritten in that case.
    pub fn delete_entry(&self, library: &str, citation_key: &str) -> Result<bool> {
        let path = self.library_path(library)?;
        let _lock = self.lock_writes();
        self.delete_locked(&path, citation_key)
    }

    // ========================================
    // Locked helpers (caller holds the write lock)
    // ========================================

    fn insert_locked(&self, library: &str, path: &Path, entry: Entry) -> Result<()> {
        let key = entry
            .citation_key()
            .ok_or_else(ShelfError::missing_citation_key)?
            .to_string();
        let mut document = self.load_existing(library, path)?;
        if document.contains_key(&key) {
            return Err(ShelfError::Conflict {
                library: library_file_name(library),
                citation_key: key,
            });
        }
        document.push(entry);
        self.persist(path, &document)?;
        debug!("Inserted {} into {}", key, path.display());
        Ok(())
    }

    fn replace_locked(
        &self,
        library: &str,
        path: &Path,
        citation_key: &str,
        entry: Entry,
    ) -> Result<()> {
        let new_key = entry
            .citation_key()
            .ok_or_else(ShelfError::missing_citation_key)?
            .to_string();
        let mut document = self.load_existing(library, path)?;

        // Entries still carrying the old key never block the new one.
        if new_key != citation_key && document.contains_key(&new_key) {
            return Err(ShelfError::Conflict {
                library: library_file_name(library),
                citation_key: new_key,
            });
        }

        match document.position(citation_key) {
            Some(index) => document.replace(index, entry),
            None => document.push(entry),
        }
        self.persist(path, &document)?;
        debug!("Updated {} -> {} in {}", citation_key, new_key, path.display());
        Ok(())
    }

    fn delete_locked(&self, path: &Path, citation_key: &str) -> Result<bool> {
        let Some(mut document) = self.load(path)? else {
            return Ok(false);
        };
        let Some(index) = document.position(citation_key) else {
            return Ok(false);
        };
        document.remove(index);
        self.persist(path, &document)?;
        debug!("Deleted {} from {}", citation_key, path.display());
        Ok(true)
    }
}
