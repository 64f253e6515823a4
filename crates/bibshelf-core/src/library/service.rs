//! Core LibraryService implementation.
//!
//! A `LibraryService` owns one working directory. Every library inside it is
//! a flat `<name>.bib` file. Nothing is cached: each call reads the file from
//! disk, and each mutation writes the whole file back atomically.

use crate::codec::LibraryCodec;
use crate::config::StoreOptions;
use crate::error::{Result, ShelfError};
use crate::library::LibraryServiceBuilder;
use crate::models::{Entry, LibraryDocument};
use crate::storage::{self, is_library_file_name, library_file_name, resolve_library_path};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// File-backed store for the libraries of one working directory.
///
/// Thread-safe. Mutations (`insert_entry`, `update_entry`, `delete_entry`,
/// library creation and deletion) are serialized through one write lock per
/// instance. Reads take no lock; they see the file before or after a
/// concurrent write, never a partial one.
///
/// Use [`ServiceRegistry`](crate::ServiceRegistry) to make sure a directory
/// is served by a single instance.
pub struct LibraryService {
    /// Directory holding the library files
    working_dir: PathBuf,
    /// Codec used for every library file
    codec: Arc<dyn LibraryCodec>,
    options: StoreOptions,
    /// Write lock for load-modify-persist sequences
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for LibraryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryService")
            .field("working_dir", &self.working_dir)
            .field("codec", &self.codec.name())
            .field("options", &self.options)
            .finish()
    }
}

impl LibraryService {
    /// Open a store with the default codec and options.
    ///
    /// Creates the working directory if it does not exist.
    pub fn open(working_dir: impl Into<PathBuf>) -> Result<Self> {
        LibraryServiceBuilder::new(working_dir).build()
    }

    /// Create a builder for more control over codec and options.
    pub fn builder(working_dir: impl Into<PathBuf>) -> LibraryServiceBuilder {
        LibraryServiceBuilder::new(working_dir)
    }

    pub(crate) fn from_parts(
        working_dir: PathBuf,
        codec: Arc<dyn LibraryCodec>,
        options: StoreOptions,
    ) -> Self {
        Self {
            working_dir,
            codec,
            options,
            write_lock: Mutex::new(()),
        }
    }

    /// Get the working directory.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Resolve a library name to its file path.
    pub fn library_path(&self, library: &str) -> Result<PathBuf> {
        let path = resolve_library_path(library, &self.working_dir)?;
        debug!("Resolved path: {}", path.display());
        Ok(path)
    }

    // ========================================
    // Library lifecycle
    // ========================================

    /// List the file names of all libraries in the working directory.
    ///
    /// Order is whatever the filesystem listing returns.
    pub fn list_libraries(&self) -> Result<Vec<String>> {
        let dir_entries = fs::read_dir(&self.working_dir).map_err(|e| ShelfError::Io {
            message: format!("Failed to list {}", self.working_dir.display()),
            path: Some(self.working_dir.clone()),
            source: Some(e),
        })?;

        let mut names = Vec::new();
        for dir_entry in dir_entries {
            let dir_entry =
                dir_entry.map_err(|e| ShelfError::io_with_path(e, &self.working_dir))?;
            let path = dir_entry.path();
            if path.is_dir() {
                continue;
            }
            match dir_entry.file_name().to_str() {
                Some(name) if is_library_file_name(name) => names.push(name.to_string()),
                Some(_) => {}
                None => debug!("Skipping non UTF-8 file name: {}", path.display()),
            }
        }
        Ok(names)
    }

    /// Create a new, empty library file.
    ///
    /// Fails with [`ShelfError::AlreadyExists`] if the file is already there.
    pub fn create_library(&self, library: &str) -> Result<()> {
        let path = self.library_path(library)?;
        let _lock = self.lock_writes();

        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => ShelfError::AlreadyExists(path.clone()),
                _ => ShelfError::io_with_path(e, &path),
            })?;

        info!("Created library {}", path.display());
        Ok(())
    }

    /// Delete a library file.
    ///
    /// Returns `false` if there was nothing to delete.
    pub fn delete_library(&self, library: &str) -> Result<bool> {
        let path = self.library_path(library)?;
        let _lock = self.lock_writes();

        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted library {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ShelfError::io_with_path(e, &path)),
        }
    }

    /// Check whether a library file exists.
    ///
    /// Names that cannot resolve to a library path report `false`.
    pub fn library_exists(&self, library: &str) -> bool {
        self.library_path(library)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    // ========================================
    // Load / persist
    // ========================================

    /// Load and decode a library file. `None` if the file is absent.
    pub(crate) fn load(&self, path: &Path) -> Result<Option<LibraryDocument>> {
        let Some(bytes) = storage::read_file(path)? else {
            return Ok(None);
        };
        let document = self.codec.decode(&bytes).map_err(|e| ShelfError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
            source: Some(e),
        })?;
        debug!(
            "Loaded {} entries from {} ({})",
            document.entry_count(),
            path.display(),
            self.codec.name()
        );
        Ok(Some(document))
    }

    /// Load a library that must exist.
    pub(crate) fn load_existing(&self, library: &str, path: &Path) -> Result<LibraryDocument> {
        self.load(path)?.ok_or_else(|| ShelfError::LibraryNotFound {
            library: library_file_name(library),
        })
    }

    /// Encode and atomically replace a library file.
    ///
    /// Encoding happens before anything touches the disk, so an encode
    /// failure leaves the file as it was.
    pub(crate) fn persist(&self, path: &Path, document: &LibraryDocument) -> Result<()> {
        let bytes = self.codec.encode(document).map_err(|e| ShelfError::Encode {
            message: e.to_string(),
            source: Some(e),
        })?;
        storage::atomic_write(path, &bytes, self.options.keep_backup)?;
        debug!(
            "Persisted {} entries to {}",
            document.entry_count(),
            path.display()
        );
        Ok(())
    }

    /// Reject an entry that cannot be stored, before any file access.
    ///
    /// The entry needs a citation key and must be writable by the codec.
    pub(crate) fn validate_entry(&self, entry: &Entry) -> Result<()> {
        if entry.citation_key().is_none() {
            return Err(ShelfError::missing_citation_key());
        }
        self.codec
            .validate(entry)
            .map_err(|e| ShelfError::Validation {
                field: "entry".to_string(),
                message: e.to_string(),
            })
    }

    /// Acquire the write lock.
    ///
    /// The lock guards no in-memory state, so a poisoned lock is still usable.
    pub(crate) fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
