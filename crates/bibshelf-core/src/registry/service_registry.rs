//! Registry mapping working directories to their LibraryService.

use crate::codec::{BibtexCodec, LibraryCodec};
use crate::config::StoreOptions;
use crate::error::{Result, ShelfError};
use crate::library::LibraryService;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// One `LibraryService` per canonical working directory.
///
/// Owned by the application context and passed to callers. Services are
/// opened lazily with the registry's codec and options; opening happens
/// under the registry lock, so two services for the same directory can
/// never coexist, and every caller mutating a directory shares its write
/// lock.
pub struct ServiceRegistry {
    services: Mutex<HashMap<PathBuf, Arc<LibraryService>>>,
    codec: Arc<dyn LibraryCodec>,
    options: StoreOptions,
}

impl ServiceRegistry {
    /// Create a registry that opens services with the given codec and options.
    pub fn new(codec: Arc<dyn LibraryCodec>, options: StoreOptions) -> Self {
        Self {
            services: Mutex::new(HashMap::new()),
            codec,
            options,
        }
    }

    /// Get the service for a directory, opening it on first use.
    ///
    /// The directory is created if missing, then canonicalized, so
    /// `libs`, `./libs` and `/abs/path/libs` share one service.
    pub fn get_or_open(&self, working_dir: impl AsRef<Path>) -> Result<Arc<LibraryService>> {
        let mut services = self.lock_services();
        let key = canonical_working_dir(working_dir.as_ref())?;

        if let Some(service) = services.get(&key) {
            return Ok(Arc::clone(service));
        }

        let service = Arc::new(
            LibraryService::builder(&key)
                .codec(Arc::clone(&self.codec))
                .options(self.options)
                .build()?,
        );
        debug!("Opened library service for {}", key.display());
        services.insert(key, Arc::clone(&service));
        Ok(service)
    }

    /// Get an already opened service without opening a new one.
    pub fn get(&self, working_dir: impl AsRef<Path>) -> Option<Arc<LibraryService>> {
        let key = working_dir.as_ref().canonicalize().ok()?;
        self.lock_services().get(&key).cloned()
    }

    /// Canonical paths of all opened working directories.
    pub fn working_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.lock_services().keys().cloned().collect();
        dirs.sort();
        dirs
    }

    pub fn len(&self) -> usize {
        self.lock_services().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_services(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<LibraryService>>> {
        self.services
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new(Arc::new(BibtexCodec), StoreOptions::default())
    }
}

fn canonical_working_dir(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| ShelfError::Config {
            message: format!(
                "Could not create working directory {}: {}",
                path.display(),
                e
            ),
        })?;
    }
    path.canonicalize().map_err(|e| ShelfError::Config {
        message: format!(
            "Failed to canonicalize working directory {}: {}",
            path.display(),
            e
        ),
    })
}
