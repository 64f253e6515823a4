//! Builder for configuring LibraryService initialization.

use crate::codec::{BibtexCodec, LibraryCodec};
use crate::config::{StoreOptions, UpdateStrategy};
use crate::error::{Result, ShelfError};
use crate::library::LibraryService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Builder for configuring a [`LibraryService`].
///
/// # Example
///
/// ```rust,ignore
/// use bibshelf_core::{JsonCodec, LibraryService, UpdateStrategy};
/// use std::sync::Arc;
///
/// let service = LibraryService::builder("./libraries")
///     .codec(Arc::new(JsonCodec))
///     .keep_backup(false)
///     .update_strategy(UpdateStrategy::ReplaceInPlace)
///     .build()?;
/// ```
pub struct LibraryServiceBuilder {
    working_dir: PathBuf,
    codec: Arc<dyn LibraryCodec>,
    options: StoreOptions,
}

impl LibraryServiceBuilder {
    /// Create a new builder for the given working directory.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            codec: Arc::new(BibtexCodec),
            options: StoreOptions::default(),
        }
    }

    /// Codec used to read and write library files.
    ///
    /// Default: [`BibtexCodec`]
    pub fn codec(mut self, codec: Arc<dyn LibraryCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Replace all store options at once.
    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Keep a `.bib.bak` copy of the previous file on every write.
    ///
    /// Default: `true`
    pub fn keep_backup(mut self, enable: bool) -> Self {
        self.options.keep_backup = enable;
        self
    }

    /// How `update_entry` replaces entries.
    ///
    /// Default: [`UpdateStrategy::ReplaceInPlace`]
    pub fn update_strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.options.update_strategy = strategy;
        self
    }

    /// Build the service, creating the working directory if needed.
    ///
    /// A working directory that cannot be created (or exists as a file) is
    /// a [`ShelfError::Config`] error; no service is returned for it.
    pub fn build(self) -> Result<LibraryService> {
        if !self.working_dir.exists() {
            std::fs::create_dir_all(&self.working_dir).map_err(|e| ShelfError::Config {
                message: format!(
                    "Could not create working directory {}: {}",
                    self.working_dir.display(),
                    e
                ),
            })?;
            info!("Created working directory {}", self.working_dir.display());
        } else if !self.working_dir.is_dir() {
            return Err(ShelfError::Config {
                message: format!(
                    "Working directory is not a directory: {}",
                    self.working_dir.display()
                ),
            });
        }

        Ok(LibraryService::from_parts(
            self.working_dir,
            self.codec,
            self.options,
        ))
    }
}
