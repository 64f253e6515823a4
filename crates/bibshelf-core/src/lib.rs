//! bibshelf core - file-backed bibliography libraries.
//!
//! Each library is one `<name>.bib` file in a working directory. The crate
//! provides create/read/update/delete over libraries and their entries, with
//! a unique citation key per library, atomic whole-file persistence, and a
//! merged view across all libraries of a directory.
//!
//! # Example
//!
//! ```rust,ignore
//! use bibshelf_core::{Entry, ServiceRegistry};
//!
//! fn main() -> bibshelf_core::Result<()> {
//!     let registry = ServiceRegistry::default();
//!     let service = registry.get_or_open("./libraries")?;
//!
//!     service.create_library("smith2020")?;
//!     service.insert_entry(
//!         "smith2020",
//!         Entry::new("article")
//!             .with_citation_key("abc1")
//!             .with_field("title", "X"),
//!     )?;
//!
//!     let all = service.get_all_entries()?;
//!     println!("{} entries across all libraries", all.len());
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod library;
pub mod models;
pub mod registry;
pub mod storage;

// Re-export commonly used types
pub use catalog::merge_entries;
pub use codec::{BibtexCodec, CodecError, CodecKind, JsonCodec, LibraryCodec};
pub use config::{LibraryConfig, StoreOptions, UpdateStrategy};
pub use error::{Result, ShelfError};
pub use library::{LibraryService, LibraryServiceBuilder};
pub use models::{Block, Entry, LibraryDocument, LibrarySummary};
pub use registry::ServiceRegistry;
