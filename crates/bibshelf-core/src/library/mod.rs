//! Library Store - file-backed CRUD over the libraries of one directory.
//!
//! ```text
//! LibraryService
//!     │
//!     ├── service.rs - struct, library lifecycle, load/persist
//!     ├── entries.rs - entry reads and mutations
//!     └── builder.rs - codec and option configuration
//! ```

mod builder;
mod entries;
mod service;

pub use builder::LibraryServiceBuilder;
pub use service::LibraryService;
