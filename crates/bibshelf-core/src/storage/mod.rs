//! Library file persistence.
//!
//! - Atomic whole-file replacement with optional backup
//! - Library name to path resolution

mod atomic;
mod paths;

pub use atomic::{atomic_write, backup_path, read_file};
pub use paths::{is_library_file_name, library_file_name, resolve_library_path};
