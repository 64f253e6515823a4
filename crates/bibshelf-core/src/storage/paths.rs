//! Library name to file path resolution.
//!
//! Libraries live flat inside the working directory as `<name>.bib`.

use crate::config::LibraryConfig;
use crate::{Result, ShelfError};
use std::path::{Path, PathBuf};

/// Append the `.bib` extension unless the name already ends with it.
///
/// The match is case-sensitive: `refs.BIB` becomes `refs.BIB.bib`.
pub fn library_file_name(name: &str) -> String {
    if name.ends_with(LibraryConfig::EXTENSION_SUFFIX) {
        name.to_string()
    } else {
        format!("{}{}", name, LibraryConfig::EXTENSION_SUFFIX)
    }
}

/// Whether a directory entry name counts as a library file.
pub fn is_library_file_name(file_name: &str) -> bool {
    file_name.ends_with(LibraryConfig::EXTENSION_SUFFIX)
}

/// Resolve a library name to its file path inside `working_dir`.
///
/// No I/O is performed. Empty names and names containing a path separator
/// are rejected so a library can never resolve outside the working directory.
pub fn resolve_library_path(name: &str, working_dir: &Path) -> Result<PathBuf> {
    if name.is_empty() {
        return Err(ShelfError::Validation {
            field: "library".to_string(),
            message: "Library name must not be empty".to_string(),
        });
    }
    if name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
        return Err(ShelfError::Validation {
            field: "library".to_string(),
            message: format!("Library name must not contain path separators: {}", name),
        });
    }
    if name == ".." || name == "." {
        return Err(ShelfError::Validation {
            field: "library".to_string(),
            message: format!("Invalid library name: {}", name),
        });
    }
    Ok(working_dir.join(library_file_name(name)))
}
