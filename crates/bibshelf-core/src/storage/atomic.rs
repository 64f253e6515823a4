//! Atomic file operations for library persistence.
//!
//! Implements atomic writes using:
//! 1. Write to temp file with unique PID+TID suffix in the target directory
//! 2. fsync to ensure data reaches disk
//! 3. Optional backup of the previous version
//! 4. Atomic rename to target path
//!
//! Readers therefore see either the old complete file or the new one.

use crate::config::LibraryConfig;
use crate::{Result, ShelfError};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use tracing::{debug, warn};

/// Read a whole file.
///
/// Returns `None` if the file doesn't exist.
pub fn read_file(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ShelfError::Io {
            message: format!("Failed to read {}", path.display()),
            path: Some(path.to_path_buf()),
            source: Some(e),
        }),
    }
}

/// Replace `path` with `contents` atomically.
///
/// The temp file lives next to the target so the final rename never crosses
/// filesystems. On failure the temp file is removed and the target is left
/// untouched.
pub fn atomic_write(path: &Path, contents: &[u8], keep_backup: bool) -> Result<()> {
    let temp_path = temp_path_for(path);

    if let Err(e) = write_temp(&temp_path, contents) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if keep_backup && path.exists() {
        let backup = backup_path(path);
        if let Err(e) = fs::copy(path, &backup) {
            warn!("Failed to create backup {}: {}", backup.display(), e);
            // Continue anyway - backup failure is not fatal
        } else {
            debug!("Created backup: {}", backup.display());
        }
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(ShelfError::Io {
            message: format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            ),
            path: Some(path.to_path_buf()),
            source: Some(e),
        });
    }

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

/// Path of the backup kept for `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    path.with_extension(LibraryConfig::BACKUP_EXTENSION)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(
        "{}.{}.{}.{}",
        file_name,
        process::id(),
        thread_id(),
        LibraryConfig::TEMP_SUFFIX
    ))
}

fn write_temp(temp_path: &Path, contents: &[u8]) -> Result<()> {
    let io_err = |action: &str, e: std::io::Error| ShelfError::Io {
        message: format!("Failed to {} temp file {}", action, temp_path.display()),
        path: Some(temp_path.to_path_buf()),
        source: Some(e),
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| io_err("create", e))?;
    file.write_all(contents).map_err(|e| io_err("write", e))?;
    file.flush().map_err(|e| io_err("flush", e))?;
    file.sync_all().map_err(|e| io_err("sync", e))?;
    Ok(())
}

/// Get a unique thread identifier.
fn thread_id() -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    format!("{:?}", thread::current().id()).hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("refs.bib");

        atomic_write(&path, b"@misc{a,\n}\n", false).unwrap();
        assert_eq!(read_file(&path).unwrap().unwrap(), b"@misc{a,\n}\n");
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_atomic_write_creates_backup() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("refs.bib");

        atomic_write(&path, b"first", true).unwrap();
        // Nothing to back up on the first write
        assert!(!backup_path(&path).exists());

        atomic_write(&path, b"second", true).unwrap();
        let backup = backup_path(&path);
        assert!(backup.ends_with("refs.bib.bak"));
        assert_eq!(fs::read(&backup).unwrap(), b"first");
        assert_eq!(fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn test_read_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.bib");
        assert!(read_file(&path).unwrap().is_none());
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("refs.bib");

        atomic_write(&path, b"one", true).unwrap();
        atomic_write(&path, b"two", true).unwrap();

        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{:?}", names);
    }

    #[test]
    fn test_failed_write_leaves_target_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing-dir").join("refs.bib");

        let result = atomic_write(&path, b"data", false);
        assert!(matches!(result, Err(ShelfError::Io { .. })));
        assert!(!path.exists());
    }
}
