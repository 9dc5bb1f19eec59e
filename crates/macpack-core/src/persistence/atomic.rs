//! Atomic file operations for safe JSON persistence.
//!
//! Implements atomic writes using:
//! 1. Write to a uniquely named temp file next to the target
//! 2. fsync to ensure data reaches disk
//! 3. Atomic rename to target path

use crate::{MacpackError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Read and parse a JSON file.
///
/// Returns `None` if the file doesn't exist, or an error if reading or parsing fails.
pub fn atomic_read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|e| MacpackError::Io {
        message: format!("Failed to read {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })?;

    let data: T = serde_json::from_str(&contents).map_err(|e| MacpackError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(e),
    })?;

    Ok(Some(data))
}

/// Write data to a JSON file atomically.
///
/// The previous contents of `path` stay intact until the final rename, so a
/// failure at any earlier step leaves the old file readable.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    if !parent.exists() {
        fs::create_dir_all(&parent).map_err(|e| MacpackError::Io {
            message: format!("Failed to create directory {}", parent.display()),
            path: Some(parent.clone()),
            source: Some(e),
        })?;
    }

    let serialized = serde_json::to_string_pretty(data).map_err(|e| MacpackError::Json {
        message: format!("Failed to serialize data: {}", e),
        source: Some(e),
    })?;

    // Same directory as the target so the rename never crosses filesystems.
    let mut temp = NamedTempFile::new_in(&parent).map_err(|e| MacpackError::Io {
        message: format!("Failed to create temp file in {}", parent.display()),
        path: Some(parent.clone()),
        source: Some(e),
    })?;

    temp.write_all(serialized.as_bytes())
        .and_then(|_| temp.flush())
        .map_err(|e| MacpackError::Io {
            message: format!("Failed to write temp file {}", temp.path().display()),
            path: Some(temp.path().to_path_buf()),
            source: Some(e),
        })?;

    temp.as_file().sync_all().map_err(|e| MacpackError::Io {
        message: format!("Failed to sync temp file {}", temp.path().display()),
        path: Some(temp.path().to_path_buf()),
        source: Some(e),
    })?;

    temp.persist(path).map_err(|e| MacpackError::Io {
        message: format!("Failed to rename temp file to {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e.error),
    })?;

    debug!("Atomically wrote {}", path.display());
    Ok(())
}
