//! Platform-specific path utilities.

use crate::error::{MacpackError, Result};
use std::path::{Component, Path, PathBuf};

/// Get the user's home directory.
///
/// # Platform Behavior
/// Uses the `dirs` crate which handles platform differences:
/// - **Linux/macOS**: `$HOME`
/// - **Windows**: `C:\Users\{user}`
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| MacpackError::Config {
        message: "Could not determine home directory".to_string(),
    })
}

/// Get the on-disk file name for an executable.
///
/// # Platform Behavior
/// - **Linux/macOS**: `{name}`
/// - **Windows**: `{name}.exe`
pub fn executable_name(name: &str) -> String {
    #[cfg(windows)]
    {
        format!("{}.exe", name)
    }
    #[cfg(not(windows))]
    {
        name.to_string()
    }
}

/// Resolve `path` to an absolute, normalized path.
///
/// Relative paths are joined to the current directory, then `.` and `..`
/// are removed lexically. Symlinks are left in place: the bundle keeps the
/// file name the user opened, which is what the nested manifest lookup and
/// the registry key off.
pub fn normalize_path(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| MacpackError::io_with_path(e, path))?
            .join(path)
    };

    Ok(clean_lexically(&absolute))
}

fn clean_lexically(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the root is a no-op, matching how the OS resolves `/..`.
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_existing_path_drops_dot_components() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("foo.mpb");
        std::fs::write(&file, b"x").unwrap();

        let dotted = temp_dir.path().join(".").join("foo.mpb");
        let normalized = normalize_path(&dotted).unwrap();

        assert!(normalized.is_absolute());
        assert_eq!(normalized, file);
    }

    #[cfg(unix)]
    #[test]
    fn test_normalize_keeps_symlink_name() {
        let temp_dir = TempDir::new().unwrap();
        let store = temp_dir.path().join("store");
        std::fs::create_dir_all(&store).unwrap();
        std::fs::write(store.join("abc123.mpb"), b"x").unwrap();
        let link = temp_dir.path().join("foo.mpb");
        std::os::unix::fs::symlink(store.join("abc123.mpb"), &link).unwrap();

        let normalized = normalize_path(&link).unwrap();

        assert_eq!(normalized, link);
        assert_eq!(normalized.file_stem().unwrap(), "foo");
    }

    #[cfg(unix)]
    #[test]
    fn test_normalize_missing_path_is_cleaned() {
        let normalized =
            normalize_path(Path::new("/definitely/not/../here/./bundle.mpb")).unwrap();
        assert_eq!(normalized, PathBuf::from("/definitely/here/bundle.mpb"));
    }

    #[test]
    fn test_normalize_relative_path_becomes_absolute() {
        let normalized = normalize_path(Path::new("missing-dir/bundle.mpb")).unwrap();
        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("missing-dir/bundle.mpb"));
    }

    #[test]
    fn test_executable_name() {
        let name = executable_name("macpack");
        assert!(name.starts_with("macpack"));
    }
}
