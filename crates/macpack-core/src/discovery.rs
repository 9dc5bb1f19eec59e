//! Locating bundle archives on disk.

use crate::config::BundleConfig;
use crate::error::{MacpackError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Find `.mpb` files under `dir`, descending at most `max_depth` levels.
///
/// A depth of 1 only looks at `dir`'s direct children. Unreadable
/// subdirectories are skipped. Results are sorted by path.
pub fn find_bundles(dir: &Path, max_depth: usize) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(MacpackError::Io {
            message: format!("Not a directory: {}", dir.display()),
            path: Some(dir.to_path_buf()),
            source: None,
        });
    }

    let mut bundles: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_bundle(e.path()))
        .map(|e| e.into_path())
        .collect();
    bundles.sort();

    debug!("Found {} bundles under {}", bundles.len(), dir.display());
    Ok(bundles)
}

/// Whether `path` has the bundle extension (case-insensitive).
pub fn is_bundle(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(BundleConfig::EXTENSION))
        .unwrap_or(false)
}
