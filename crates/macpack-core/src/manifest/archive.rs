//! Zip extraction for bundle archives.

use crate::error::{MacpackError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, warn};

/// Unpack every entry of the zip archive at `archive_path` into `dest_dir`.
///
/// Entries whose names would land outside `dest_dir` are skipped. Returns the
/// number of files written. Any failure is reported as
/// [`MacpackError::ArchiveExtraction`].
pub fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<usize> {
    let extraction_error = |message: String, source: Option<zip::result::ZipError>| {
        MacpackError::ArchiveExtraction {
            path: archive_path.to_path_buf(),
            message,
            source,
        }
    };

    let file = File::open(archive_path)
        .map_err(|e| extraction_error(format!("Failed to open archive: {}", e), None))?;

    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| extraction_error("Invalid zip archive".to_string(), Some(e)))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| extraction_error(format!("Failed to read zip entry {}", i), Some(e)))?;

        let outpath = match entry.enclosed_name() {
            Some(path) => dest_dir.join(path),
            None => {
                warn!("Skipping unsafe archive entry: {}", entry.name());
                continue;
            }
        };

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath).map_err(|e| {
                extraction_error(
                    format!("Failed to create directory {}: {}", outpath.display(), e),
                    None,
                )
            })?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                extraction_error(
                    format!("Failed to create directory {}: {}", parent.display(), e),
                    None,
                )
            })?;
        }

        let mut outfile = File::create(&outpath).map_err(|e| {
            extraction_error(
                format!("Failed to create file {}: {}", outpath.display(), e),
                None,
            )
        })?;

        std::io::copy(&mut entry, &mut outfile).map_err(|e| {
            extraction_error(
                format!("Failed to extract {}: {}", entry.name(), e),
                None,
            )
        })?;

        // Set permissions on Unix so extracted payloads stay executable
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode)).ok();
            }
        }

        written += 1;
    }

    debug!(
        "Extracted {} files from {} into {}",
        written,
        archive_path.display(),
        dest_dir.display()
    );
    Ok(written)
}
