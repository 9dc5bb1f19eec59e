//! Manifest extraction from bundle archives.

use crate::config::BundleConfig;
use crate::error::{MacpackError, Result};
use crate::manifest::archive::extract_archive;
use crate::manifest::types::BundleManifest;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Extracts and decodes the manifest embedded in a bundle.
///
/// Every call unpacks into its own scratch directory, so repeated or
/// concurrent extractions never see each other's files. The scratch
/// directory is removed before `extract` returns, on success and on failure.
#[derive(Debug, Clone, Default)]
pub struct ManifestStore {
    scratch_root: Option<PathBuf>,
}

impl ManifestStore {
    /// Create a store that unpacks into the system temp directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that unpacks under `scratch_root`.
    pub fn with_scratch_root(scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: Some(scratch_root.into()),
        }
    }

    /// Extract the manifest from the bundle at `bundle_path`.
    pub fn extract(&self, bundle_path: &Path) -> Result<BundleManifest> {
        let scratch = self.scratch_dir()?;
        let result = Self::extract_into(bundle_path, scratch.path());

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!(
                "Failed to remove scratch directory {}: {}",
                scratch_path.display(),
                e
            );
        }

        result
    }

    /// Archive-relative locations checked for the manifest, in order.
    pub fn manifest_candidates(bundle_path: &Path) -> Vec<String> {
        let mut candidates = vec![BundleConfig::MANIFEST_FILE_NAME.to_string()];
        if let Some(stem) = bundle_path.file_stem().and_then(|s| s.to_str()) {
            candidates.push(format!("{}/{}", stem, BundleConfig::MANIFEST_FILE_NAME));
        }
        candidates
    }

    fn extract_into(bundle_path: &Path, scratch: &Path) -> Result<BundleManifest> {
        extract_archive(bundle_path, scratch)?;

        let candidates = Self::manifest_candidates(bundle_path);
        let entry = candidates
            .iter()
            .find(|candidate| scratch.join(candidate.as_str()).is_file())
            .ok_or_else(|| MacpackError::ManifestNotFound {
                bundle: bundle_path.to_path_buf(),
                searched: candidates.clone(),
            })?;

        debug!("Found manifest {} in {}", entry, bundle_path.display());

        // Invalid UTF-8 is a malformed manifest, not an IO problem.
        let bytes = std::fs::read(scratch.join(entry.as_str()))
            .map_err(|e| MacpackError::io_with_path(e, scratch.join(entry.as_str())))?;
        let contents = String::from_utf8(bytes).map_err(|_| MacpackError::ManifestParse {
            bundle: bundle_path.to_path_buf(),
            entry: entry.clone(),
            message: "manifest is not valid UTF-8".to_string(),
        })?;

        let manifest = BundleManifest::parse(&contents, bundle_path, entry)?;
        info!(
            "Read manifest for {} {} from {}",
            manifest.name,
            manifest.version,
            bundle_path.display()
        );
        Ok(manifest)
    }

    fn scratch_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(BundleConfig::SCRATCH_PREFIX);

        let scratch = match &self.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root).map_err(|e| MacpackError::io_with_path(e, root))?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        };

        scratch.map_err(|e| MacpackError::Io {
            message: format!("Failed to create scratch directory: {}", e),
            path: self.scratch_root.clone(),
            source: Some(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const FOO_MANIFEST: &str = r#"
[package]
name = "Foo"
version = "1.0.0"
author = "Ada"
exec = "bin/foo"
"#;

    fn write_bundle(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, contents) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    fn scratch_is_empty(root: &Path) -> bool {
        std::fs::read_dir(root).unwrap().next().is_none()
    }

    #[test]
    fn test_extract_manifest_at_root() {
        let temp_dir = TempDir::new().unwrap();
        let scratch = temp_dir.path().join("scratch");
        let bundle = temp_dir.path().join("foo.mpb");
        write_bundle(&bundle, &[("macpack.toml", FOO_MANIFEST), ("bin/foo", "x")]);

        let store = ManifestStore::with_scratch_root(&scratch);
        let manifest = store.extract(&bundle).unwrap();

        assert_eq!(manifest.name, "Foo");
        assert_eq!(manifest.description, BundleConfig::DEFAULT_DESCRIPTION);
        assert!(scratch_is_empty(&scratch));
    }

    #[test]
    fn test_extract_manifest_under_bundle_folder() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = temp_dir.path().join("foo.mpb");
        write_bundle(&bundle, &[("foo/macpack.toml", FOO_MANIFEST)]);

        let manifest = ManifestStore::new().extract(&bundle).unwrap();
        assert_eq!(manifest.name, "Foo");
        assert_eq!(manifest.exec, "bin/foo");
    }

    #[test]
    fn test_root_manifest_wins_over_nested() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = temp_dir.path().join("foo.mpb");
        let nested = FOO_MANIFEST.replace("\"Foo\"", "\"Nested\"");
        write_bundle(
            &bundle,
            &[("foo/macpack.toml", nested.as_str()), ("macpack.toml", FOO_MANIFEST)],
        );

        let manifest = ManifestStore::new().extract(&bundle).unwrap();
        assert_eq!(manifest.name, "Foo");
    }

    #[test]
    fn test_manifest_in_unrelated_folder_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let scratch = temp_dir.path().join("scratch");
        let bundle = temp_dir.path().join("foo.mpb");
        write_bundle(&bundle, &[("other/macpack.toml", FOO_MANIFEST)]);

        let err = ManifestStore::with_scratch_root(&scratch)
            .extract(&bundle)
            .unwrap_err();

        match err {
            MacpackError::ManifestNotFound { searched, .. } => {
                assert_eq!(searched, vec!["macpack.toml", "foo/macpack.toml"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(scratch_is_empty(&scratch));
    }

    #[test]
    fn test_malformed_manifest_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let scratch = temp_dir.path().join("scratch");
        let bundle = temp_dir.path().join("foo.mpb");
        write_bundle(&bundle, &[("macpack.toml", "[package]\nname = \"Foo\"\n")]);

        let err = ManifestStore::with_scratch_root(&scratch)
            .extract(&bundle)
            .unwrap_err();

        assert!(matches!(err, MacpackError::ManifestParse { .. }));
        assert!(scratch_is_empty(&scratch));
    }

    #[test]
    fn test_corrupt_archive_is_extraction_error() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = temp_dir.path().join("foo.mpb");
        std::fs::write(&bundle, b"PK but not really").unwrap();

        let err = ManifestStore::new().extract(&bundle).unwrap_err();
        assert!(matches!(err, MacpackError::ArchiveExtraction { .. }));
    }

    #[test]
    fn test_manifest_candidates() {
        let candidates = ManifestStore::manifest_candidates(Path::new("/b/my-app.mpb"));
        assert_eq!(candidates, vec!["macpack.toml", "my-app/macpack.toml"]);
    }
}
