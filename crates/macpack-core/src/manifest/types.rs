//! Manifest data model.

use crate::config::BundleConfig;
use crate::error::{MacpackError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata decoded from a bundle's `macpack.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub name: String,
    /// Falls back to [`BundleConfig::DEFAULT_DESCRIPTION`] when the manifest omits it.
    #[serde(default = "default_description")]
    pub description: String,
    pub version: String,
    pub author: String,
    /// Logical entry point. Parsed and reported, but launching always goes
    /// through the installed helper.
    pub exec: String,
}

/// On-disk layout: everything lives under a `[package]` table.
#[derive(Debug, Deserialize)]
struct ManifestFile {
    package: BundleManifest,
}

fn default_description() -> String {
    BundleConfig::DEFAULT_DESCRIPTION.to_string()
}

impl BundleManifest {
    /// Decode manifest text.
    ///
    /// `bundle` and `entry` only label the error; a manifest is either fully
    /// valid or rejected, never partially filled.
    pub fn parse(contents: &str, bundle: &Path, entry: &str) -> Result<Self> {
        let parse_error = |message: String| MacpackError::ManifestParse {
            bundle: bundle.to_path_buf(),
            entry: entry.to_string(),
            message,
        };

        let file: ManifestFile =
            toml::from_str(contents).map_err(|e| parse_error(e.message().to_string()))?;
        let manifest = file.package;

        for (field, value) in [
            ("name", &manifest.name),
            ("version", &manifest.version),
            ("author", &manifest.author),
            ("exec", &manifest.exec),
        ] {
            if value.trim().is_empty() {
                return Err(parse_error(format!(
                    "field `package.{}` must not be empty",
                    field
                )));
            }
        }

        Ok(manifest)
    }
}
