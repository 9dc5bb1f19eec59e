//! Centralized configuration for the macpack core.
//!
//! Constant tables for file names and timings, plus [`PathsConfig`], the
//! runtime set of filesystem locations a [`crate::BundleService`] works against.

use crate::error::Result;
use crate::platform;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bundle format constants.
pub struct BundleConfig;

impl BundleConfig {
    /// File extension of bundle archives (without the dot).
    pub const EXTENSION: &'static str = "mpb";
    /// Name of the manifest file inside a bundle.
    pub const MANIFEST_FILE_NAME: &'static str = "macpack.toml";
    /// Description stored when the manifest does not provide one.
    pub const DEFAULT_DESCRIPTION: &'static str = "No description provided.";
    /// Prefix of the scratch directories used for extraction.
    pub const SCRATCH_PREFIX: &'static str = "macpack-";
}

/// Helper process timing.
pub struct LaunchConfig;

impl LaunchConfig {
    /// How often a running helper is checked for exit, cancellation and deadline.
    pub const POLL_INTERVAL: Duration = Duration::from_millis(50);
}

/// Filesystem locations used by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    /// The separately installed helper that actually runs a bundle.
    pub helper_path: PathBuf,
    /// The persisted registry file.
    pub registry_path: PathBuf,
    /// Parent for extraction scratch directories. `None` uses the system temp dir.
    pub scratch_dir: Option<PathBuf>,
}

impl PathsConfig {
    pub const HELPER_DIR_NAME: &'static str = ".macpack";
    pub const HELPER_BIN_DIR_NAME: &'static str = "bin";
    pub const HELPER_NAME: &'static str = "macpack";
    pub const REGISTRY_FILE_NAME: &'static str = "apps.txt";

    /// Create a config from explicit locations.
    pub fn new(helper_path: impl Into<PathBuf>, registry_path: impl Into<PathBuf>) -> Self {
        Self {
            helper_path: helper_path.into(),
            registry_path: registry_path.into(),
            scratch_dir: None,
        }
    }

    /// Default locations under the user's home directory:
    /// `~/.macpack/bin/macpack` and `~/apps.txt`.
    pub fn from_home() -> Result<Self> {
        let home = platform::home_dir()?;
        Ok(Self::under(home))
    }

    /// Lay out the default structure under `root` instead of the home directory.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::new(
            root.join(Self::HELPER_DIR_NAME)
                .join(Self::HELPER_BIN_DIR_NAME)
                .join(platform::executable_name(Self::HELPER_NAME)),
            root.join(Self::REGISTRY_FILE_NAME),
        )
    }

    /// Set the parent directory for extraction scratch space.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }
}
