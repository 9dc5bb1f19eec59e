//! Builder for configuring a BundleService.

use crate::config::PathsConfig;
use crate::manifest::ManifestStore;
use crate::process::Launcher;
use crate::registry::Registry;
use crate::service::BundleService;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};

/// Builder for configuring [`BundleService`] initialization.
///
/// # Example
///
/// ```rust,no_run
/// use macpack_core::{BundleService, PathsConfig};
/// use std::time::Duration;
///
/// let paths = PathsConfig::from_home()?;
/// let service = BundleService::builder(paths)
///     .launch_timeout(Duration::from_secs(600))
///     .build();
/// # Ok::<(), macpack_core::MacpackError>(())
/// ```
pub struct BundleServiceBuilder {
    paths: PathsConfig,
    launch_timeout: Option<Duration>,
}

impl BundleServiceBuilder {
    /// Create a new builder for the given locations.
    pub fn new(paths: PathsConfig) -> Self {
        Self {
            paths,
            launch_timeout: None,
        }
    }

    /// Kill the helper if a run takes longer than `timeout`.
    ///
    /// Default: no timeout (wait for the helper however long it runs)
    pub fn launch_timeout(mut self, timeout: Duration) -> Self {
        self.launch_timeout = Some(timeout);
        self
    }

    /// Extract bundles under `dir` instead of the system temp directory.
    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.scratch_dir = Some(dir.into());
        self
    }

    /// Build the service, loading the registry.
    ///
    /// An unreadable registry never fails the build: the service starts empty
    /// and keeps the error for [`BundleService::take_load_warning`].
    pub fn build(self) -> BundleService {
        let mut launcher = Launcher::new(&self.paths.helper_path);
        if let Some(timeout) = self.launch_timeout {
            launcher = launcher.with_timeout(timeout);
        }

        let manifests = match &self.paths.scratch_dir {
            Some(dir) => ManifestStore::with_scratch_root(dir),
            None => ManifestStore::new(),
        };

        let (registry, load_warning) = match Registry::try_load(&self.paths.registry_path) {
            Ok(registry) => (registry, None),
            Err(e) => {
                warn!("{}; starting with an empty registry", e);
                (Registry::empty(&self.paths.registry_path), Some(e))
            }
        };

        info!(
            "Bundle service ready: helper {}, registry {} ({} entries)",
            self.paths.helper_path.display(),
            self.paths.registry_path.display(),
            registry.len()
        );

        BundleService {
            paths: self.paths,
            launcher,
            manifests,
            registry: Mutex::new(registry),
            load_warning: Mutex::new(load_warning),
        }
    }
}
