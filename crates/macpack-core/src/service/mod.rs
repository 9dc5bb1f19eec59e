//! Bundle service: launch, inspect, register.
//!
//! [`BundleService`] composes the [`Launcher`], the [`ManifestStore`] and the
//! [`Registry`]. A run launches the helper, then reads the bundle's manifest,
//! then records the bundle in the registry. Only a failed launch stops a run
//! early; manifest and registry failures are reported without undoing the
//! launch.

mod builder;
mod state;

pub use builder::BundleServiceBuilder;
pub use state::{RunOutcome, RunState};

use crate::cancel::CancellationToken;
use crate::config::PathsConfig;
use crate::error::{MacpackError, Result};
use crate::manifest::{BundleManifest, ManifestStore};
use crate::platform;
use crate::process::Launcher;
use crate::registry::{Registry, RegistryEntry};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};

/// Orchestrates bundle runs and owns the registry.
///
/// Registry reads and writes are serialized, so a service shared between
/// threads (or UI actions) never loses an update.
pub struct BundleService {
    paths: PathsConfig,
    launcher: Launcher,
    manifests: ManifestStore,
    registry: Mutex<Registry>,
    load_warning: Mutex<Option<MacpackError>>,
}

impl BundleService {
    /// Create a service with default options.
    pub fn new(paths: PathsConfig) -> Self {
        Self::builder(paths).build()
    }

    /// Create a builder for more control over initialization.
    pub fn builder(paths: PathsConfig) -> BundleServiceBuilder {
        BundleServiceBuilder::new(paths)
    }

    pub fn paths(&self) -> &PathsConfig {
        &self.paths
    }

    /// The error hit while loading the registry, if it had to start empty.
    ///
    /// Returned once; later calls yield `None`.
    pub fn take_load_warning(&self) -> Option<MacpackError> {
        self.load_warning
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    /// Run the bundle at `bundle_path` once.
    pub fn run_bundle(&self, bundle_path: &Path) -> RunOutcome {
        self.run_bundle_with_cancel(bundle_path, &CancellationToken::new())
    }

    /// Run the bundle at `bundle_path`, stopping the helper if `cancel` fires.
    pub fn run_bundle_with_cancel(
        &self,
        bundle_path: &Path,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let resolved = platform::normalize_path(bundle_path);
        let mut outcome = RunOutcome::start(
            resolved
                .as_ref()
                .map(PathBuf::clone)
                .unwrap_or_else(|_| bundle_path.to_path_buf()),
        );

        outcome.enter(RunState::Launching);
        let launch = match resolved.and_then(|path| self.launcher.run_with_cancel(&path, cancel)) {
            Ok(launch) => launch,
            Err(e) => {
                error!("Failed to run {}: {}", bundle_path.display(), e);
                outcome.fail(RunState::LaunchFailed, e);
                return outcome.finish();
            }
        };
        outcome.enter(RunState::Launched);
        let bundle_path = launch.bundle_path.clone();
        outcome.launch = Some(launch);

        outcome.enter(RunState::ExtractingMetadata);
        let manifest = match self.manifests.extract(&bundle_path) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(
                    "Bundle {} ran but its manifest could not be read: {}",
                    bundle_path.display(),
                    e
                );
                outcome.fail(RunState::MetadataFailed, e);
                return outcome.finish();
            }
        };
        outcome.enter(RunState::MetadataReady);

        outcome.enter(RunState::Registering);
        let entry = RegistryEntry::from_manifest(&manifest, &bundle_path);
        outcome.manifest = Some(manifest);
        match self.register(entry) {
            Ok((entry, inserted)) => {
                outcome.entry = Some(entry);
                outcome.inserted = inserted;
            }
            Err(e) => {
                warn!("Failed to register {}: {}", bundle_path.display(), e);
                outcome.errors.push(e);
            }
        }

        outcome.finish()
    }

    /// Run a bundle on the blocking thread pool.
    ///
    /// The run itself is the same blocking call as [`BundleService::run_bundle`];
    /// this only keeps an async caller (CLI, UI event loop) responsive while the
    /// helper runs.
    pub async fn run_bundle_async(
        self: Arc<Self>,
        bundle_path: PathBuf,
        cancel: CancellationToken,
    ) -> Result<RunOutcome> {
        tokio::task::spawn_blocking(move || self.run_bundle_with_cancel(&bundle_path, &cancel))
            .await
            .map_err(|e| MacpackError::Other(format!("Bundle run task failed: {}", e)))
    }

    /// Read a bundle's manifest without launching it.
    pub fn inspect(&self, bundle_path: &Path) -> Result<BundleManifest> {
        let bundle_path = platform::normalize_path(bundle_path)?;
        self.manifests.extract(&bundle_path)
    }

    /// Registered bundles, in insertion order.
    pub fn list(&self) -> Result<Vec<RegistryEntry>> {
        Ok(self.lock_registry()?.entries().to_vec())
    }

    pub fn get(&self, id: &str) -> Result<Option<RegistryEntry>> {
        Ok(self.lock_registry()?.get(id).cloned())
    }

    /// Remove the entry with `id` and persist the registry.
    ///
    /// Unknown ids leave the registry (and its file) untouched and return
    /// `false`. If the save fails the entry is put back where it was.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut registry = self.lock_registry()?;
        let (index, entry) = match registry.take(id) {
            Some(taken) => taken,
            None => return Ok(false),
        };
        if let Err(e) = registry.save() {
            registry.restore(index, entry);
            return Err(e);
        }
        info!("Removed {} from the registry", entry.name);
        Ok(true)
    }

    /// Remove entries whose bundle archive no longer exists, returning them.
    pub fn prune_missing(&self) -> Result<Vec<RegistryEntry>> {
        let mut registry = self.lock_registry()?;
        let snapshot = registry.entries().to_vec();
        let pruned = registry.retain(|entry| entry.path.is_file());
        if !pruned.is_empty() {
            if let Err(e) = registry.save() {
                registry.reset(snapshot);
                return Err(e);
            }
            info!("Pruned {} registry entries with missing bundles", pruned.len());
        }
        Ok(pruned)
    }

    /// Upsert `entry` and persist only if it was inserted.
    ///
    /// Returns the registered entry for the name and whether it is new. A
    /// failed save takes the new entry back out, so memory never holds an
    /// entry the registry file lacks.
    fn register(&self, entry: RegistryEntry) -> Result<(RegistryEntry, bool)> {
        // The file stores paths as JSON strings.
        if entry.path.to_str().is_none() {
            return Err(MacpackError::RegistryPersistence {
                path: self.paths.registry_path.clone(),
                message: format!("Bundle path {} is not valid UTF-8", entry.path.display()),
            });
        }

        let mut registry = self.lock_registry()?;
        let candidate = entry.clone();
        if !registry.upsert(entry) {
            let existing = registry
                .find_by_name(&candidate.name)
                .cloned()
                .unwrap_or(candidate);
            info!("{} is already registered", existing.name);
            return Ok((existing, false));
        }

        if let Err(e) = registry.save() {
            registry.take(&candidate.id);
            return Err(e);
        }
        Ok((candidate, true))
    }

    fn lock_registry(&self) -> Result<MutexGuard<'_, Registry>> {
        self.registry
            .lock()
            .map_err(|_| MacpackError::Other("Failed to acquire registry lock".to_string()))
    }
}
