//! Run states and the record a run leaves behind.

use crate::error::MacpackError;
use crate::manifest::BundleManifest;
use crate::process::LaunchOutput;
use crate::registry::RegistryEntry;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Stages of a single bundle run.
///
/// ```text
/// Idle → Launching → LaunchFailed ───────────────────────────────→ Idle
///                  → Launched → ExtractingMetadata → MetadataFailed → Idle
///                                                  → MetadataReady → Registering → Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Idle,
    Launching,
    LaunchFailed,
    Launched,
    ExtractingMetadata,
    MetadataFailed,
    MetadataReady,
    Registering,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Launching => "launching",
            RunState::LaunchFailed => "launch_failed",
            RunState::Launched => "launched",
            RunState::ExtractingMetadata => "extracting_metadata",
            RunState::MetadataFailed => "metadata_failed",
            RunState::MetadataReady => "metadata_ready",
            RunState::Registering => "registering",
        }
    }

    /// Whether this state records a failed stage.
    pub fn is_failure(&self) -> bool {
        matches!(self, RunState::LaunchFailed | RunState::MetadataFailed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a run produced, including the errors it reported.
///
/// A run never panics or aborts the host: failures are collected in
/// `errors` and the trail always ends in [`RunState::Idle`].
#[derive(Debug)]
pub struct RunOutcome {
    /// Normalized path of the bundle that was run.
    pub bundle_path: PathBuf,
    /// Every state the run passed through, in order.
    pub trail: Vec<RunState>,
    pub launch: Option<LaunchOutput>,
    pub manifest: Option<BundleManifest>,
    /// The registry entry for this bundle's name: the new one when
    /// `inserted`, otherwise the one that was already registered.
    pub entry: Option<RegistryEntry>,
    /// Whether this run added an entry to the registry.
    pub inserted: bool,
    pub errors: Vec<MacpackError>,
}

impl RunOutcome {
    pub(crate) fn start(bundle_path: PathBuf) -> Self {
        Self {
            bundle_path,
            trail: vec![RunState::Idle],
            launch: None,
            manifest: None,
            entry: None,
            inserted: false,
            errors: Vec::new(),
        }
    }

    pub(crate) fn enter(&mut self, state: RunState) {
        debug!("{}: {}", self.bundle_path.display(), state);
        self.trail.push(state);
    }

    pub(crate) fn fail(&mut self, state: RunState, error: MacpackError) {
        self.enter(state);
        self.errors.push(error);
    }

    pub(crate) fn finish(mut self) -> Self {
        self.enter(RunState::Idle);
        self
    }

    /// Whether the helper ran to completion.
    pub fn launched(&self) -> bool {
        self.launch.is_some()
    }

    /// Captured helper output, if the helper ran.
    pub fn output(&self) -> Option<&str> {
        self.launch.as_ref().map(|launch| launch.output.as_str())
    }

    /// The failed stage, if any.
    pub fn failed_state(&self) -> Option<RunState> {
        self.trail.iter().copied().find(RunState::is_failure)
    }

    /// The first error reported by the run.
    pub fn primary_error(&self) -> Option<&MacpackError> {
        self.errors.first()
    }

    /// Whether every stage succeeded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_trail_starts_and_ends_idle() {
        let mut outcome = RunOutcome::start(PathBuf::from("/b/foo.mpb"));
        outcome.enter(RunState::Launching);
        outcome.fail(
            RunState::LaunchFailed,
            MacpackError::ProcessLaunch {
                executable: PathBuf::from("/missing"),
                message: "Helper executable not found".into(),
                source: None,
            },
        );
        let outcome = outcome.finish();

        assert_eq!(
            outcome.trail,
            vec![
                RunState::Idle,
                RunState::Launching,
                RunState::LaunchFailed,
                RunState::Idle
            ]
        );
        assert_eq!(outcome.failed_state(), Some(RunState::LaunchFailed));
        assert!(!outcome.launched());
        assert!(!outcome.is_clean());
        assert_eq!(outcome.primary_error().map(|e| e.code()), Some("process_launch"));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(RunState::ExtractingMetadata.to_string(), "extracting_metadata");
        assert!(RunState::MetadataFailed.is_failure());
        assert!(!RunState::Registering.is_failure());
    }
}
