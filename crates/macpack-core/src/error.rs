//! Error types for the macpack core.
//!
//! Every failure a run can hit has its own variant so callers can tell a
//! missing helper apart from a bundle with a broken manifest.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the macpack core.
#[derive(Debug, Error)]
pub enum MacpackError {
    // Archive / manifest errors
    #[error("Failed to extract bundle archive {path}: {message}")]
    ArchiveExtraction {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<zip::result::ZipError>,
    },

    #[error("Manifest not found in bundle {bundle} (searched {searched:?})")]
    ManifestNotFound {
        bundle: PathBuf,
        /// Archive-relative locations that were checked, in order.
        searched: Vec<String>,
    },

    #[error("Invalid manifest {entry} in bundle {bundle}: {message}")]
    ManifestParse {
        bundle: PathBuf,
        /// Archive-relative location of the manifest that failed to parse.
        entry: String,
        message: String,
    },

    // Process errors
    #[error("Failed to launch {executable}: {message}")]
    ProcessLaunch {
        executable: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Helper process failed: {message}")]
    ProcessExecution {
        message: String,
        /// Whatever the process wrote before it failed.
        output: String,
    },

    #[error("Helper process timed out after {0:?}")]
    Timeout(Duration),

    #[error("Run cancelled")]
    Cancelled,

    // Persistence errors
    #[error("Registry persistence error at {path}: {message}")]
    RegistryPersistence { path: PathBuf, message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for macpack operations.
pub type Result<T> = std::result::Result<T, MacpackError>;

impl From<std::io::Error> for MacpackError {
    fn from(err: std::io::Error) -> Self {
        MacpackError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for MacpackError {
    fn from(err: serde_json::Error) -> Self {
        MacpackError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl MacpackError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        MacpackError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Stable identifier for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            MacpackError::ArchiveExtraction { .. } => "archive_extraction",
            MacpackError::ManifestNotFound { .. } => "manifest_not_found",
            MacpackError::ManifestParse { .. } => "manifest_parse",
            MacpackError::ProcessLaunch { .. } => "process_launch",
            MacpackError::ProcessExecution { .. } => "process_execution",
            MacpackError::Timeout(_) => "timeout",
            MacpackError::Cancelled => "cancelled",
            MacpackError::RegistryPersistence { .. } => "registry_persistence",
            MacpackError::Io { .. } => "io",
            MacpackError::Json { .. } => "json",
            MacpackError::Config { .. } => "config",
            MacpackError::Other(_) => "other",
        }
    }

    /// Whether the failure only degrades a run instead of aborting it.
    ///
    /// Metadata and registry failures leave the launched bundle running
    /// (or finished) and only cost the registry entry.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MacpackError::ArchiveExtraction { .. }
                | MacpackError::ManifestNotFound { .. }
                | MacpackError::ManifestParse { .. }
                | MacpackError::RegistryPersistence { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MacpackError::ManifestParse {
            bundle: PathBuf::from("/tmp/foo.mpb"),
            entry: "macpack.toml".into(),
            message: "missing field `name`".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid manifest macpack.toml in bundle /tmp/foo.mpb: missing field `name`"
        );
    }

    #[test]
    fn test_error_codes_are_distinct_for_manifest_failures() {
        let not_found = MacpackError::ManifestNotFound {
            bundle: PathBuf::from("/b/foo.mpb"),
            searched: vec!["macpack.toml".into()],
        };
        let parse = MacpackError::ManifestParse {
            bundle: PathBuf::from("/b/foo.mpb"),
            entry: "macpack.toml".into(),
            message: "bad".into(),
        };
        let archive = MacpackError::ArchiveExtraction {
            path: PathBuf::from("/b/foo.mpb"),
            message: "bad zip".into(),
            source: None,
        };
        assert_ne!(not_found.code(), parse.code());
        assert_ne!(parse.code(), archive.code());
        assert_ne!(archive.code(), not_found.code());
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(MacpackError::RegistryPersistence {
            path: PathBuf::from("apps.txt"),
            message: "corrupt".into(),
        }
        .is_recoverable());
        assert!(!MacpackError::ProcessLaunch {
            executable: PathBuf::from("/missing"),
            message: "not found".into(),
            source: None,
        }
        .is_recoverable());
        assert!(!MacpackError::Cancelled.is_recoverable());
    }

    #[test]
    fn test_io_with_path() {
        let err = MacpackError::io_with_path(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            "/tmp/apps.txt",
        );
        match err {
            MacpackError::Io { path, .. } => assert_eq!(path, Some(PathBuf::from("/tmp/apps.txt"))),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
