//! Macpack Core - headless bundle resolution, launching and registry.
//!
//! A bundle (`.mpb`) is a zip archive with an embedded `macpack.toml`
//! manifest and a payload. This crate runs bundles through the installed
//! helper executable, reads their manifests and keeps a deduplicated,
//! persisted list of bundles the user has run. Presentation (windows, file
//! pickers) lives in the embedding application.
//!
//! # Example
//!
//! ```rust,no_run
//! use macpack_core::{BundleService, PathsConfig};
//! use std::path::Path;
//!
//! let service = BundleService::new(PathsConfig::from_home()?);
//!
//! let outcome = service.run_bundle(Path::new("/Users/ada/Downloads/foo.mpb"));
//! if let Some(output) = outcome.output() {
//!     print!("{}", output);
//! }
//! for error in &outcome.errors {
//!     eprintln!("{}", error);
//! }
//!
//! for entry in service.list()? {
//!     println!("{} - {}", entry.name, entry.description);
//! }
//! # Ok::<(), macpack_core::MacpackError>(())
//! ```

pub mod cancel;
pub mod config;
pub mod discovery;
pub mod error;
pub mod manifest;
pub mod persistence;
pub mod platform;
pub mod process;
pub mod registry;
pub mod service;

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use config::{BundleConfig, PathsConfig};
pub use error::{MacpackError, Result};
pub use manifest::{BundleManifest, ManifestStore};
pub use process::{LaunchOutput, Launcher};
pub use registry::{Registry, RegistryEntry};
pub use service::{BundleService, BundleServiceBuilder, RunOutcome, RunState};
