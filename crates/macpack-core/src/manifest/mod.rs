//! Bundle manifests.
//!
//! A bundle (`.mpb`) is a zip archive carrying a `macpack.toml` manifest,
//! either at the archive root or inside a top-level folder named after the
//! bundle:
//!
//! ```text
//! foo.mpb                    foo.mpb
//! ├── macpack.toml    or     └── foo/
//! └── payload...                 ├── macpack.toml
//!                                └── payload...
//! ```
//!
//! [`ManifestStore`] unpacks a bundle into scratch space, finds the manifest
//! and decodes it into a [`BundleManifest`].

mod archive;
mod store;
mod types;

pub use archive::extract_archive;
pub use store::ManifestStore;
pub use types::BundleManifest;
