//! Registry of previously run bundles.
//!
//! The registry is a JSON array of `{id, name, description, path}` records
//! stored in a single file (`~/apps.txt` by default). That file is the only
//! source of truth across restarts.
//!
//! Entry names are unique: adding a bundle whose manifest name is already
//! registered is a no-op, even when the archive lives somewhere else.

mod app_registry;

pub use app_registry::{Registry, RegistryEntry};
