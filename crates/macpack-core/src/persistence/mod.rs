//! Crash-safe file persistence.
//!
//! The registry file is the only durable state the core owns; writes go
//! through [`atomic_write_json`] so a failed write never clobbers it.

mod atomic;

pub use atomic::{atomic_read_json, atomic_write_json};
