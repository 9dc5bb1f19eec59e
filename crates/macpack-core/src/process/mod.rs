//! Helper process execution.
//!
//! Bundles are not executed directly: the separately installed helper
//! (`~/.macpack/bin/macpack`) receives the bundle path as its only argument
//! and does the real work. This module runs it and captures what it prints.

mod launcher;

pub use launcher::{LaunchOutput, Launcher};
