//! Platform-specific path handling.
//!
//! Keeps home-directory lookup, executable naming and path normalization
//! in one place so the rest of the crate never branches on the OS.

mod paths;

pub use paths::{executable_name, home_dir, normalize_path};
