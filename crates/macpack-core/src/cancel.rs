//! Stopping a run from another thread.
//!
//! A run blocks for as long as the helper lives. Whoever embeds the core
//! (a Ctrl-C handler, a UI button) holds a clone of the run's token and
//! flips it; the launcher notices on its next poll and kills the helper.

use crate::error::{MacpackError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop flag for one or more runs.
///
/// Clones observe the same flag. Once cancelled a token stays cancelled,
/// so use a fresh token per run.
///
/// ```
/// use macpack_core::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every run holding this token to stop.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(MacpackError::Cancelled)` once [`CancellationToken::cancel`] was called.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(MacpackError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_passes_check() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
    }

    #[test]
    fn test_cancel_is_seen_by_clones_on_other_threads() {
        let token = CancellationToken::new();
        let handle = token.clone();

        std::thread::spawn(move || handle.cancel()).join().unwrap();

        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(MacpackError::Cancelled)));
    }
}
