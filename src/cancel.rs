//! Cooperative cancellation for in-flight scans.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared flag the coordinator raises to stop the scan early.
///
/// Cancellation is advisory: workers observe the flag at their next
/// queue-take, stop draining, and finish normally. Statistics
/// accumulated before the flag was observed are kept and merged.
///
/// # Examples
///
/// ```
/// use heapscan::cancel::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// let observer = token.clone();
/// token.cancel();
/// assert!(observer.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let observer = token.clone();

        token.cancel();
        assert!(token.is_cancelled());
        assert!(observer.is_cancelled());
    }

    #[test]
    fn fresh_tokens_are_independent() {
        let first = CancellationToken::new();
        let second = CancellationToken::new();

        first.cancel();
        assert!(!second.is_cancelled());
    }
}
