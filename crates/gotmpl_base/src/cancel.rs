//! Cooperative cancellation (§5): every query entry point polls a token
//! rather than owning a clock or a thread to interrupt. A token is cheap to
//! clone and share across the caller's timeout machinery and the request
//! itself; cancelling never panics or blocks anything, since the core holds
//! no resources a cancelled request would need to release.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared flag a host sets to interrupt an in-flight request.
///
/// Cloning shares the same underlying flag: the host keeps one clone to call
/// [`CancellationToken::cancel`] (from a timer or a "stop" button) while
/// handing another clone to the request itself.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken { flag: Arc::new(AtomicBool::new(false)) }
    }

    /// Requests cancellation. Idempotent; may be called from any thread.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_cancelled() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn cancel_is_visible_through_a_clone() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn cancel_is_idempotent() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }
}
