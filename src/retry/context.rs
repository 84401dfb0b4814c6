use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Counts retried attempts across every call site sharing it.
#[derive(Debug, Default)]
pub struct RetryCounter(AtomicU64);

impl RetryCounter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Records one retried attempt and returns the new total.
    pub fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-batch state handed to every outbound call.
///
/// Cloning is cheap and every clone shares the same counter and token.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    pub retries: Arc<RetryCounter>,
    pub cancel: CancellationToken,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose cancellation follows `parent`.
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self {
            retries: Arc::new(RetryCounter::new()),
            cancel: parent.child_token(),
        }
    }

    pub fn retry_count(&self) -> u64 {
        self.retries.get()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counter() {
        let ctx = CallContext::new();
        let other = ctx.clone();
        other.retries.increment();
        assert_eq!(ctx.retries.increment(), 2);
        assert_eq!(ctx.retry_count(), 2);
    }

    #[test]
    fn child_context_follows_parent_cancel() {
        let parent = CancellationToken::new();
        let ctx = CallContext::child_of(&parent);
        assert!(!ctx.is_cancelled());
        parent.cancel();
        assert!(ctx.is_cancelled());
    }
}
