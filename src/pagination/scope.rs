//! Lifetime scope of a feed
//!
//! A feed is active from creation until it is detached (the hosting screen
//! goes away). Fetches race against the scope so a response that arrives
//! after detachment is dropped instead of folded.

use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable handle to a feed's active lifetime
#[derive(Debug, Clone)]
pub struct FetchScope {
    detached: Arc<watch::Sender<bool>>,
}

impl FetchScope {
    /// Create an active scope
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            detached: Arc::new(tx),
        }
    }

    /// Close the scope. Idempotent.
    pub fn detach(&self) {
        self.detached.send_replace(true);
    }

    /// Whether the scope has been closed
    pub fn is_detached(&self) -> bool {
        *self.detached.borrow()
    }

    /// Resolves once the scope is closed
    pub async fn detached(&self) {
        let mut rx = self.detached.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|detached| *detached).await;
    }
}

impl Default for FetchScope {
    fn default() -> Self {
        Self::new()
    }
}
