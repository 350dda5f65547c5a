//! Shutdown coordination for the server and its background tasks.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// The flag is sticky: a task that starts waiting after [`Shutdown::trigger`]
/// returns at once instead of missing the signal.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Resolves once shutdown has been triggered.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            // Err means every Shutdown handle is gone; nobody can trigger anymore.
            let closed = rx.wait_for(|triggered| *triggered).await.is_err();
            if closed {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Signal every waiter. Triggering twice is harmless.
    pub fn trigger(&self) {
        if !self.tx.send_replace(true) {
            tracing::debug!(waiters = self.tx.receiver_count(), "Shutdown triggered");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Number of tasks currently waiting.
    pub fn waiters(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
