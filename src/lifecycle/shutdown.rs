//! Graceful stop for the gate: the HTTP server drains in-flight requests and
//! the idle-window sweeper leaves its loop.

use tokio::sync::broadcast;

/// One-shot stop signal fanned out to the server and the sweeper.
///
/// [`HttpServer::run`](crate::http::HttpServer::run) takes one receiver and
/// hands a resubscribed copy to the sweeper, so a single [`Shutdown::trigger`]
/// stops both.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        // Capacity 1: the only message ever sent is the stop signal.
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver for a task that must stop with the gate.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Stop everything subscribed. Calling again, or with nobody
    /// listening, does nothing.
    pub fn trigger(&self) {
        if self.tx.send(()).is_err() {
            tracing::debug!("Shutdown triggered with no running tasks");
        }
    }

    /// Tasks that have not dropped their receiver yet.
    pub fn pending_tasks(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_all_subscribers_are_notified() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();
        assert_eq!(shutdown.pending_tasks(), 2);

        shutdown.trigger();
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[test]
    fn test_trigger_without_subscribers_is_harmless() {
        Shutdown::new().trigger();
    }

    #[tokio::test]
    async fn test_dropped_receivers_are_not_pending() {
        let shutdown = Shutdown::new();
        let server = shutdown.subscribe();
        let sweeper = server.resubscribe();
        assert_eq!(shutdown.pending_tasks(), 2);

        drop(server);
        drop(sweeper);
        assert_eq!(shutdown.pending_tasks(), 0);
    }
}
