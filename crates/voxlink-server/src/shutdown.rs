//! Graceful shutdown coordination via `CancellationToken`.

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Coordinates graceful shutdown between the signal handler, the HTTP
/// listener, and the peer link.
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self { token: CancellationToken::new() }
    }

    /// Get a clone of the cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Initiate shutdown.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether a shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once ctrl-c arrives (or shutdown is initiated elsewhere),
    /// then initiate shutdown.
    pub async fn wait_for_signal(&self) {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "failed to listen for ctrl-c");
                }
                info!("interrupt received, shutting down");
            }
            () = self.token.cancelled() => {}
        }
        self.shutdown();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_not_shutting_down() {
        let coord = ShutdownCoordinator::new();
        assert!(!coord.is_shutting_down());
    }

    #[test]
    fn shutdown_sets_flag_and_is_idempotent() {
        let coord = ShutdownCoordinator::new();
        coord.shutdown();
        coord.shutdown();
        assert!(coord.is_shutting_down());
    }

    #[test]
    fn tokens_observe_shutdown() {
        let coord = ShutdownCoordinator::new();
        let t1 = coord.token();
        let t2 = coord.token();
        coord.shutdown();
        assert!(t1.is_cancelled());
        assert!(t2.is_cancelled());
    }

    #[tokio::test]
    async fn wait_for_signal_unblocks_on_external_shutdown() {
        let coord = std::sync::Arc::new(ShutdownCoordinator::new());
        let waiter = coord.clone();
        let handle = tokio::spawn(async move { waiter.wait_for_signal().await });
        coord.shutdown();
        handle.await.unwrap();
        assert!(coord.is_shutting_down());
    }
}
