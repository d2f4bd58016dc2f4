//! Graceful shutdown primitives.
//!
//! Every Broker-session-owning service shares one
//! [`tokio_util::sync::CancellationToken`] between the bus loop, the
//! heartbeat task, and the worker thread. `SIGINT` and `SIGTERM` both
//! trigger it; the heartbeat task also triggers it if the worker thread
//! dies.

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Trait for components that can be shut down synchronously — used by the
/// worker loop, which is not itself async.
pub trait SyncShutdown {
    type Result;
    fn shutdown(&mut self) -> Self::Result;
}

/// Trait for components that require asynchronous shutdown operations, such
/// as closing a bus channel or flushing a writer.
pub trait AsyncShutdown {
    type Result;
    fn shutdown(&mut self) -> impl Future<Output = Self::Result> + Send;
}

/// Spawns a listener that cancels `token` on `SIGINT` or `SIGTERM`.
///
/// Exit code on clean shutdown is 0; a fatal [`crate::error::BridgeError`]
/// elsewhere in the process is responsible for a non-zero exit — this
/// listener only handles the cooperative path.
pub fn install_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received SIGINT, shutting down");
            }
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, shutting down");
            }
        }
        token.cancel();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_cancels_and_is_observable() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }
}
