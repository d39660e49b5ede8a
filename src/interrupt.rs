// ABOUTME: Bridges an interrupt signal to a per-invocation cancellation token.
// ABOUTME: One listener task; dropping the guard aborts it and cancels the token.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owns the interrupt listener for one invocation.
///
/// Keep it alive for as long as interrupts should cancel the run.
pub struct InterruptGuard {
    token: CancellationToken,
    interrupted: Arc<AtomicBool>,
    listener: JoinHandle<()>,
}

impl InterruptGuard {
    /// Listen for Ctrl-C.
    pub fn install(token: CancellationToken) -> Self {
        Self::with_signal(token, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for interrupt");
                std::future::pending::<()>().await;
            }
        })
    }

    /// Cancel `token` when `signal` completes.
    ///
    /// Must be called within a tokio runtime.
    pub fn with_signal<F>(token: CancellationToken, signal: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let interrupted = Arc::new(AtomicBool::new(false));

        let listener = {
            let token = token.clone();
            let interrupted = Arc::clone(&interrupted);
            tokio::spawn(async move {
                tokio::select! {
                    _ = signal => {
                        tracing::debug!("interrupt received");
                        interrupted.store(true, Ordering::SeqCst);
                        token.cancel();
                    }
                    _ = token.cancelled() => {}
                }
            })
        };

        Self {
            token,
            interrupted,
            listener,
        }
    }

    /// Whether the signal fired (as opposed to a plain teardown).
    pub fn interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.listener.abort();
        self.token.cancel();
    }
}
