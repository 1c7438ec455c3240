//! Injected scheduling.

use std::time::Duration;

/// Waits for a duration. Injected so tests can run on virtual time.
#[async_trait::async_trait]
pub trait Delay: Send + Sync {
    /// Completes after `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Delay`] backed by the tokio timer.
///
/// Under `#[tokio::test(start_paused = true)]` this advances virtual time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait::async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
