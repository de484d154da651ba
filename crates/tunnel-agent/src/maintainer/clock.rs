use std::time::Duration;

/// Time source for the maintainer's sleeps.
///
/// In production: [`TokioClock`]. In tests: `RecordingClock`, which
/// returns immediately and remembers every requested delay.
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait::async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
