//! Flood-control handling shared by every remote step.

use std::time::Duration;

use crate::telegram::TelegramError;

/// Pause policy for flood-control signals.
///
/// The remote service tells us how long to back off; we wait that long plus a
/// fixed margin and then resume at whatever point the calling step chooses.
#[derive(Debug, Clone, Copy)]
pub struct FloodControl {
    margin: Duration,
}

impl Default for FloodControl {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MARGIN)
    }
}

impl FloodControl {
    pub const DEFAULT_MARGIN: Duration = Duration::from_secs(5);

    pub fn new(margin: Duration) -> Self {
        Self { margin }
    }

    pub fn from_secs(margin_secs: u64) -> Self {
        Self::new(Duration::from_secs(margin_secs))
    }

    /// Total time slept for a mandated wait.
    pub fn pause_for(&self, wait: Duration) -> Duration {
        wait + self.margin
    }

    pub async fn pause(&self, wait: Duration, step: &str) {
        let total = self.pause_for(wait);
        tracing::warn!(
            "Flood wait during {}: {}s requested, sleeping {}s",
            step,
            wait.as_secs(),
            total.as_secs()
        );
        tokio::time::sleep(total).await;
    }

    /// Pause if `err` is a flood-control signal. Returns whether it was one.
    pub async fn absorb(&self, err: &TelegramError, step: &str) -> bool {
        match err.flood_wait() {
            Some(wait) => {
                self.pause(wait, step).await;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::RpcError;

    #[test]
    fn test_pause_adds_margin() {
        let flood = FloodControl::default();
        assert_eq!(flood.pause_for(Duration::from_secs(7)), Duration::from_secs(12));
        assert_eq!(
            FloodControl::from_secs(0).pause_for(Duration::from_secs(3)),
            Duration::from_secs(3)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_absorb_sleeps_for_flood_wait() {
        let flood = FloodControl::default();
        let err: TelegramError = RpcError::parse(420, "FLOOD_WAIT_10").into();

        let start = tokio::time::Instant::now();
        assert!(flood.absorb(&err, "test").await);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(15), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(16), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_absorb_ignores_other_errors() {
        let flood = FloodControl::default();
        let err: TelegramError = RpcError::parse(400, "CHANNEL_PRIVATE").into();

        let start = tokio::time::Instant::now();
        assert!(!flood.absorb(&err, "test").await);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
