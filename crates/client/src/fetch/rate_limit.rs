//! Per-adapter request pacing.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum spacing between request starts.
///
/// Holds one "last request start" instant. Each adapter owns its own limiter,
/// so sources pace independently. Waiters queue on a fair mutex and are
/// released in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    last_start: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self { last_start: Mutex::new(None), min_interval }
    }

    /// Wait until a request may start, record the start and return it.
    pub async fn acquire(&self) -> Instant {
        let mut last = self.last_start.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        let now = Instant::now();
        *last = Some(now);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let before = Instant::now();
        let started = limiter.acquire().await;
        assert_eq!(started, before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_spaces_starts() {
        let limiter = RateLimiter::new(Duration::from_millis(750));
        let first = limiter.acquire().await;
        let second = limiter.acquire().await;
        let third = limiter.acquire().await;
        assert!(second - first >= Duration::from_millis(750));
        assert!(third - second >= Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_idle_period() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let before = Instant::now();
        let started = limiter.acquire().await;
        assert_eq!(started, before);
    }
}
