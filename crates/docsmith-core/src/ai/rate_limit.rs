//! Fixed-window request budget.

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

/// Allows at most `limit` acquisitions per window.
///
/// Callers over budget wait for the next window. A limit of 0 disables
/// limiting.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    state: Mutex<Window>,
}

#[derive(Debug)]
struct Window {
    started: Instant,
    used: u32,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(Window {
                started: Instant::now(),
                used: 0,
            }),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Wait until a request slot is available and take it
    pub async fn acquire(&self) {
        if self.limit == 0 {
            return;
        }

        // Waiters queue on the lock, so slots are handed out in arrival order
        let mut window = self.state.lock().await;
        loop {
            let now = Instant::now();
            if now.duration_since(window.started) >= self.window {
                window.started = now;
                window.used = 0;
            }
            if window.used < self.limit {
                window.used += 1;
                return;
            }

            let resume = window.started + self.window;
            debug!(wait = ?resume.duration_since(now), "Request budget exhausted");
            tokio::time::sleep_until(resume).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_next_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(10));
        let started = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(started.elapsed(), Duration::ZERO);

        limiter.acquire().await;
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_limit_is_unlimited() {
        let limiter = RateLimiter::per_minute(0);
        let started = Instant::now();
        for _ in 0..100 {
            limiter.acquire().await;
        }
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
