use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Windows are swept once the map grows past this many users
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Rejection returned when a user has exhausted the current window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub retry_after: Duration,
}

/// Fixed-window, per-user message limiter
///
/// State is process-local and lost on restart.
#[derive(Debug)]
pub struct MessageRateLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl MessageRateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Count one message for `user_id`, or reject if the window is full
    pub async fn check(&self, user_id: &str) -> Result<(), RateLimited> {
        self.check_at(user_id, Instant::now()).await
    }

    pub async fn check_at(&self, user_id: &str, now: Instant) -> Result<(), RateLimited> {
        let mut windows = self.windows.lock().await;

        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, w| w.reset_at > now);
        }

        let window = windows.entry(user_id.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + self.window,
        });

        if now >= window.reset_at {
            window.count = 0;
            window.reset_at = now + self.window;
        }

        if window.count >= self.limit {
            return Err(RateLimited {
                retry_after: window.reset_at.saturating_duration_since(now),
            });
        }

        window.count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_within_window() {
        let limiter = MessageRateLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at("alice", start).await.is_ok());
        }
        let err = limiter
            .check_at("alice", start + Duration::from_secs(10))
            .await
            .unwrap_err();
        assert_eq!(err.retry_after, Duration::from_secs(50));
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = MessageRateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at("alice", start).await.is_ok());
        assert!(limiter.check_at("alice", start + Duration::from_secs(59)).await.is_err());
        assert!(limiter.check_at("alice", start + Duration::from_secs(60)).await.is_ok());
    }

    #[tokio::test]
    async fn test_users_are_independent() {
        let limiter = MessageRateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at("alice", start).await.is_ok());
        assert!(limiter.check_at("bob", start).await.is_ok());
        assert!(limiter.check_at("alice", start).await.is_err());
    }
}
