//! Per-actor request throttle.
//!
//! Fixed-window counting: each actor gets `max_requests` per `window`.
//! Exceeding the window yields `RateLimited` with a retry-after hint so
//! callers can back off instead of hammering the workflow.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::domain::ActorId;
use crate::error::WorkflowError;

pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<ActorId, (Instant, u32)>>,
}

impl RateLimiter {
    /// `max_requests == 0` disables the limiter entirely.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, Duration::from_secs(1))
    }

    /// Records one request for `actor_id` and fails once the window's
    /// budget is spent.
    pub fn check(&self, actor_id: ActorId) -> Result<(), WorkflowError> {
        if self.max_requests == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| WorkflowError::Server("rate limiter mutex poisoned".into()))?;

        let entry = windows.entry(actor_id).or_insert((now, 0));
        if now.duration_since(entry.0) >= self.window {
            *entry = (now, 0);
        }

        if entry.1 >= self.max_requests {
            let elapsed = now.duration_since(entry.0);
            let retry_after_ms = self.window.saturating_sub(elapsed).as_millis() as u64;
            return Err(WorkflowError::RateLimited { retry_after_ms });
        }

        entry.1 += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn requests_within_budget_pass() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.check(1).is_ok());
        }
    }

    #[test]
    fn exceeding_budget_returns_retry_hint() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        limiter.check(1).unwrap();
        limiter.check(1).unwrap();

        match limiter.check(1).unwrap_err() {
            WorkflowError::RateLimited { retry_after_ms } => {
                assert!(retry_after_ms <= 60_000);
                assert!(retry_after_ms > 0);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn actors_have_independent_windows() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        limiter.check(1).unwrap();
        assert!(limiter.check(2).is_ok());
        assert_eq!(limiter.check(1).unwrap_err().kind(), ErrorKind::RateLimited);
    }

    #[test]
    fn window_expiry_resets_budget() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        limiter.check(1).unwrap();
        assert!(limiter.check(1).is_err());
        std::thread::sleep(Duration::from_millis(15));
        assert!(limiter.check(1).is_ok());
    }

    #[test]
    fn zero_budget_disables_limiting() {
        let limiter = RateLimiter::disabled();
        for _ in 0..1000 {
            assert!(limiter.check(1).is_ok());
        }
    }
}
