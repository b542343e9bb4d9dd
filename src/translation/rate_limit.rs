/*!
 * Request rate limiting for translation entry points.
 *
 * Limiting is optional; an orchestrator without a limiter accepts every
 * request. `FixedWindowRateLimiter` counts requests in consecutive windows
 * of fixed length and refuses once the budget of the window is spent.
 */

use log::warn;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::time::{Duration, Instant};

use crate::errors::TranslationError;

/// Gate consulted once per translation request
pub trait RateLimiter: Send + Sync + Debug {
    /// Admit one request or report how long to wait
    fn check(&self) -> Result<(), TranslationError>;
}

#[derive(Debug)]
struct Window {
    started: Instant,
    used: u32,
}

/// Fixed-window limiter: at most `max_requests` per `window`
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<Window>,
}

impl FixedWindowRateLimiter {
    /// Create a limiter; a zero budget refuses everything
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Mutex::new(Window {
                started: Instant::now(),
                used: 0,
            }),
        }
    }

    /// Limiter with a per-minute budget
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Requests still available in the current window
    pub fn remaining(&self) -> u32 {
        let state = self.state.lock();
        if state.started.elapsed() >= self.window {
            self.max_requests
        } else {
            self.max_requests.saturating_sub(state.used)
        }
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check(&self) -> Result<(), TranslationError> {
        let mut state = self.state.lock();
        let elapsed = state.started.elapsed();

        if elapsed >= self.window {
            state.started = Instant::now();
            state.used = 0;
        }

        if state.used < self.max_requests {
            state.used += 1;
            return Ok(());
        }

        let wait = self.window.saturating_sub(state.started.elapsed());
        // round up so callers never retry inside the same window
        let retry_after_secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
        warn!(
            "Rate limit reached ({} per {:?}), retry in {} s",
            self.max_requests, self.window, retry_after_secs
        );

        Err(TranslationError::RateLimited { retry_after_secs })
    }
}
