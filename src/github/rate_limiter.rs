use reqwest::Response;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

use crate::error::{Error, Result};

/// Client-side pacing for the GitHub API.
///
/// Tracks the server's `x-ratelimit-*` headers and applies a soft
/// requests-per-minute cap on top. An exhausted primary quota is surfaced as
/// `Error::RateLimited` with the seconds until reset; the caller decides when
/// to come back, we never sleep until the server-side window reopens.
pub struct RateLimiter {
    state: Mutex<LimiterState>,
}

struct LimiterState {
    remaining: u32,
    reset_in: Option<(Instant, u64)>,
    requests_this_minute: u32,
    minute_start: Instant,
}

const SOFT_REQUESTS_PER_MINUTE: u32 = 30;

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LimiterState {
                remaining: 60,
                reset_in: None,
                requests_this_minute: 0,
                minute_start: Instant::now(),
            }),
        }
    }

    /// Called before each request. Errors if the server-side quota is
    /// exhausted, otherwise paces to the soft per-minute cap.
    pub async fn acquire(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        if state.remaining == 0 {
            if let Some((observed_at, reset_secs)) = state.reset_in {
                let elapsed = observed_at.elapsed().as_secs();
                if elapsed < reset_secs {
                    return Err(Error::RateLimited(reset_secs - elapsed));
                }
                // Window has passed since we last heard from the server.
                state.remaining = 1;
                state.reset_in = None;
            }
        }

        let minute_elapsed = state.minute_start.elapsed();
        if minute_elapsed >= Duration::from_secs(60) {
            state.requests_this_minute = 0;
            state.minute_start = Instant::now();
        } else if state.requests_this_minute >= SOFT_REQUESTS_PER_MINUTE {
            let wait = Duration::from_secs(60) - minute_elapsed;
            drop(state);
            tracing::debug!("Soft rate limiting, waiting {:?}", wait);
            sleep(wait).await;
            state = self.state.lock().await;
            state.requests_this_minute = 0;
            state.minute_start = Instant::now();
        }

        state.requests_this_minute += 1;
        Ok(())
    }

    /// Records the rate-limit headers from a response.
    pub async fn observe(&self, response: &Response) {
        let remaining = header_u64(response, "x-ratelimit-remaining");
        let reset = header_u64(response, "x-ratelimit-reset");

        if let Some(remaining) = remaining {
            let mut state = self.state.lock().await;
            state.remaining = remaining as u32;
            if let Some(reset_timestamp) = reset {
                let now = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                if reset_timestamp > now {
                    state.reset_in = Some((Instant::now(), reset_timestamp - now));
                }
            }
        }
    }

    pub async fn remaining(&self) -> u32 {
        self.state.lock().await.remaining
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn header_u64(response: &Response, name: &str) -> Option<u64> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
