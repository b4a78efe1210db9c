use log::{debug, warn};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

// Pauses at or above this many seconds are logged at warn instead of debug.
const SLEEP_WARN_THRESHOLD_SECS: f64 = 5.0;
// Streak length at which the missing-header diagnostic starts firing.
const MISSING_HEADER_WARN_STREAK: u32 = 10;

/// Read-only copy of the limiter state for UI/telemetry display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimitSnapshot {
    pub used: Option<i64>,
    pub remaining: Option<i64>,
    pub reset_seconds: Option<i64>,
    pub last_header_time: Option<SystemTime>,
    pub missing_header_count: u32,
}

/// Dynamically throttles API requests based on `x-ratelimit-*` response
/// headers, pacing outbound calls to stay inside the server-reported quota.
///
/// Until the first successful header parse the limiter paces at a fixed
/// fallback rate; once calibrated it keeps operating on the last-known quota
/// values even if later responses stop carrying headers.
///
/// Not internally synchronized. Callers sharing one instance across threads
/// must serialize each `update_from_headers`/`sleep` pair behind their own
/// mutex; within a single-threaded async task no locking is needed.
pub struct RateLimiter {
    safe_margin: f64,
    min_rps_threshold: f64,
    fallback_max_rpm: u32,
    used: Option<i64>,
    remaining: Option<i64>,
    reset_seconds: Option<i64>,
    last_header_time: Option<SystemTime>,
    missing_header_count: u32,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(0.8, 1.0, 60)
    }
}

impl RateLimiter {
    /// Create a limiter. Out-of-range settings are clamped, never rejected:
    /// `safe_margin` into [0.1, 0.95], `min_rps_threshold` to at least 0.1,
    /// `fallback_max_rpm` to at least 1.
    pub fn new(safe_margin: f64, min_rps_threshold: f64, fallback_max_rpm: u32) -> Self {
        Self {
            safe_margin: safe_margin.clamp(0.1, 0.95),
            min_rps_threshold: min_rps_threshold.max(0.1),
            fallback_max_rpm: fallback_max_rpm.max(1),
            used: None,
            remaining: None,
            reset_seconds: None,
            last_header_time: None,
            missing_header_count: 0,
        }
    }

    /// Absorb quota headers from a completed response.
    ///
    /// Never fails: when any of the three headers is absent or non-integer,
    /// the previously stored values stay in place and the missing-header
    /// streak is bumped.
    pub fn update_from_headers(&mut self, headers: &HeaderMap) {
        match parse_quota_headers(headers) {
            Some((used, remaining, reset_seconds)) => {
                self.used = Some(used);
                self.remaining = Some(remaining);
                self.reset_seconds = Some(reset_seconds);
                self.missing_header_count = 0;
                self.last_header_time = Some(SystemTime::now());
                debug!(
                    "rate limit update: {}/{} requests remaining (resets in {}s)",
                    remaining,
                    used + remaining,
                    reset_seconds
                );
            }
            None => {
                self.missing_header_count += 1;
                if self.missing_header_count >= MISSING_HEADER_WARN_STREAK {
                    warn!(
                        "missing rate limit headers for {} consecutive responses, using fallback limit of {} req/min",
                        self.missing_header_count, self.fallback_max_rpm
                    );
                }
            }
        }
    }

    /// Block the current thread until the next request may be issued.
    pub fn sleep(&self) {
        let (delay, reason) = self.compute_delay();
        if delay > Duration::ZERO {
            log_pause("sleep", delay, &reason);
            std::thread::sleep(delay);
        }
    }

    /// Async variant of [`RateLimiter::sleep`]: suspends only the calling
    /// task, leaving the rest of the runtime free to make progress.
    pub async fn wait(&self) {
        let (delay, reason) = self.compute_delay();
        if delay > Duration::ZERO {
            log_pause("wait", delay, &reason);
            tokio::time::sleep(delay).await;
        }
    }

    /// Current state for display; repeated calls without an intervening
    /// update return identical values.
    pub fn snapshot(&self) -> RateLimitSnapshot {
        RateLimitSnapshot {
            used: self.used,
            remaining: self.remaining,
            reset_seconds: self.reset_seconds,
            last_header_time: self.last_header_time,
            missing_header_count: self.missing_header_count,
        }
    }

    // Decide how long the next request must be delayed, with a reason for
    // the pacing logs. Reads state only; checks run in priority order, so an
    // imminent window reset short-circuits the exhaustion branch below it.
    fn compute_delay(&self) -> (Duration, String) {
        let (remaining, reset_seconds) = match (self.remaining, self.reset_seconds) {
            (Some(remaining), Some(reset)) => (remaining, reset),
            _ => {
                let secs = 60.0 / f64::from(self.fallback_max_rpm);
                return (Duration::from_secs_f64(secs), "fallback rate limiting".into());
            }
        };

        if reset_seconds < 2 {
            return (Duration::ZERO, "reset window expiring".into());
        }

        if remaining as f64 > reset_seconds as f64 * self.min_rps_threshold * 1.5 {
            return (Duration::ZERO, "sufficient request allowance".into());
        }

        if remaining > 0 && reset_seconds > 0 {
            let safe_rps = remaining as f64 / reset_seconds as f64 * self.safe_margin;
            if safe_rps < self.min_rps_threshold {
                let secs = if safe_rps > 0.0 {
                    1.0 / safe_rps
                } else {
                    reset_seconds as f64
                };
                // Never sleep past the reset itself.
                let secs = secs.min(reset_seconds as f64);
                return (
                    Duration::from_secs_f64(secs),
                    format!("throttling to {:.2} req/sec", safe_rps),
                );
            }
        }

        if remaining <= 2 {
            let secs = (reset_seconds - 1).max(1);
            return (
                Duration::from_secs(secs as u64),
                "waiting for rate limit reset".into(),
            );
        }

        (Duration::ZERO, "no throttling needed".into())
    }
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok())
}

// All three values must come from the same response; partial data is
// discarded rather than mixed with an older snapshot.
fn parse_quota_headers(headers: &HeaderMap) -> Option<(i64, i64, i64)> {
    let used = header_i64(headers, "x-ratelimit-used")?;
    let remaining = header_i64(headers, "x-ratelimit-remaining")?;
    let reset_seconds = header_i64(headers, "x-ratelimit-reset")?;
    Some((used, remaining, reset_seconds))
}

fn log_pause(kind: &str, delay: Duration, reason: &str) {
    let secs = delay.as_secs_f64();
    if secs >= SLEEP_WARN_THRESHOLD_SECS {
        warn!("rate limit {}: {:.1}s ({})", kind, secs, reason);
    } else {
        debug!("rate limit {}: {:.1}s ({})", kind, secs, reason);
    }
}
