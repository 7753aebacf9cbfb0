//! Retry primitives: jittered exponential backoff, the per-call attempt state,
//! and classification of responses into success, retriable and permanent
//! outcomes.

use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;

use crate::error::{Error, Result};

/// HTTP statuses that are always retried until the deadline.
pub const RETRIABLE_STATUSES: [u16; 3] = [500, 503, 504];

/// API status reported when the caller's quota is exhausted.
pub const OVER_QUERY_LIMIT: &str = "OVER_QUERY_LIMIT";

/// Default overall retry deadline.
pub const DEFAULT_RETRY_TIMEOUT: Duration = Duration::from_secs(60);

/// Exponential backoff with multiplicative jitter.
///
/// Attempt `i` (the first attempt is `0` and never waits) sleeps
/// `initial * multiplier^(i-1)` scaled by a uniform factor drawn from
/// `jitter_min..jitter_max`.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    pub initial: Duration,
    pub multiplier: f64,
    pub jitter_min: f64,
    pub jitter_max: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            multiplier: 1.5,
            jitter_min: 0.5,
            jitter_max: 1.5,
        }
    }
}

impl Backoff {
    /// Delay before `attempt` without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        self.initial.mul_f64(self.multiplier.powi(exponent))
    }

    /// Jittered delay before `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if base.is_zero() || self.jitter_min >= self.jitter_max {
            return base;
        }
        let factor = rand::thread_rng().gen_range(self.jitter_min..self.jitter_max);
        base.mul_f64(factor)
    }
}

/// State of one logical request across its retries.
#[derive(Debug, Clone)]
pub struct RequestAttempt {
    pub path: String,
    first_attempt: Instant,
    attempt: u32,
}

impl RequestAttempt {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            first_attempt: Instant::now(),
            attempt: 0,
        }
    }

    /// Zero-based retry counter.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Wall-clock time since the first attempt started.
    pub fn elapsed(&self) -> Duration {
        self.first_attempt.elapsed()
    }

    /// Fails with [`Error::Timeout`] once `deadline` has passed.
    pub fn check_deadline(&self, deadline: Duration) -> Result<()> {
        if self.elapsed() > deadline {
            return Err(Error::Timeout);
        }
        Ok(())
    }

    /// Backoff delay for the current attempt, clamped so it never sleeps past
    /// the deadline.
    pub fn delay(&self, backoff: &Backoff, deadline: Duration) -> Duration {
        backoff
            .delay(self.attempt)
            .min(deadline.saturating_sub(self.elapsed()))
    }

    pub fn next(&mut self) {
        self.attempt += 1;
    }
}

/// Outcome of inspecting one HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Success(Value),
    ZeroResults(Value),
    RetriableOverLimit { message: Option<String> },
    RetriableHttpStatus(u16),
    PermanentApiError { status: String, message: Option<String> },
    PermanentHttpError(u16),
}

#[derive(Deserialize)]
struct StatusEnvelope {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

/// Classifies a raw response.
///
/// Retriable HTTP statuses are reported without looking at the body. Any other
/// non-200 status is permanent. A 200 body must be JSON with a `status` field.
pub fn classify(status: StatusCode, body: &[u8]) -> Result<Classified> {
    let code = status.as_u16();
    if RETRIABLE_STATUSES.contains(&code) {
        return Ok(Classified::RetriableHttpStatus(code));
    }
    if status != StatusCode::OK {
        return Ok(Classified::PermanentHttpError(code));
    }

    let body: Value = serde_json::from_slice(body)
        .map_err(|e| Error::Parse(format!("response body is not valid JSON: {}", e)))?;
    let envelope = StatusEnvelope::deserialize(&body)
        .map_err(|e| Error::Parse(format!("response has no usable status field: {}", e)))?;

    Ok(match envelope.status.as_str() {
        "OK" => Classified::Success(body),
        "ZERO_RESULTS" => Classified::ZeroResults(body),
        OVER_QUERY_LIMIT => Classified::RetriableOverLimit {
            message: envelope.error_message,
        },
        _ => Classified::PermanentApiError {
            status: envelope.status,
            message: envelope.error_message,
        },
    })
}
