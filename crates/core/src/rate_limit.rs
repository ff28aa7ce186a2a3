//! Sliding-window rate-limit policy and decision math.
//!
//! The counting itself happens in the store; this module turns a
//! "requests already in the window" count into an admit/deny decision with
//! quota metadata.

use std::str::FromStr;

use serde::Serialize;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Longest window a parsed policy may use (30 days).
pub const MAX_WINDOW_SECS: u64 = 30 * 24 * 3600;

/// How many requests are allowed per sliding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u64,
    pub window_secs: u64,
}

impl RateLimitPolicy {
    pub const fn new(max_requests: u64, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }

    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.window_secs as i64)
    }
}

/// Parses `"<max_requests>/<window_secs>"`, e.g. `"20/3600"`.
impl FromStr for RateLimitPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (max, window) = s.split_once('/').ok_or_else(|| {
            CoreError::Configuration(format!(
                "rate limit '{s}' must have the form <max_requests>/<window_secs>"
            ))
        })?;

        let max_requests: u64 = max.trim().parse().map_err(|_| {
            CoreError::Configuration(format!("invalid max_requests in rate limit '{s}'"))
        })?;
        let window_secs: u64 = window.trim().parse().map_err(|_| {
            CoreError::Configuration(format!("invalid window_secs in rate limit '{s}'"))
        })?;

        if window_secs == 0 {
            return Err(CoreError::Configuration(format!(
                "rate limit '{s}' must have a non-zero window"
            )));
        }
        if window_secs > MAX_WINDOW_SECS {
            return Err(CoreError::Configuration(format!(
                "rate limit '{s}' has a window above the {MAX_WINDOW_SECS}s maximum"
            )));
        }

        Ok(Self::new(max_requests, window_secs))
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Quota metadata returned with every decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitQuota {
    pub limit: u64,
    pub remaining: u64,
    /// Unix seconds. An upper bound: `now + window`, not the moment the
    /// oldest entry leaves the window.
    pub reset_time: i64,
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub quota: RateLimitQuota,
}

impl RateLimitDecision {
    /// Derive the decision from the number of requests already inside the
    /// window, before the current one was considered.
    pub fn from_count(count_before: u64, policy: RateLimitPolicy, now: Timestamp) -> Self {
        let allowed = count_before < policy.max_requests;
        let consumed = count_before + u64::from(allowed);
        Self {
            allowed,
            quota: RateLimitQuota {
                limit: policy.max_requests,
                remaining: policy.max_requests.saturating_sub(consumed),
                reset_time: now.timestamp() + policy.window_secs as i64,
                window_seconds: policy.window_secs,
            },
        }
    }
}
