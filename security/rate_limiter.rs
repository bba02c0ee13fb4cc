//! Failed-attempt tracking and lockout
//!
//! Pure state transitions over the settings record; callers persist the
//! record afterwards. Time is passed in so transitions are reproducible.
//!
//! # Policy
//!
//! - While `locked_until` is in the future every attempt is refused before
//!   any hash comparison and without counting as an attempt
//! - A match resets the failure count and clears the lock
//! - A miss increments the count; reaching the threshold locks for a fixed
//!   period
//! - Each miss reports an advisory delay `min(2^attempts * base, cap)` for
//!   the caller to enforce; the limiter itself never sleeps

use crate::{config::RateLimiterConfig, settings::Settings};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Outcome of one verification attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum VerifyOutcome {
    /// PIN matched
    Accepted,

    /// PIN did not match
    #[serde(rename_all = "camelCase")]
    Rejected {
        /// Consecutive failures including this one
        failed_attempts: u32,
        /// Advisory wait before the next attempt
        delay: std::time::Duration,
        /// Set when this failure triggered a lockout
        locked_until: Option<DateTime<Utc>>,
    },

    /// Refused without checking the PIN
    #[serde(rename_all = "camelCase")]
    Locked {
        /// Lock expiry
        locked_until: DateTime<Utc>,
        /// Time left on the lock
        #[serde(skip)]
        remaining: Duration,
    },
}

impl VerifyOutcome {
    /// Whether the attempt was accepted
    pub fn is_accepted(&self) -> bool {
        matches!(self, VerifyOutcome::Accepted)
    }
}

/// Current lock state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockStatus {
    /// Lock in force
    pub locked: bool,
    /// Lock expiry when locked
    pub locked_until: Option<DateTime<Utc>>,
    /// Consecutive failed attempts
    pub failed_attempts: u32,
}

/// PIN attempt rate limiter
#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
    config: RateLimiterConfig,
}

impl RateLimiter {
    /// Create new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self { config }
    }

    /// Active lock at `now`, if any
    pub fn check_lock(&self, settings: &Settings, now: DateTime<Utc>) -> Option<VerifyOutcome> {
        settings
            .locked_until
            .filter(|until| *until > now)
            .map(|locked_until| VerifyOutcome::Locked {
                locked_until,
                remaining: locked_until - now,
            })
    }

    /// Record a matching PIN
    pub fn record_success(&self, settings: &mut Settings, now: DateTime<Utc>) -> VerifyOutcome {
        settings.failed_attempts = 0;
        settings.locked_until = None;
        settings.updated_at = now;
        VerifyOutcome::Accepted
    }

    /// Record a wrong PIN, locking once the threshold is reached
    pub fn record_failure(&self, settings: &mut Settings, now: DateTime<Utc>) -> VerifyOutcome {
        settings.failed_attempts = settings.failed_attempts.saturating_add(1);
        settings.updated_at = now;

        let mut locked_until = None;
        if settings.failed_attempts >= self.config.max_failed_attempts {
            let until = now + Duration::minutes(self.config.lockout_minutes);
            settings.locked_until = Some(until);
            locked_until = Some(until);
        }

        VerifyOutcome::Rejected {
            failed_attempts: settings.failed_attempts,
            delay: self.progressive_delay(settings.failed_attempts),
            locked_until,
        }
    }

    /// Advisory delay after `attempts` consecutive failures
    pub fn progressive_delay(&self, attempts: u32) -> std::time::Duration {
        let ms = 2u64
            .saturating_pow(attempts)
            .saturating_mul(self.config.base_delay_ms)
            .min(self.config.max_delay_ms);
        std::time::Duration::from_millis(ms)
    }

    /// Lock immediately for the configured timeout, or indefinitely when the
    /// timeout is zero
    pub fn lock_now(&self, settings: &mut Settings, now: DateTime<Utc>) -> DateTime<Utc> {
        let length = match settings.lock_timeout_minutes {
            0 => Duration::days(self.config.indefinite_lock_days),
            minutes => Duration::minutes(i64::from(minutes)),
        };
        let until = now + length;
        settings.locked_until = Some(until);
        settings.updated_at = now;
        until
    }

    /// Lock state at `now`
    pub fn status(&self, settings: Option<&Settings>, now: DateTime<Utc>) -> LockStatus {
        match settings {
            Some(settings) => {
                let locked = settings.is_locked_at(now);
                LockStatus {
                    locked,
                    locked_until: if locked { settings.locked_until } else { None },
                    failed_attempts: settings.failed_attempts,
                }
            }
            None => LockStatus {
                locked: false,
                locked_until: None,
                failed_attempts: 0,
            },
        }
    }
}
