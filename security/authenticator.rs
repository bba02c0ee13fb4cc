//! PIN authentication workflows
//!
//! Ties together PIN hashing, the rate limiter and the settings repository.
//! PBKDF2 derivation runs on the blocking pool; attempts are serialised so
//! two concurrent verifications can't both read the same failure count.

use crate::{
    config::Config,
    pin::{self, PinHashRecord},
    rate_limiter::{LockStatus, RateLimiter, VerifyOutcome},
    settings::{validate_hint, validate_lock_timeout, Settings, SettingsRepository},
    Error, Result,
};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// PIN authenticator
pub struct PinAuthenticator {
    repository: Arc<dyn SettingsRepository>,
    limiter: RateLimiter,
    config: Config,
    gate: Mutex<()>,
}

impl fmt::Debug for PinAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinAuthenticator")
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

impl PinAuthenticator {
    /// Create authenticator over a settings repository
    pub fn new(repository: Arc<dyn SettingsRepository>, config: Config) -> Self {
        Self {
            repository,
            limiter: RateLimiter::new(config.rate_limiter.clone()),
            config,
            gate: Mutex::new(()),
        }
    }

    /// Set the first PIN; fails if one is already configured
    pub async fn setup_pin(&self, pin: &str, hint: Option<String>) -> Result<()> {
        pin::validate_pin_format(pin)?;
        validate_hint(hint.as_deref())?;

        let _gate = self.gate.lock().await;
        let now = Utc::now();
        let mut settings = self
            .repository
            .load()?
            .unwrap_or_else(|| Settings::new(&self.config.defaults, now));
        if settings.credential().is_some() {
            return Err(Error::AlreadyConfigured);
        }

        let record = hash_blocking(pin).await?;
        settings.set_credential(record, hint);
        settings.updated_at = now;
        self.repository.save(&settings)?;

        info!("PIN configured");
        Ok(())
    }

    /// Verify a PIN now
    pub async fn verify(&self, pin: &str) -> Result<VerifyOutcome> {
        self.verify_at(pin, Utc::now()).await
    }

    /// Verify a PIN as of `now`
    ///
    /// Format errors and a missing credential are errors; a wrong PIN or an
    /// active lock is an outcome.
    pub async fn verify_at(&self, pin: &str, now: DateTime<Utc>) -> Result<VerifyOutcome> {
        pin::validate_pin_format(pin)?;

        let _gate = self.gate.lock().await;
        let mut settings = self.repository.load()?.ok_or(Error::NotConfigured)?;
        let record = settings.credential().ok_or(Error::NotConfigured)?;

        if let Some(locked) = self.limiter.check_lock(&settings, now) {
            warn!(failed_attempts = settings.failed_attempts, "PIN attempt while locked");
            return Ok(locked);
        }

        let outcome = if verify_blocking(pin, record).await? {
            self.limiter.record_success(&mut settings, now)
        } else {
            self.limiter.record_failure(&mut settings, now)
        };
        self.repository.save(&settings)?;

        match &outcome {
            VerifyOutcome::Accepted => info!("PIN accepted"),
            VerifyOutcome::Rejected {
                failed_attempts,
                locked_until: Some(until),
                ..
            } => warn!(failed_attempts, locked_until = %until, "PIN rejected, locked out"),
            VerifyOutcome::Rejected { failed_attempts, .. } => {
                warn!(failed_attempts, "PIN rejected")
            }
            VerifyOutcome::Locked { .. } => {}
        }
        Ok(outcome)
    }

    /// Replace the PIN after checking the current one
    ///
    /// Refused while locked. A wrong current PIN does not count as a failed
    /// attempt. On success the attempt counters are reset.
    pub async fn change_pin(
        &self,
        current_pin: &str,
        new_pin: &str,
        hint: Option<String>,
    ) -> Result<()> {
        pin::validate_pin_format(current_pin)?;
        pin::validate_pin_format(new_pin)?;
        validate_hint(hint.as_deref())?;

        let _gate = self.gate.lock().await;
        let now = Utc::now();
        let mut settings = self.repository.load()?.ok_or(Error::NotConfigured)?;
        let record = settings.credential().ok_or(Error::NotConfigured)?;

        if let Some(locked_until) = settings.locked_until.filter(|until| *until > now) {
            return Err(Error::Locked { locked_until });
        }
        if !verify_blocking(current_pin, record).await? {
            warn!("PIN change refused, current PIN incorrect");
            return Err(Error::IncorrectPin);
        }

        let record = hash_blocking(new_pin).await?;
        settings.set_credential(record, hint);
        settings.updated_at = now;
        self.repository.save(&settings)?;

        info!("PIN changed");
        Ok(())
    }

    /// Lock immediately
    pub async fn lock_now(&self) -> Result<DateTime<Utc>> {
        let _gate = self.gate.lock().await;
        let mut settings = self.repository.load()?.ok_or(Error::NotConfigured)?;

        let until = self.limiter.lock_now(&mut settings, Utc::now());
        self.repository.save(&settings)?;

        info!(locked_until = %until, "Locked");
        Ok(until)
    }

    /// Current lock state
    pub async fn lock_status(&self) -> Result<LockStatus> {
        let settings = self.repository.load()?;
        Ok(self.limiter.status(settings.as_ref(), Utc::now()))
    }

    /// Change the auto-lock timeout (0-1440 minutes, 0 = lock until PIN entry)
    pub async fn set_lock_timeout(&self, minutes: u32) -> Result<()> {
        validate_lock_timeout(minutes)?;

        let _gate = self.gate.lock().await;
        let mut settings = self.repository.load()?.ok_or(Error::NotConfigured)?;
        settings.lock_timeout_minutes = minutes;
        settings.updated_at = Utc::now();
        self.repository.save(&settings)?;
        Ok(())
    }

    /// Stored PIN hint
    pub async fn pin_hint(&self) -> Result<Option<String>> {
        Ok(self.repository.load()?.and_then(|s| s.pin_hint))
    }
}

async fn hash_blocking(pin: &str) -> Result<PinHashRecord> {
    let pin = pin.to_string();
    tokio::task::spawn_blocking(move || pin::hash_pin(&pin, None))
        .await
        .map_err(|e| Error::Task(e.to_string()))?
}

async fn verify_blocking(pin: &str, record: PinHashRecord) -> Result<bool> {
    let pin = pin.to_string();
    tokio::task::spawn_blocking(move || pin::verify_pin(&pin, &record))
        .await
        .map_err(|e| Error::Task(e.to_string()))?
}
