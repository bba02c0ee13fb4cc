//! Household settings record and its repository
//!
//! The credential and lockout state live in the settings record. The
//! authenticator is handed a [`SettingsRepository`] explicitly; nothing
//! reads settings from ambient state.

use crate::{config::SettingsDefaults, pin::PinHashRecord, Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use storage::{keys, Document, KeyValueStore};

/// Max PIN hint length
pub const MAX_PIN_HINT_LEN: usize = 100;

/// Max auto-lock timeout in minutes
pub const MAX_LOCK_TIMEOUT_MINUTES: u32 = 1440;

/// Household settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// ISO 4217 currency code
    pub currency: String,

    /// BCP 47 locale
    pub locale: String,

    /// Base64 PBKDF2 hash, `None` until a PIN is set up
    pub pin_hash: Option<String>,

    /// Base64 salt
    pub pin_salt: Option<String>,

    /// Optional hint (max 100 chars)
    pub pin_hint: Option<String>,

    /// Auto-lock timeout in minutes (0 = lock until PIN entry)
    #[serde(rename = "lockTimeout")]
    pub lock_timeout_minutes: u32,

    /// Consecutive failed PIN attempts
    pub failed_attempts: u32,

    /// Lockout expiry
    pub locked_until: Option<DateTime<Utc>>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    /// Fresh settings without a PIN
    pub fn new(defaults: &SettingsDefaults, now: DateTime<Utc>) -> Self {
        Self {
            currency: defaults.currency.clone(),
            locale: defaults.locale.clone(),
            pin_hash: None,
            pin_salt: None,
            pin_hint: None,
            lock_timeout_minutes: defaults.lock_timeout_minutes,
            failed_attempts: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stored credential, if a PIN has been set up
    pub fn credential(&self) -> Option<PinHashRecord> {
        match (&self.pin_hash, &self.pin_salt) {
            (Some(hash), Some(salt)) if !hash.is_empty() && !salt.is_empty() => {
                Some(PinHashRecord::new(hash.clone(), salt.clone()))
            }
            _ => None,
        }
    }

    /// Replace the credential and clear attempt tracking
    pub fn set_credential(&mut self, record: PinHashRecord, hint: Option<String>) {
        self.pin_hash = Some(record.hash);
        self.pin_salt = Some(record.salt);
        if hint.is_some() {
            self.pin_hint = hint;
        }
        self.failed_attempts = 0;
        self.locked_until = None;
    }

    /// Whether a lockout is in force at `now`
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.map_or(false, |until| until > now)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("currency", &self.currency)
            .field("locale", &self.locale)
            .field("pin_configured", &self.credential().is_some())
            .field("lock_timeout_minutes", &self.lock_timeout_minutes)
            .field("failed_attempts", &self.failed_attempts)
            .field("locked_until", &self.locked_until)
            .finish_non_exhaustive()
    }
}

/// Validate a PIN hint
pub fn validate_hint(hint: Option<&str>) -> Result<()> {
    match hint {
        Some(hint) if hint.chars().count() > MAX_PIN_HINT_LEN => Err(Error::Validation {
            field: "pinHint",
            message: format!("must be at most {} characters", MAX_PIN_HINT_LEN),
        }),
        _ => Ok(()),
    }
}

/// Validate an auto-lock timeout
pub fn validate_lock_timeout(minutes: u32) -> Result<()> {
    if minutes > MAX_LOCK_TIMEOUT_MINUTES {
        return Err(Error::Validation {
            field: "lockTimeout",
            message: format!("must be 0-{} minutes", MAX_LOCK_TIMEOUT_MINUTES),
        });
    }
    Ok(())
}

/// Settings persistence
pub trait SettingsRepository: Send + Sync {
    /// Load the settings record, if any
    fn load(&self) -> Result<Option<Settings>>;

    /// Store the settings record
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Settings stored under the household settings key
#[derive(Debug, Clone)]
pub struct StoredSettings {
    document: Document<Settings>,
}

impl StoredSettings {
    /// Create repository over a store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            document: Document::new(store, keys::SETTINGS),
        }
    }
}

impl SettingsRepository for StoredSettings {
    fn load(&self) -> Result<Option<Settings>> {
        Ok(self.document.load()?)
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        Ok(self.document.save(settings)?)
    }
}
