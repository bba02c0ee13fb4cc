//! PIN hashing with PBKDF2-HMAC-SHA256
//!
//! Parameters are fixed: 100,000 iterations, 32-byte key, 16-byte random
//! salt. Salt and hash are stored as standard base64.

use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;

/// Key derivation algorithm name stored in the record
pub const ALGORITHM: &str = "PBKDF2";

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Derived key length in bytes
pub const KEY_LENGTH: usize = 32;

/// Salt length in bytes
pub const SALT_LENGTH: usize = 16;

/// Salted PIN hash
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinHashRecord {
    /// Always `"PBKDF2"`
    pub algorithm: String,
    /// Iteration count
    pub iterations: u32,
    /// Base64 salt
    pub salt: String,
    /// Base64 derived key
    pub hash: String,
    /// Derived key length in bytes
    pub key_length: usize,
}

impl PinHashRecord {
    /// Record for a stored hash and salt with the fixed parameters
    pub fn new(hash: impl Into<String>, salt: impl Into<String>) -> Self {
        Self {
            algorithm: ALGORITHM.to_string(),
            iterations: PBKDF2_ITERATIONS,
            salt: salt.into(),
            hash: hash.into(),
            key_length: KEY_LENGTH,
        }
    }
}

impl fmt::Debug for PinHashRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinHashRecord")
            .field("algorithm", &self.algorithm)
            .field("iterations", &self.iterations)
            .field("key_length", &self.key_length)
            .finish_non_exhaustive()
    }
}

/// Check the PIN is 4-6 ASCII digits
pub fn validate_pin_format(pin: &str) -> Result<()> {
    if (4..=6).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(Error::InvalidPinFormat)
    }
}

/// Fresh random salt, base64 encoded
pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    STANDARD.encode(salt)
}

/// Hash a PIN, generating a salt unless one is given
pub fn hash_pin(pin: &str, salt: Option<&str>) -> Result<PinHashRecord> {
    let salt = match salt {
        Some(salt) => salt.to_string(),
        None => generate_salt(),
    };
    let derived = derive_key(pin, &decode("salt", &salt)?);

    Ok(PinHashRecord::new(STANDARD.encode(derived), salt))
}

/// Check a PIN against a stored record
pub fn verify_pin(pin: &str, record: &PinHashRecord) -> Result<bool> {
    if record.algorithm != ALGORITHM
        || record.iterations != PBKDF2_ITERATIONS
        || record.key_length != KEY_LENGTH
    {
        return Err(Error::InvalidRecord(format!(
            "unsupported parameters {} x{} ({} bytes)",
            record.algorithm, record.iterations, record.key_length
        )));
    }

    let derived = derive_key(pin, &decode("salt", &record.salt)?);
    let expected = decode("hash", &record.hash)?;

    Ok(constant_time_eq(&derived, &expected))
}

/// Byte comparison that does not stop at the first difference
///
/// Unequal lengths never match.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn derive_key(pin: &str, salt: &[u8]) -> [u8; KEY_LENGTH] {
    let mut key = [0u8; KEY_LENGTH];
    pbkdf2::pbkdf2_hmac::<Sha256>(pin.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}

fn decode(field: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| Error::InvalidRecord(format!("{} is not base64: {}", field, e)))
}
