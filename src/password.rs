//! Salted password hashes in the `algorithm$salt$hexdigest` format.
//!
//! Supported algorithms are `hmac-sha256` (the default, keyed by the salt),
//! `sha256` and `sha512` (digest of salt followed by the password). Older
//! `sha1` hashes, digested the same way, can be checked but not created.

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use thiserror::Error;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Number of hex characters in a generated salt.
const SALT_LENGTH: usize = 12;

/// Longest encoded hash, for sizing the column.
pub const MAX_LENGTH: usize = 160;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Unknown hash algorithm {0}")]
    UnknownAlgorithm(String),
    #[error("Password hash must have the form algorithm$salt$hash")]
    Malformed,
    #[error("Hash algorithm {0} can only check existing passwords")]
    VerifyOnly(Algorithm),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Algorithm {
    #[default]
    HmacSha256,
    Sha256,
    Sha512,
    Sha1,
}

impl Algorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::HmacSha256 => "hmac-sha256",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha512 => "sha512",
            Algorithm::Sha1 => "sha1",
        }
    }

    /// Whether new hashes may be made with this algorithm.
    pub fn is_verify_only(self) -> bool {
        self == Algorithm::Sha1
    }

    fn digest(self, salt: &str, raw_password: &str) -> Vec<u8> {
        match self {
            Algorithm::HmacSha256 => {
                let mut mac = HmacSha256::new_from_slice(salt.as_bytes())
                    .expect("HMAC accepts keys of any length");
                mac.update(raw_password.as_bytes());
                mac.finalize().into_bytes().to_vec()
            }
            Algorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(salt.as_bytes());
                hasher.update(raw_password.as_bytes());
                hasher.finalize().to_vec()
            }
            Algorithm::Sha512 => {
                let mut hasher = Sha512::new();
                hasher.update(salt.as_bytes());
                hasher.update(raw_password.as_bytes());
                hasher.finalize().to_vec()
            }
            Algorithm::Sha1 => {
                let mut hasher = Sha1::new();
                hasher.update(salt.as_bytes());
                hasher.update(raw_password.as_bytes());
                hasher.finalize().to_vec()
            }
        }
    }
}

impl FromStr for Algorithm {
    type Err = PasswordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hmac-sha256" => Ok(Algorithm::HmacSha256),
            "sha256" => Ok(Algorithm::Sha256),
            "sha512" => Ok(Algorithm::Sha512),
            "sha1" => Ok(Algorithm::Sha1),
            other => Err(PasswordError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn random_salt() -> String {
    let bytes: [u8; SALT_LENGTH / 2] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Hashes `raw_password` with a fresh random salt and the default algorithm.
pub fn make_password(raw_password: &str) -> String {
    hash_with_salt(Algorithm::default(), &random_salt(), raw_password)
}

/// Hashes `raw_password` with a fresh random salt. Fails for algorithms that
/// are only kept for checking old hashes.
pub fn make_password_with(
    algorithm: Algorithm,
    raw_password: &str,
) -> Result<String, PasswordError> {
    if algorithm.is_verify_only() {
        return Err(PasswordError::VerifyOnly(algorithm));
    }
    Ok(hash_with_salt(algorithm, &random_salt(), raw_password))
}

fn hash_with_salt(algorithm: Algorithm, salt: &str, raw_password: &str) -> String {
    let digest = algorithm.digest(salt, raw_password);
    format!("{}${}${}", algorithm, salt, hex::encode(digest))
}

/// Splits an encoded hash into its parts.
pub fn split_encoded(encoded: &str) -> Result<(Algorithm, &str, &str), PasswordError> {
    let mut parts = encoded.splitn(3, '$');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(algorithm), Some(salt), Some(hash)) => Ok((algorithm.parse()?, salt, hash)),
        _ => Err(PasswordError::Malformed),
    }
}

/// Checks `raw_password` against an encoded hash. Malformed hashes never match.
pub fn check_password(raw_password: &str, encoded: &str) -> bool {
    let (algorithm, salt, hash) = match split_encoded(encoded) {
        Ok(parts) => parts,
        Err(err) => {
            debug!(error = %err, "rejecting password check against unusable hash");
            return false;
        }
    };
    let expected = match hex::decode(hash) {
        Ok(expected) => expected,
        Err(_) => return false,
    };
    let candidate = algorithm.digest(salt, raw_password);

    if expected.len() != candidate.len() {
        return false;
    }
    // Constant-time comparison
    let mut result = 0u8;
    for (a, b) in expected.iter().zip(candidate.iter()) {
        result |= a ^ b;
    }
    result == 0
}

/// A stored password hash, typically a model field.
///
/// ```
/// use obfid_rs::password::PasswordField;
///
/// let mut password = PasswordField::default();
/// assert!(!password.check("secret"));
/// password.set("secret");
/// assert!(password.check("secret"));
/// assert!(!password.check("guess"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordField(String);

impl PasswordField {
    /// Wraps an already encoded hash, e.g. one loaded from the database.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        PasswordField(encoded.into())
    }

    /// Hashes and stores a new password.
    pub fn set(&mut self, raw_password: &str) {
        self.0 = make_password(raw_password);
    }

    pub fn set_with(
        &mut self,
        algorithm: Algorithm,
        raw_password: &str,
    ) -> Result<(), PasswordError> {
        self.0 = make_password_with(algorithm, raw_password)?;
        Ok(())
    }

    pub fn check(&self, raw_password: &str) -> bool {
        check_password(raw_password, &self.0)
    }

    pub fn is_set(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn encoded(&self) -> &str {
        &self.0
    }
}
