//! Argon2id password hashing.
//!
//! # Invariants
//! - Hashes are PHC strings with a fresh 16-byte random salt.
//! - A malformed stored hash is an error, a wrong password is `Ok(false)`.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;
use std::error::Error;
use std::fmt::{Display, Formatter};

const SALT_LEN: usize = 16;

#[derive(Debug)]
pub enum PasswordError {
    /// Hashing itself failed.
    Hash(String),
    /// A stored hash could not be parsed.
    MalformedHash(String),
}

impl Display for PasswordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hash(message) => write!(f, "password hashing failed: {message}"),
            Self::MalformedHash(message) => write!(f, "stored password hash is malformed: {message}"),
        }
    }
}

impl Error for PasswordError {}

/// Hashes `password` with Argon2id defaults.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let mut salt_bytes = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|err| PasswordError::Hash(err.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PasswordError::Hash(err.to_string()))
}

/// Checks `password` against a PHC hash produced by [`hash_password`].
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed =
        PasswordHash::new(hash).map_err(|err| PasswordError::MalformedHash(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
