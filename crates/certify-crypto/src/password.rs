use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::CryptoError;

/// Hash a password with Argon2id and a fresh random salt.
/// Returns the PHC-formatted hash string.
pub fn hash_password(password: &[u8]) -> Result<String, CryptoError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password, &salt)
        .map_err(|e| CryptoError::PasswordHashError(format!("argon2 hash failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2id hash.
pub fn verify_password(password: &[u8], hash_str: &str) -> Result<bool, CryptoError> {
    let parsed_hash = PasswordHash::new(hash_str)
        .map_err(|e| CryptoError::InvalidHash(format!("invalid hash format: {}", e)))?;

    match Argon2::default().verify_password(password, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CryptoError::InvalidHash(format!("verification error: {}", e))),
    }
}
