/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("password hashing failed: {0}")]
    PasswordHashError(String),

    #[error("invalid password hash: {0}")]
    InvalidHash(String),
}
