//! Opaque session tokens.
//!
//! Tokens are handed to clients; only their BLAKE3 digest is persisted.

use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;

/// Length of a raw session token in bytes.
pub const TOKEN_LEN: usize = 32;

/// A freshly generated session token (hex-encoded).
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digest under which this token is stored.
    pub fn digest(&self) -> String {
        token_digest(&self.0)
    }
}

// Keep tokens out of logs.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Generate a 256-bit random session token.
pub fn generate_session_token() -> SessionToken {
    let mut bytes = [0u8; TOKEN_LEN];
    OsRng.fill_bytes(&mut bytes);
    SessionToken(hex::encode(bytes))
}

/// BLAKE3 digest of a presented token, hex-encoded.
pub fn token_digest(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_format() {
        let token = generate_session_token();
        assert_eq!(token.as_str().len(), TOKEN_LEN * 2);
        assert!(hex::decode(token.as_str()).is_ok());
    }

    #[test]
    fn test_tokens_differ() {
        assert_ne!(generate_session_token(), generate_session_token());
    }

    #[test]
    fn test_digest_deterministic() {
        let token = generate_session_token();
        assert_eq!(token.digest(), token_digest(token.as_str()));
        assert_ne!(token.digest(), token.as_str());
    }

    #[test]
    fn test_debug_redacts() {
        let token = generate_session_token();
        assert!(!format!("{:?}", token).contains(token.as_str()));
    }
}
