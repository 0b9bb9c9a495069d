//! Admin authentication: principal seeding, password login and
//! cookie-backed sessions.

use chrono::{Duration, Utc};
use std::sync::Arc;

use certify_core::AdminPrincipal;
use certify_crypto::{generate_session_token, hash_password, token_digest, verify_password};

use crate::storage::{SessionRecord, Storage};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "certify_session";

/// Upper bound on the session lifetime (ten years).
pub const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Errors from the authentication layer.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("storage error: {0}")]
    Storage(#[from] certify_credentials::StoreError),

    #[error("crypto error: {0}")]
    Crypto(#[from] certify_crypto::CryptoError),
}

/// An authenticated admin session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub expires_at: chrono::DateTime<Utc>,
}

/// Issues, resolves and revokes admin sessions.
pub struct SessionManager {
    storage: Arc<Storage>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(storage: Arc<Storage>, ttl_secs: u64) -> Self {
        let ttl = Duration::seconds(ttl_secs.min(MAX_SESSION_TTL_SECS) as i64);
        Self { storage, ttl }
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Check a username/password pair and open a session.
    ///
    /// Returns the raw token, which is only ever handed to the client.
    pub fn login(&self, username: &str, password: &str) -> Result<(String, Session), AuthError> {
        let principal = match self.storage.get_principal(username)? {
            Some(p) => p,
            None => {
                tracing::warn!(username, "login failed: unknown user");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(password.as_bytes(), &principal.password_hash)? {
            tracing::warn!(username, "login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.purge_expired()?;

        let token = generate_session_token();
        let record = SessionRecord {
            username: principal.username.clone(),
            expires_at: Utc::now() + self.ttl,
        };
        self.storage.put_session(&token.digest(), &record)?;

        tracing::info!(username = %principal.username, "admin logged in");
        Ok((
            token.as_str().to_string(),
            Session {
                username: record.username,
                expires_at: record.expires_at,
            },
        ))
    }

    /// Resolve a presented token. Expired sessions are removed.
    pub fn authenticate(&self, token: &str) -> Result<Option<Session>, AuthError> {
        if token.is_empty() {
            return Ok(None);
        }
        let digest = token_digest(token);
        let Some(record) = self.storage.get_session(&digest)? else {
            return Ok(None);
        };

        if record.expires_at <= Utc::now() {
            tracing::debug!(username = %record.username, "session expired");
            self.storage.delete_session(&digest)?;
            return Ok(None);
        }

        Ok(Some(Session {
            username: record.username,
            expires_at: record.expires_at,
        }))
    }

    /// Drop sessions that expired without being presented again.
    pub fn purge_expired(&self) -> Result<usize, AuthError> {
        let purged = self.storage.purge_expired_sessions(Utc::now())?;
        if purged > 0 {
            tracing::debug!(purged, "expired sessions removed");
        }
        Ok(purged)
    }

    /// Revoke a session. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) -> Result<(), AuthError> {
        if token.is_empty() {
            return Ok(());
        }
        self.storage.delete_session(&token_digest(token))?;
        tracing::info!("admin logged out");
        Ok(())
    }
}

/// Create the admin principal unless one with that username exists.
/// An existing principal keeps its stored password.
pub fn seed_admin(storage: &Storage, username: &str, password: &str) -> anyhow::Result<()> {
    let principal = AdminPrincipal {
        username: username.to_string(),
        password_hash: hash_password(password.as_bytes())?,
    };
    if storage.seed_principal(&principal)? {
        tracing::info!(username, "admin principal seeded");
    } else {
        tracing::info!(username, "admin principal already present");
    }
    Ok(())
}

/// Extract the session token from a `Cookie` header value.
pub fn session_token_from_cookie_header(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
    })
}

/// `Set-Cookie` value that installs a session.
pub fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.num_seconds()
    )
}

/// `Set-Cookie` value that clears the session.
pub fn clear_session_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    )
}
