//! Node configuration loading and management.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use certify_credentials::{CodeOptions, Origin};

use crate::auth::MAX_SESSION_TTL_SECS;

/// Full configuration for the Certify node.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CertifyConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Seeded administrator credential.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Verification URL and QR code settings.
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Admin session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen address.
    #[serde(default = "default_api_addr")]
    pub listen_addr: String,
    /// HTTP port.
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the data directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Admin login name.
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// Admin password, hashed before it is stored. Only used when the
    /// admin does not exist yet.
    #[serde(default = "default_admin_password")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Fixed origin for verification URLs (e.g. `https://certs.example.org`).
    /// When unset, the origin of each issuance request is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_origin: Option<String>,
    /// Honor `X-Forwarded-Proto` / `X-Forwarded-Host` from a reverse proxy.
    #[serde(default)]
    pub trust_forwarded_headers: bool,
    /// QR code image width in pixels.
    #[serde(default = "default_qr_width")]
    pub qr_width: u32,
    /// QR code quiet zone in modules.
    #[serde(default = "default_qr_margin")]
    pub qr_margin: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in seconds.
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
}

// Default value functions
fn default_api_addr() -> String {
    "127.0.0.1".into()
}
fn default_api_port() -> u16 {
    3000
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_admin_username() -> String {
    "admin".into()
}
fn default_admin_password() -> String {
    "admin123".into()
}
fn default_qr_width() -> u32 {
    certify_credentials::code::DEFAULT_WIDTH
}
fn default_qr_margin() -> u32 {
    certify_credentials::code::DEFAULT_MARGIN
}
fn default_session_ttl() -> u64 {
    24 * 60 * 60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_api_addr(),
            port: default_api_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: default_admin_password(),
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            public_origin: None,
            trust_forwarded_headers: false,
            qr_width: default_qr_width(),
            qr_margin: default_qr_margin(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl(),
        }
    }
}

impl CertifyConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: CertifyConfig = toml::from_str(&contents)
                .with_context(|| format!("invalid config file {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check values that cannot be expressed in the types alone.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.admin.username.trim().is_empty() {
            anyhow::bail!("admin.username must not be empty");
        }
        if self.admin.password.is_empty() {
            anyhow::bail!("admin.password must not be empty");
        }
        if self.session.ttl_secs == 0 || self.session.ttl_secs > MAX_SESSION_TTL_SECS {
            anyhow::bail!(
                "session.ttl_secs must be between 1 and {}",
                MAX_SESSION_TTL_SECS
            );
        }
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!(
                "logging.format must be 'text' or 'json', got '{}'",
                self.logging.format
            );
        }
        self.code_options()?;
        self.public_origin()?;
        Ok(())
    }

    /// Get the HTTP listen address as `host:port`.
    pub fn api_addr(&self) -> String {
        format!("{}:{}", self.api.listen_addr, self.api.port)
    }

    /// QR rendering options.
    pub fn code_options(&self) -> anyhow::Result<CodeOptions> {
        CodeOptions::new(self.verification.qr_width, self.verification.qr_margin)
            .context("invalid [verification] QR options")
    }

    /// The configured fixed origin, if any. An empty string counts as unset.
    pub fn public_origin(&self) -> anyhow::Result<Option<Origin>> {
        match self.verification.public_origin.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Ok(Some(
                Origin::parse(raw).context("invalid verification.public_origin")?,
            )),
        }
    }
}
