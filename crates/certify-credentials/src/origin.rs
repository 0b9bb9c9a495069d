//! Request origins and canonical verification URLs.

use std::fmt;

use certify_core::CertificateId;
use url::Url;

/// Path of the interactive verification page.
pub const VERIFY_PATH: &str = "/verify";

/// Errors parsing a configured origin.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OriginError {
    #[error("origin must start with http:// or https://, got: {0}")]
    UnsupportedScheme(String),

    #[error("origin has no host: {0}")]
    MissingHost(String),

    #[error("origin must not contain credentials, a path, query or fragment: {0}")]
    UnexpectedPath(String),

    #[error("invalid origin {0}: {1}")]
    Invalid(String, String),
}

/// Scheme and host under which the service was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    scheme: String,
    host: String,
}

impl Origin {
    /// Build an origin from an observed scheme and `Host` value
    /// (which may include a port).
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into().to_ascii_lowercase(),
            host: host.into(),
        }
    }

    /// Parse a full origin such as `https://certs.example.org`.
    /// A single trailing slash is tolerated.
    pub fn parse(raw: &str) -> Result<Self, OriginError> {
        let url = Url::parse(raw.trim()).map_err(|e| match e {
            url::ParseError::RelativeUrlWithoutBase => {
                OriginError::UnsupportedScheme(raw.to_string())
            }
            url::ParseError::EmptyHost => OriginError::MissingHost(raw.to_string()),
            other => OriginError::Invalid(raw.to_string(), other.to_string()),
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(OriginError::UnsupportedScheme(raw.to_string()));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| OriginError::MissingHost(raw.to_string()))?;
        if url.path() != "/"
            || url.query().is_some()
            || url.fragment().is_some()
            || !url.username().is_empty()
            || url.password().is_some()
        {
            return Err(OriginError::UnexpectedPath(raw.to_string()));
        }

        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Ok(Self::new(url.scheme(), host))
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Canonical verification URL: `<origin>/verify?id=<urlEncoded id>`.
    pub fn verification_url(&self, id: &CertificateId) -> String {
        format!(
            "{}{}?id={}",
            self,
            VERIFY_PATH,
            encode_query_component(id.as_str())
        )
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub fn encode_query_component(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Pull the certificate id out of a verification URL's `id` query
/// parameter.
pub fn certificate_id_from_url(url: &str) -> Option<CertificateId> {
    let url = Url::parse(url).ok()?;
    let id = url
        .query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())?;
    if id.is_empty() {
        return None;
    }
    Some(CertificateId::from(id))
}
