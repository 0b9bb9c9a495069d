use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, Uri},
};
use std::sync::Arc;

use certify_credentials::Origin;

use crate::auth::{session_token_from_cookie_header, Session};
use crate::error::ApiError;
use crate::state::AppState;

/// Extractor for requests carrying a valid admin session cookie.
///
/// Runs before the handler body, so unauthenticated requests are
/// rejected with 401 before any issuance logic is reached.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub session: Session,
    pub token: String,
}

impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)
            .ok_or(ApiError::Unauthorized)?
            .to_string();

        let state = Arc::clone(state);
        let lookup = token.clone();
        let session = tokio::task::spawn_blocking(move || state.sessions.authenticate(&lookup))
            .await
            .map_err(|e| ApiError::Internal(e.into()))?
            .map_err(|e| ApiError::Internal(e.into()))?
            .ok_or(ApiError::Unauthorized)?;

        Ok(AdminSession { session, token })
    }
}

/// Session token from the request's `Cookie` headers, if present.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(session_token_from_cookie_header)
}

/// The origin the client used to reach this service.
#[derive(Debug, Clone)]
pub struct RequestOrigin(pub Origin);

impl FromRequestParts<Arc<AppState>> for RequestOrigin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(origin) = &state.public_origin {
            return Ok(RequestOrigin(origin.clone()));
        }
        Ok(RequestOrigin(resolve_origin(
            &parts.headers,
            &parts.uri,
            state.config.verification.trust_forwarded_headers,
            &state.fallback_host(),
        )))
    }
}

/// Work out scheme and host of the current request.
///
/// Forwarded headers are only consulted when `trust_forwarded` is set.
/// Host candidates that are not plausible authorities are skipped.
pub fn resolve_origin(
    headers: &HeaderMap,
    uri: &Uri,
    trust_forwarded: bool,
    fallback_host: &str,
) -> Origin {
    let scheme = trust_forwarded
        .then(|| first_value(headers, "x-forwarded-proto"))
        .flatten()
        .map(|s| s.to_ascii_lowercase())
        .filter(|s| s == "http" || s == "https")
        .or_else(|| uri.scheme_str().map(str::to_string))
        .unwrap_or_else(|| "http".to_string());

    let host = trust_forwarded
        .then(|| first_value(headers, "x-forwarded-host"))
        .flatten()
        .filter(|h| is_valid_host(h))
        .or_else(|| {
            headers
                .get(header::HOST)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|h| is_valid_host(h))
        })
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or(fallback_host);

    Origin::new(scheme, host)
}

/// First element of a possibly comma-separated header.
fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let value = headers.get(name)?.to_str().ok()?;
    let first = value.split(',').next()?.trim();
    (!first.is_empty()).then_some(first)
}

fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(*k, v.parse().unwrap());
        }
        map
    }

    #[test]
    fn test_origin_from_host_header() {
        let h = headers(&[("host", "certs.example.org:8443")]);
        let origin = resolve_origin(&h, &Uri::from_static("/certificates"), false, "127.0.0.1:3000");
        assert_eq!(origin.to_string(), "http://certs.example.org:8443");
    }

    #[test]
    fn test_forwarded_headers_ignored_when_untrusted() {
        let h = headers(&[
            ("host", "internal:3000"),
            ("x-forwarded-proto", "https"),
            ("x-forwarded-host", "certs.example.org"),
        ]);
        let origin = resolve_origin(&h, &Uri::from_static("/"), false, "127.0.0.1:3000");
        assert_eq!(origin.to_string(), "http://internal:3000");
    }

    #[test]
    fn test_forwarded_headers_when_trusted() {
        let h = headers(&[
            ("host", "internal:3000"),
            ("x-forwarded-proto", "HTTPS, http"),
            ("x-forwarded-host", "certs.example.org, proxy.local"),
        ]);
        let origin = resolve_origin(&h, &Uri::from_static("/"), true, "127.0.0.1:3000");
        assert_eq!(origin.to_string(), "https://certs.example.org");
    }

    #[test]
    fn test_bogus_forwarded_proto_falls_back() {
        let h = headers(&[("host", "internal:3000"), ("x-forwarded-proto", "gopher")]);
        let origin = resolve_origin(&h, &Uri::from_static("/"), true, "127.0.0.1:3000");
        assert_eq!(origin.scheme(), "http");
    }

    #[test]
    fn test_uri_authority_then_fallback() {
        let origin = resolve_origin(
            &HeaderMap::new(),
            &Uri::from_static("https://direct.example.org/x"),
            false,
            "127.0.0.1:3000",
        );
        assert_eq!(origin.to_string(), "https://direct.example.org");

        let origin = resolve_origin(&HeaderMap::new(), &Uri::from_static("/x"), false, "127.0.0.1:3000");
        assert_eq!(origin.to_string(), "http://127.0.0.1:3000");
    }

    #[test]
    fn test_invalid_host_skipped() {
        let h = headers(&[("host", "evil host/<script>")]);
        let origin = resolve_origin(&h, &Uri::from_static("/"), false, "127.0.0.1:3000");
        assert_eq!(origin.host(), "127.0.0.1:3000");
    }

    #[test]
    fn test_session_token_from_headers() {
        let h = headers(&[("cookie", "a=1"), ("cookie", "certify_session=tok; b=2")]);
        assert_eq!(session_token(&h), Some("tok"));
        assert_eq!(session_token(&HeaderMap::new()), None);
    }
}
