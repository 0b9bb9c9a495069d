pub mod init;
pub mod issue;
pub mod scan;
pub mod status;
pub mod verify;

use serde::Deserialize;

/// Default API endpoint of a local node.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000";

#[derive(Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
}

/// Join an endpoint and a path without doubling the slash.
pub(crate) fn api_url(endpoint: &str, path: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), path)
}
