//! HTTP API server for the Certify node.
//!
//! JSON endpoints for login, issuance and programmatic verification, plus
//! the server-rendered verification and admin pages.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use certify_core::{Certificate, IssueRequest};
use certify_credentials::{VerificationReport, VerificationResult};

use crate::auth::{clear_session_cookie, session_cookie, AuthError};
use crate::error::ApiError;
use crate::extractors::{session_token, AdminSession, RequestOrigin};
use crate::pages;
use crate::state::AppState;

// --- Request / response types ---

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Serialize, Deserialize)]
pub struct IssueResponse {
    pub success: bool,
    pub certificate: Certificate,
}

#[derive(Deserialize)]
pub struct VerifyQuery {
    pub id: Option<String>,
}

// --- Handlers ---

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn handle_login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::InvalidRequest(
            "username and password are required".into(),
        ));
    }

    let sessions_state = state.clone();
    let outcome = blocking(move || {
        sessions_state
            .sessions
            .login(&req.username, &req.password)
    })
    .await?;

    match outcome {
        Ok((token, _session)) => {
            let cookie = session_cookie(&token, state.sessions.ttl());
            Ok((
                [(header::SET_COOKIE, cookie)],
                Json(SuccessResponse { success: true }),
            )
                .into_response())
        }
        Err(AuthError::InvalidCredentials) => Ok((
            StatusCode::UNAUTHORIZED,
            Json(crate::error::ErrorResponse {
                error: "Invalid credentials".into(),
            }),
        )
            .into_response()),
        Err(e) => Err(ApiError::Internal(e.into())),
    }
}

async fn handle_logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = session_token(&headers).map(str::to_string) {
        blocking(move || state.sessions.logout(&token))
            .await?
            .map_err(|e| ApiError::Internal(e.into()))?;
    }
    Ok((
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(SuccessResponse { success: true }),
    )
        .into_response())
}

/// Issue a certificate. `AdminSession` is extracted first, so an
/// unauthenticated request never reaches the issuer.
async fn handle_issue(
    admin: AdminSession,
    State(state): State<Arc<AppState>>,
    RequestOrigin(origin): RequestOrigin,
    payload: Result<Json<IssueRequest>, JsonRejection>,
) -> Result<Json<IssueResponse>, ApiError> {
    let Json(req) = payload?;
    let new = req.validate().map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    tracing::debug!(admin = %admin.session.username, %origin, "issuing certificate");
    let certificate = blocking(move || state.issuer.issue_validated(new, &origin))
        .await?
        .map_err(ApiError::from)?;

    Ok(Json(IssueResponse {
        success: true,
        certificate,
    }))
}

/// An id that cannot be extracted (e.g. not UTF-8) cannot match a record,
/// so it gets the same `{valid:false}` 404 as an unknown one.
async fn handle_verify_api(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = match path {
        Ok(Path(id)) => id,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "unreadable certificate id");
            return Ok(not_found_report());
        }
    };

    let result = blocking(move || state.verifier.verify(&id))
        .await?
        .map_err(ApiError::from)?;

    let status = if result.is_valid() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok((status, Json(VerificationReport::from(result))).into_response())
}

fn not_found_report() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(VerificationReport::from(VerificationResult::NotFound)),
    )
        .into_response()
}

async fn handle_verify_page(
    State(state): State<Arc<AppState>>,
    RequestOrigin(origin): RequestOrigin,
    query: Result<Query<VerifyQuery>, QueryRejection>,
) -> Response {
    let id = match query {
        Ok(Query(VerifyQuery { id: Some(id) })) if !id.is_empty() => id,
        Ok(_) => return Html(pages::verify_landing_page()).into_response(),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "malformed verify query");
            return (StatusCode::BAD_REQUEST, Html(pages::verify_landing_page())).into_response();
        }
    };

    let lookup = id.clone();
    let result = match blocking(move || state.verifier.verify(&lookup)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "verification lookup failed");
            return server_error_page();
        }
        Err(e) => {
            tracing::error!(error = %e, "verification task failed");
            return server_error_page();
        }
    };

    match result {
        VerificationResult::Valid(cert) => {
            let share_url = origin.verification_url(&cert.id);
            Html(pages::verify_valid_page(&cert, &share_url)).into_response()
        }
        VerificationResult::NotFound => (
            StatusCode::NOT_FOUND,
            Html(pages::verify_not_found_page(&id)),
        )
            .into_response(),
    }
}

async fn handle_home() -> Html<String> {
    Html(pages::home_page())
}

async fn handle_login_page() -> Html<String> {
    Html(pages::login_page())
}

async fn handle_dashboard(admin: Result<AdminSession, ApiError>) -> Response {
    match admin {
        Ok(admin) => Html(pages::dashboard_page(&admin.session.username)).into_response(),
        Err(ApiError::Unauthorized) => (
            StatusCode::UNAUTHORIZED,
            "Unauthorized. Please log in.",
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn handle_stylesheet() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        pages::STYLESHEET,
    )
}

fn server_error_page() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Html(pages::error_page())).into_response()
}

/// Run a store-bound closure on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.into()))
}

// --- Server ---

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_home))
        .route("/styles.css", get(handle_stylesheet))
        .route("/login", get(handle_login_page))
        .route("/admin/dashboard", get(handle_dashboard))
        .route("/api/health", get(handle_health))
        .route("/api/login", post(handle_login))
        .route("/api/logout", post(handle_logout))
        .route("/certificates", post(handle_issue))
        .route("/api/certificates", post(handle_issue))
        .route("/verify", get(handle_verify_page))
        .route("/verify-api/{id}", get(handle_verify_api))
        .route("/api/verify/{id}", get(handle_verify_api))
        .with_state(state)
}

pub async fn start_api_server(
    listen_addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "HTTP API server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
