//! `certify issue` — Log in as admin and issue a certificate.

use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use certify_core::Certificate;
use certify_credentials::{artifact_png, decode_artifact};

use super::{api_url, ErrorResponse, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Recipient's name.
    #[arg(short, long)]
    pub recipient: String,

    /// Course name.
    #[arg(short, long)]
    pub course: String,

    /// Issue date (YYYY-MM-DD). Defaults to today on the server.
    #[arg(short, long)]
    pub date: Option<String>,

    /// Admin username.
    #[arg(short, long, env = "CERTIFY_ADMIN_USERNAME", default_value = "admin")]
    pub username: String,

    /// Admin password.
    #[arg(short, long, env = "CERTIFY_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Write the QR code PNG to this file.
    #[arg(long)]
    pub qr_out: Option<PathBuf>,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueRequest<'a> {
    recipient_name: &'a str,
    course_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    issue_date: Option<&'a str>,
}

#[derive(Deserialize)]
struct IssueResponse {
    certificate: Certificate,
}

pub async fn run(args: &IssueArgs) -> anyhow::Result<()> {
    // The session cookie from login authenticates the issue call.
    let client = reqwest::Client::builder().cookie_store(true).build()?;

    let login = client
        .post(api_url(&args.endpoint, "/api/login"))
        .json(&LoginRequest {
            username: &args.username,
            password: &args.password,
        })
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("could not reach node at {}: {}", args.endpoint, e))?;
    if !login.status().is_success() {
        let status = login.status();
        match login.json::<ErrorResponse>().await {
            Ok(err) => anyhow::bail!("login failed (HTTP {}): {}", status, err.error),
            Err(_) => anyhow::bail!("login failed (HTTP {})", status),
        }
    }
    tracing::debug!(username = %args.username, "logged in");

    let resp = client
        .post(api_url(&args.endpoint, "/api/certificates"))
        .json(&IssueRequest {
            recipient_name: &args.recipient,
            course_name: &args.course,
            issue_date: args.date.as_deref(),
        })
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        match resp.json::<ErrorResponse>().await {
            Ok(err) => anyhow::bail!("issuance failed (HTTP {}): {}", status, err.error),
            Err(_) => anyhow::bail!("issuance failed (HTTP {})", status),
        }
    }

    let cert = resp.json::<IssueResponse>().await?.certificate;
    let verification_url = decode_artifact(&cert.verification_artifact)?;

    println!("Certificate issued!");
    println!("  ID:         {}", cert.id);
    println!("  Recipient:  {}", cert.recipient_name);
    println!("  Course:     {}", cert.course_name);
    println!("  Issued on:  {}", cert.issue_date);
    println!("  Verify at:  {}", verification_url);

    if let Some(ref path) = args.qr_out {
        let png = artifact_png(&cert.verification_artifact)?;
        std::fs::write(path, png)?;
        println!("  QR code:    {}", path.display());
    }

    // Best effort; the session expires on its own otherwise.
    if let Err(e) = client
        .post(api_url(&args.endpoint, "/api/logout"))
        .send()
        .await
    {
        tracing::warn!(error = %e, "logout failed");
    }

    Ok(())
}
