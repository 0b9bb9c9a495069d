//! `certify verify` — Verify a certificate by id.

use clap::Args;
use reqwest::StatusCode;

use certify_credentials::{encode_query_component, VerificationReport};

use super::{api_url, ErrorResponse, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Certificate id.
    pub id: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

pub async fn run(args: &VerifyArgs) -> anyhow::Result<()> {
    let report = fetch_report(&args.endpoint, &args.id).await?;
    print_report(&args.id, &report)
}

/// Query the programmatic verification endpoint.
pub(crate) async fn fetch_report(endpoint: &str, id: &str) -> anyhow::Result<VerificationReport> {
    let url = api_url(
        endpoint,
        &format!("/verify-api/{}", encode_query_component(id)),
    );
    let resp = reqwest::get(&url)
        .await
        .map_err(|e| anyhow::anyhow!("could not reach node at {}: {}", endpoint, e))?;

    match resp.status() {
        s if s.is_success() || s == StatusCode::NOT_FOUND => Ok(resp.json().await?),
        status => match resp.json::<ErrorResponse>().await {
            Ok(err) => anyhow::bail!("verification failed (HTTP {}): {}", status, err.error),
            Err(_) => anyhow::bail!("verification failed (HTTP {})", status),
        },
    }
}

pub(crate) fn print_report(id: &str, report: &VerificationReport) -> anyhow::Result<()> {
    match (report.valid, &report.certificate) {
        (true, Some(cert)) => {
            println!("Certificate is VALID");
            println!();
            println!("  ID:         {}", cert.id);
            println!("  Recipient:  {}", cert.recipient_name);
            println!("  Course:     {}", cert.course_name);
            println!("  Issued on:  {}", cert.issue_date);
            Ok(())
        }
        _ => anyhow::bail!("certificate {} not found", id),
    }
}
