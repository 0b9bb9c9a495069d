//! `certify scan` — Decode a QR code image and verify its certificate.

use clap::Args;
use std::path::PathBuf;

use certify_credentials::{certificate_id_from_url, decode_png};

use super::verify::{fetch_report, print_report};
use super::DEFAULT_ENDPOINT;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// PNG image containing the certificate's QR code.
    pub image: PathBuf,

    /// API endpoint of the node. The URL in the code is only used for its id.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

pub async fn run(args: &ScanArgs) -> anyhow::Result<()> {
    let png = std::fs::read(&args.image)?;
    let url = decode_png(&png)?;
    println!("Decoded: {}", url);

    let id = certificate_id_from_url(&url)
        .ok_or_else(|| anyhow::anyhow!("QR code does not contain a verification URL"))?;

    let report = fetch_report(&args.endpoint, id.as_str()).await?;
    print_report(id.as_str(), &report)
}
