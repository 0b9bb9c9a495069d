//! Certify CLI — command-line client for a Certify node.
//!
//! Subcommands: init, status, issue, verify, scan.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Certify — certificate issuance and verification.
#[derive(Parser, Debug)]
#[command(name = "certify", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default node configuration.
    Init(commands::init::InitArgs),
    /// Check that a node is reachable.
    Status(commands::status::StatusArgs),
    /// Log in as admin and issue a certificate.
    Issue(commands::issue::IssueArgs),
    /// Verify a certificate by id.
    Verify(commands::verify::VerifyArgs),
    /// Decode a QR code image and verify the certificate it points to.
    Scan(commands::scan::ScanArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Issue(args) => commands::issue::run(args).await,
        Commands::Verify(args) => commands::verify::run(args).await,
        Commands::Scan(args) => commands::scan::run(args).await,
    }
}
