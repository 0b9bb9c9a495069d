//! Certify Node — entry point.
//!
//! Starts the certificate issuance and verification server with
//! configuration from a TOML file or defaults.

mod api;
mod auth;
mod config;
mod error;
mod extractors;
mod node;
mod pages;
mod state;
mod storage;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::CertifyConfig;
use node::CertifyNode;

/// Certify Node
#[derive(Parser, Debug)]
#[command(name = "certify-node", version, about = "Certify issuance and verification server")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "certify.toml")]
    config: PathBuf,

    /// Override the HTTP port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Override the admin username.
    #[arg(long, env = "CERTIFY_ADMIN_USERNAME")]
    admin_username: Option<String>,

    /// Override the admin password.
    #[arg(long, env = "CERTIFY_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Handle --init flag
    if args.init {
        init_tracing(args.log_level.as_deref().unwrap_or("info"), "text");
        let config = CertifyConfig::default();
        config.save(&args.config)?;
        tracing::info!(path = %args.config.display(), "wrote default config");
        return Ok(());
    }

    // Load configuration
    let mut config = CertifyConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(ref data_dir) = args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(username) = args.admin_username {
        config.admin.username = username;
    }
    if let Some(password) = args.admin_password {
        config.admin.password = password;
    }

    init_tracing(&config.logging.level, &config.logging.format);
    tracing::info!("Certify Node v{}", env!("CARGO_PKG_VERSION"));

    let mut node = CertifyNode::new(config)?;
    node.start().await?;

    node.serve(shutdown_signal()).await?;
    tracing::info!("Certify node exited cleanly");
    Ok(())
}
