//! `certify status` — Check that a node is reachable.

use clap::Args;
use serde::Deserialize;

use super::{api_url, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

pub async fn run(args: &StatusArgs) -> anyhow::Result<()> {
    let url = api_url(&args.endpoint, "/api/health");
    let resp = reqwest::get(&url).await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let health: HealthResponse = r.json().await?;
            println!("Node Status:");
            println!("  Endpoint:   {}", args.endpoint);
            println!("  Health:     {}", health.status);
        }
        Ok(r) => {
            anyhow::bail!("node returned HTTP {}", r.status());
        }
        Err(e) => {
            println!("Could not reach node at {}", args.endpoint);
            println!("  Error: {}", e);
            println!();
            println!("Is the node running? Start it with: certify-node");
        }
    }

    Ok(())
}
