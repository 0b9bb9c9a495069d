//! `certify init` — Write a default node configuration.

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory).
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

const DEFAULT_CONFIG: &str = r#"# Certify Node Configuration

[api]
listen_addr = "127.0.0.1"
port = 3000

[storage]
data_dir = "./data"

[logging]
level = "info"
format = "text"

[admin]
username = "admin"
password = "admin123"

[verification]
# public_origin = "https://certs.example.org"
trust_forwarded_headers = false
qr_width = 300
qr_margin = 1

[session]
ttl_secs = 86400
"#;

pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    let config_path = args.dir.join("certify.toml");

    if config_path.exists() {
        anyhow::bail!("configuration file already exists at {}", config_path.display());
    }

    std::fs::create_dir_all(&args.dir)?;
    std::fs::write(&config_path, DEFAULT_CONFIG)?;
    println!("Initialized Certify node at {}", config_path.display());
    println!("Change the admin password in certify.toml before going live.");
    println!("Run 'certify-node' to start the node.");

    std::fs::create_dir_all(args.dir.join("data"))?;
    Ok(())
}
