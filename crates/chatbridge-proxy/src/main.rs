//! `chatbridge-proxy` binary entrypoint.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use chatbridge_proxy::{serve, BackendKind, BridgeConfig};

#[derive(Parser)]
#[command(name = "chatbridge-proxy")]
#[command(version, about = "OpenAI-compatible chat completion bridge")]
struct Cli {
    /// Config file (default: chatbridge.yml in the working directory or the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long, value_enum)]
    backend: Option<BackendKind>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Respect `RUST_LOG` if set; otherwise default to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config =
        BridgeConfig::load(cli.config.as_deref())?.with_overrides(cli.host, cli.port, cli.backend);

    serve(config).await
}
