//! GraphQL Mock Server - CLI Entry Point

use anyhow::Result;
use clap::Parser;
use graphql_mock_server::config::{MockServerConfig, EXAMPLE_CONFIG};
use graphql_mock_server::prelude::*;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "graphql-mock-server",
    about = "Serve canned GraphQL responses for client test suites",
    version
)]
struct Args {
    /// Path to the mocks file
    #[arg(short, long, default_value = "graphql-mocks.yaml")]
    config: PathBuf,

    /// Port to listen on, overriding the mocks file (0 picks a free port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print an example mocks file and exit
    #[arg(long)]
    print_config: bool,

    /// Validate the mocks file and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        println!("{}", EXAMPLE_CONFIG);
        return Ok(());
    }

    let mut config = if args.config.exists() {
        info!(path = ?args.config, "Loading mocks");
        MockServerConfig::from_file(&args.config)?
    } else if args.validate {
        anyhow::bail!("Mocks file not found: {:?}", args.config);
    } else {
        info!("No mocks file found, starting with no mocks");
        MockServerConfig::default()
    };

    if args.validate {
        println!("Mocks file is valid ({} mocks defined)", config.mocks.len());
        return Ok(());
    }

    if let Some(port) = args.port {
        config.settings.port = port;
    }

    let mocks = MockServer::new();
    mocks.register_all(config.mocks)?;

    Axum::bind(config.settings.addr())
        .run(mocks.clone(), None::<fn(std::net::SocketAddr)>, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    if let Some(unused) = mocks.unused() {
        warn!(mock = %unused, "Mock query not used");
    }

    Ok(())
}
