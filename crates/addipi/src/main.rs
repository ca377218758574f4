//! Addipi: print-job scheduler service.
//!
//! Scans the Cosmos DB job queue once a minute, claims every due job with a
//! conditional status write, and signals the printer over IoT Hub. Serves
//! the liveness endpoints on the side.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod daemon;

use config::Config;

#[derive(Parser)]
#[command(name = "addipi")]
#[command(about = "Addipi print-job scheduler", long_about = None)]
struct Cli {
    /// IoT Hub device connection string
    #[arg(long, env = "IOT_CONN_STRING", hide_env_values = true)]
    iot_conn_string: Option<String>,

    /// Cosmos DB account endpoint
    #[arg(long, env = "COSMOS_ENDPOINT")]
    cosmos_endpoint: Option<String>,

    /// Cosmos DB primary key
    #[arg(long, env = "COSMOS_KEY", hide_env_values = true)]
    cosmos_key: Option<String>,

    /// HTTP listen port
    #[arg(long, default_value = "3050")]
    port: u16,

    /// Due-job scan interval in seconds
    #[arg(long, default_value = "60")]
    poll_interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "addipi=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::new(
        cli.iot_conn_string,
        cli.cosmos_endpoint,
        cli.cosmos_key,
        cli.port,
        cli.poll_interval,
    )
    .map_err(|e| miette::miette!("{}", e))?;

    daemon::run(config).await
}
