use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use backend_api::config::{load_config, AppConfig};
use backend_api::http::HttpServer;
use backend_api::observability::{logging, metrics};
use backend_api::store;

#[derive(Parser, Debug)]
#[command(name = "backend-api")]
#[command(about = "REST backend for users and orders", long_about = None)]
struct Args {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_tracing(&config.observability.log_level);

    tracing::info!("backend-api v0.1.0 starting");
    tracing::info!(
        bind_address = %config.server.bind_address,
        database_url = %config.database.url,
        rate_limit_enabled = config.rate_limit.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let pool = store::connect(&config.database).await?;
    store::init_schema(&pool).await?;
    tracing::info!("Database initialized");

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let server = HttpServer::new(config, pool);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
