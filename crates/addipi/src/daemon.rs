//! Daemon wiring: adapters, scheduler task, web server, shutdown.

use std::sync::Arc;

use miette::Result;
use tokio::sync::watch;
use tracing::{info, warn};

use addipi_cosmos::CosmosJobStore;
use addipi_iot::IotHubDispatcher;
use addipi_scheduler::{JobStore, Scheduler, SignalDispatcher};
use addipi_web::create_router;

use crate::config::Config;

/// Run the service until ctrl-c.
pub async fn run(config: Config) -> Result<()> {
    let store: Arc<dyn JobStore> =
        Arc::new(CosmosJobStore::new(&config.cosmos_endpoint, &config.cosmos_key)
            .map_err(|e| miette::miette!("failed to create Cosmos DB client: {}", e))?);

    let dispatcher: Arc<dyn SignalDispatcher> =
        Arc::new(IotHubDispatcher::from_connection_string(&config.iot_conn_string)
            .map_err(|e| miette::miette!("failed to create IoT Hub client: {}", e))?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = Scheduler::new(Arc::clone(&store), dispatcher)
        .with_poll_interval(config.poll_interval);
    let scheduler_handle = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    let router = create_router(store);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .map_err(|e| miette::miette!("failed to bind port {}: {}", config.port, e))?;

    info!("web server listening on http://0.0.0.0:{}", config.port);

    tokio::select! {
        result = axum::serve(listener, router) => {
            result.map_err(|e| miette::miette!("web server error: {}", e))?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }

    // Stop the scheduler and wait for any in-flight tick to finish.
    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler_handle.await {
        warn!(error = %e, "scheduler task did not join cleanly");
    }

    Ok(())
}
