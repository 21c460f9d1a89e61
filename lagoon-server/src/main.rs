use std::sync::Arc;

use clap::Parser;
use lagoon::{RouteEvent, RoutingEngine, Severity};
use lagoon_server::{Cli, ServerConfig, router};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let cli = Cli::parse();
    let config = ServerConfig::resolve(&cli)?;
    let engine = Arc::new(RoutingEngine::from_config(&config.engine)?);

    tokio::spawn(log_events(engine.subscribe()));

    if config.preload {
        info!(base_url = %config.engine.provider.base_url, "preloading routing data");
        if let Err(err) = engine.preload_polygons().await {
            warn!(error = %err, "preload failed, data will be fetched on first request");
        }
    }

    let app = router(Arc::clone(&engine), &config);
    let listener = TcpListener::bind(config.listen).await?;
    info!(
        address = %listener.local_addr()?,
        mode = %config.engine.mode,
        "lagoon-server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("lagoon-server stopped");
    Ok(())
}

async fn log_events(mut events: tokio::sync::broadcast::Receiver<RouteEvent>) {
    loop {
        match events.recv().await {
            Ok(RouteEvent::Calculating(active)) => tracing::debug!(active, "route calculation"),
            Ok(RouteEvent::Calculated { path, water_only }) => info!(
                points = path.points().len(),
                distance = path.distance,
                water_only,
                "route calculated"
            ),
            Ok(RouteEvent::Error {
                message,
                severity: Severity::Warning,
            }) => warn!(%message, "route degraded"),
            Ok(RouteEvent::Error { message, .. }) => error!(%message, "route failed"),
            Ok(RouteEvent::ModeChanged(mode)) => info!(%mode, "pathfinding mode changed"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "event log lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
