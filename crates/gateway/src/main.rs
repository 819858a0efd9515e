use common::{TelemetryGuard, setup_logging};
use gateway::{build_state, create_router, get_configuration};
use std::sync::Arc;
use tokio::signal;

#[cfg(not(feature = "ort-backend"))]
compile_error!("The gateway binary needs a detector backend: enable the 'ort-backend' feature");

const SERVICE_NAME: &str = "gateway";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_configuration()?;

    let _telemetry = match &config.otel_endpoint {
        Some(endpoint) => Some(TelemetryGuard::init(
            SERVICE_NAME,
            endpoint,
            config.log_level,
            config.environment,
        )?),
        None => {
            setup_logging(config.log_level, config.environment);
            None
        }
    };

    tracing::info!(config = ?config, "Loaded configuration");

    let state = build_state(&config)?;
    let app = create_router(Arc::new(state));

    let address = config.address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(%address, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
