//! Hackathon registration backend.
//!
//! An axum service that gates the applicant area until the configured
//! opening instant, resolves each applicant to the screen matching their
//! application, and exposes the registration and admin review endpoints.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod middleware;
pub mod services;
pub mod state;
pub mod utils;

use tokio::net::TcpListener;

use crate::api::create_router;
use crate::config::AppConfig;
use crate::errors::StartupError;
use crate::state::AppState;

/// Wires the service from `config` and serves until interrupted.
pub async fn serve(config: AppConfig) -> Result<(), StartupError> {
    let addr = config.server.listen_addr;
    tracing::info!(
        open_at = %config.gate.open_at,
        cycle = ?config.cycle,
        "Starting registration backend"
    );

    let state = AppState::bootstrap(config).await?;
    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StartupError::Server(e.to_string()))?;

    tracing::info!("Registration backend shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
