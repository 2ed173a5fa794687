//! # cpm-api — Binary Entry Point
//!
//! Starts the Axum HTTP server. See [`cpm_api::config`] for the environment
//! variables it reads.

use cpm_api::config::AppConfig;
use cpm_api::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("configuration failed: {e}");
        e
    })?;
    let port = config.port;
    let state = AppState::with_config(config);

    // Log every completion change; the feed recomputes from scratch per change.
    let mut completion = state.completion.subscribe();
    tokio::spawn(async move {
        while completion.changed().await.is_ok() {
            let summary = completion.borrow_and_update().clone();
            tracing::info!(
                cwp = %summary.cwp,
                threshold = %summary.threshold,
                can_schedule_draw = summary.can_schedule_draw,
                "completion updated"
            );
        }
    });

    let app = cpm_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("CPM API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
