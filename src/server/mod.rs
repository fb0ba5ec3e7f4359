//! Web front end
//!
//! One page: a form with one numeric control per model feature, an echo of
//! the record built from it, and the prediction for the last submission.
//! If the model cannot be loaded at startup, every route serves the fatal
//! message instead and the form is never reachable.

mod handlers;
pub mod render;
mod state;

pub use state::{AppState, HaltedState, ReadyState};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;

/// Create the application router for the state startup produced
pub fn create_router(state: AppState) -> Router {
    match state {
        AppState::Ready(ready) => Router::new()
            .route("/", get(handlers::show_form).post(handlers::submit_form))
            .route("/health", get(handlers::health_check))
            .fallback(handlers::handle_404)
            .with_state(Arc::new(ready))
            .layer(TraceLayer::new_for_http()),
        AppState::Halted(halted) => Router::new()
            .fallback(handlers::halted)
            .with_state(Arc::new(halted))
            .layer(TraceLayer::new_for_http()),
    }
}

/// Load the model, then serve the front end until ctrl+c
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    let state = AppState::load(&config);
    let metrics = match &state {
        AppState::Ready(ready) => {
            let engine = ready.lock_engine();
            info!(
                features = ready.extractor.feature_count(engine.schema()),
                output = ?engine.arity(),
                "Model ready for predictions"
            );
            Some(engine.metrics())
        }
        AppState::Halted(_) => None,
    };
    let ready = state.is_ready();
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        address = %addr,
        model_loaded = ready,
        pid = std::process::id(),
        started_at = %start_time.to_rfc3339(),
        "Front end listening"
    );
    info!(url = %format!("http://{}", addr), "Prediction form available");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    if let Some(metrics) = metrics {
        metrics.print_summary();
    }
    info!("Server shut down cleanly");
    Ok(())
}
