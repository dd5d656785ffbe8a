//! HTTP trigger: one batch per `POST /`.

use anyhow::Result;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use docflow_core::error_chain;
use docflow_worker::BatchRunner;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

pub struct TriggerState {
    runner: BatchRunner,
    /// Held for the whole run so two triggers never race on the same inbox.
    running: Mutex<()>,
}

impl TriggerState {
    pub fn new(runner: BatchRunner) -> Self {
        Self {
            runner,
            running: Mutex::new(()),
        }
    }
}

pub fn router(state: Arc<TriggerState>) -> Router {
    Router::new()
        .route("/", post(run_batch))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

async fn run_batch(State(state): State<Arc<TriggerState>>) -> Response {
    let _guard = state.running.lock().await;

    match state.runner.run().await {
        Ok(report) => {
            tracing::info!(
                run_id = %report.run_id,
                payload = %report.payload(),
                "Batch triggered over HTTP finished"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                report.payload(),
            )
                .into_response()
        }
        Err(e) => {
            let error = error_chain(&e);
            tracing::error!(error = %error, "Batch could not list the source prefix");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error })),
            )
                .into_response()
        }
    }
}

/// Serve until Ctrl+C or SIGTERM.
pub async fn serve(port: u16, state: Arc<TriggerState>) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Trigger server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
