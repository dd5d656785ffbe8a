//! docflow-trigger: HTTP front for scheduled runs (Cloud Scheduler, Cloud Run).
//!
//! `POST /` runs one batch and answers with the processed-file payload.
//! `GET /health` is a liveness probe.

use anyhow::{Context, Result};
use docflow_cli::init_tracing;
use docflow_cli::server::{serve, TriggerState};
use docflow_cli::setup::{build_runner, log_config};
use docflow_core::{Config, LogFormat};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    init_tracing(
        config
            .as_ref()
            .map(|c| c.log_format)
            .unwrap_or(LogFormat::Pretty),
    );
    let config = config.context("Invalid configuration")?;

    log_config(&config);
    let runner = build_runner(&config).await?;

    serve(config.port, Arc::new(TriggerState::new(runner))).await
}
