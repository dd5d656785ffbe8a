//! docflow: process every PDF in the inbox prefix once and print the JSON
//! array of processed file names.
//!
//! Configuration comes from the environment (see `docflow_core::Config`).

use anyhow::Context;
use docflow_cli::init_tracing;
use docflow_cli::setup::{build_runner, log_config};
use docflow_core::{Config, LogFormat};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::from_env();
    init_tracing(
        config
            .as_ref()
            .map(|c| c.log_format)
            .unwrap_or(LogFormat::Pretty),
    );

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match run(&config).await {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Batch aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> anyhow::Result<i32> {
    tracing::info!("***** ANALIZANDO POLIZAS DE EGRESOS *****");
    log_config(config);

    let runner = build_runner(config).await?;
    let report = runner
        .run()
        .await
        .context("Failed to list source prefix")?;

    let payload = report.payload();
    println!("{}", payload);
    tracing::info!(
        payload = %payload,
        content_type = "application/json",
        failed = report.failures.len(),
        "Batch payload"
    );

    Ok(report.exit_code())
}
