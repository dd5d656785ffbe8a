//! Build the pipeline from configuration.

use anyhow::{Context, Result};
use docflow_core::Config;
use docflow_services::{
    BigQuerySink, DocumentAiClient, MetadataTokenProvider, StaticTokenProvider, TableRef,
    TokenProvider,
};
use docflow_storage::create_storage;
use docflow_worker::{BatchRunner, FileProcessor, RunnerSettings};
use std::sync::Arc;
use std::time::Duration;

/// Static token when one is configured, otherwise the metadata server.
pub fn token_provider(config: &Config) -> Result<Arc<dyn TokenProvider>> {
    match &config.access_token {
        Some(token) => {
            tracing::info!("Using access token from GOOGLE_OAUTH_ACCESS_TOKEN");
            Ok(Arc::new(StaticTokenProvider::new(token.clone())))
        }
        None => {
            tracing::info!("Using metadata server credentials");
            let provider =
                MetadataTokenProvider::new().context("Failed to create metadata token provider")?;
            Ok(Arc::new(provider))
        }
    }
}

pub async fn build_runner(config: &Config) -> Result<BatchRunner> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    let tokens = token_provider(config)?;
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let extractor = DocumentAiClient::new(
        config.documentai_endpoint.clone(),
        config.processor_name(),
        tokens.clone(),
        timeout,
    )
    .context("Failed to create Document AI client")?;

    let sink = BigQuerySink::new(config.bigquery_endpoint.clone(), tokens, timeout)
        .context("Failed to create BigQuery client")?;

    let processor = FileProcessor::new(
        storage.clone(),
        Arc::new(extractor),
        Arc::new(sink),
        TableRef::new(&config.project_id, &config.dataset_id, &config.table_id),
        config.mime_type.clone(),
    )
    .with_strict_archive(config.strict_archive);

    Ok(BatchRunner::new(
        storage,
        Arc::new(processor),
        RunnerSettings {
            bucket: config.bucket_name.clone(),
            source_prefix: config.source_prefix.clone(),
            destination_prefix: config.destination_prefix.clone(),
            max_concurrent_files: config.max_concurrent_files,
        },
    ))
}

/// Echo the effective configuration at startup.
pub fn log_config(config: &Config) {
    tracing::info!(
        project_id = %config.project_id,
        location = %config.location,
        processor_id = %config.processor_id,
        bucket_name = %config.bucket_name,
        dataset_id = %config.dataset_id,
        table_id = %config.table_id,
        origen = %config.source_prefix,
        destino = %config.destination_prefix,
        "Configuration loaded"
    );
    tracing::info!(
        environment = %config.environment,
        storage_backend = %config.storage_backend,
        mime_type = %config.mime_type,
        documentai_endpoint = %config.documentai_endpoint,
        bigquery_endpoint = %config.bigquery_endpoint,
        max_concurrent_files = config.max_concurrent_files,
        strict_archive = config.strict_archive,
        request_timeout_secs = config.request_timeout_secs,
        "Runtime settings"
    );
}
