use crate::error::FileError;
use crate::processor::FileProcessor;
use crate::report::{BatchReport, FileFailure};
use chrono::Utc;
use docflow_core::constants::PDF_EXTENSION;
use docflow_core::{error_chain, ErrorMetadata, FileRecord, LogLevel};
use docflow_storage::keys::{file_name, has_extension};
use docflow_storage::{Storage, StorageError};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    pub bucket: String,
    pub source_prefix: String,
    pub destination_prefix: String,
    /// Files in flight at once; 1 processes them strictly one after another.
    pub max_concurrent_files: usize,
}

/// Runs one pass over the inbox prefix.
pub struct BatchRunner {
    storage: Arc<dyn Storage>,
    processor: Arc<FileProcessor>,
    settings: RunnerSettings,
}

impl BatchRunner {
    pub fn new(
        storage: Arc<dyn Storage>,
        processor: Arc<FileProcessor>,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            storage,
            processor,
            settings,
        }
    }

    /// Snapshot of the PDF files directly under the source prefix, sorted.
    pub async fn discover(&self) -> Result<Vec<FileRecord>, StorageError> {
        let keys = self.storage.list(&self.settings.source_prefix).await?;

        Ok(keys
            .iter()
            .filter(|key| has_extension(key, PDF_EXTENSION))
            .map(|key| {
                FileRecord::new(
                    &self.settings.bucket,
                    &self.settings.source_prefix,
                    &self.settings.destination_prefix,
                    file_name(key),
                )
            })
            .collect())
    }

    /// Process every candidate. Only a failed listing aborts the run; a
    /// failing file is recorded in the report and the batch moves on.
    pub async fn run(&self) -> Result<BatchReport, StorageError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("batch_run", %run_id, bucket = %self.settings.bucket);
        self.run_inner(run_id).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid) -> Result<BatchReport, StorageError> {
        let started_at = Utc::now();
        let files = self.discover().await?;

        tracing::info!(
            candidates = files.len(),
            source = %self.settings.source_prefix,
            destination = %self.settings.destination_prefix,
            max_concurrent_files = self.settings.max_concurrent_files,
            "Starting batch"
        );

        let candidates = files.len();
        let results: Vec<Result<String, FileError>> = stream::iter(files)
            .map(|file| self.run_file(file))
            .buffered(self.settings.max_concurrent_files.max(1))
            .collect()
            .await;

        let mut processed = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(name) => processed.push(name),
                Err(e) => failures.push(FileFailure {
                    file_name: e.file_name().to_string(),
                    stage: e.stage(),
                    error_code: e.error_code().to_string(),
                    error: error_chain(&e),
                }),
            }
        }

        let report = BatchReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            candidates,
            processed,
            failures,
        };

        tracing::info!(
            candidates = report.candidates,
            processed = report.processed.len(),
            failed = report.failures.len(),
            duration_ms = report.duration_ms(),
            "Batch finished"
        );

        Ok(report)
    }

    async fn run_file(&self, file: FileRecord) -> Result<String, FileError> {
        let span = tracing::info_span!("file", file = %file.file_name);
        async {
            tracing::info!("Processing file");
            match self.processor.process(&file).await {
                Ok(done) => {
                    tracing::info!(
                        records = done.records,
                        archived = done.archive.is_moved(),
                        "File processed"
                    );
                    Ok(done.file_name)
                }
                Err(e) => {
                    log_failure(&e);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}

fn log_failure(err: &FileError) {
    let chain = error_chain(err);
    match err.log_level() {
        LogLevel::Error => tracing::error!(
            stage = %err.stage(),
            error_code = err.error_code(),
            recoverable = err.is_recoverable(),
            error = %chain,
            "File failed after its records were persisted, skipping"
        ),
        LogLevel::Warn => tracing::warn!(
            stage = %err.stage(),
            error_code = err.error_code(),
            recoverable = err.is_recoverable(),
            error = %chain,
            "File failed, left in source prefix, skipping"
        ),
        LogLevel::Debug => tracing::debug!(
            stage = %err.stage(),
            error_code = err.error_code(),
            error = %chain,
            "File no longer in source prefix, skipping"
        ),
    }
}
