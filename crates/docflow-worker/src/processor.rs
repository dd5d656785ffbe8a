//! Per-file pipeline
//!
//! `pending → extracted → persisted → archived → reported`. Each transition
//! has its own method so callers can resume from `persisted` without
//! inserting the rows a second time.

use crate::archive::{ArchiveMover, ArchiveOutcome};
use crate::error::FileError;
use docflow_core::{FileRecord, Record};
use docflow_processing::flatten;
use docflow_services::{DocumentExtractor, TableRef, WarehouseRow, WarehouseSink};
use docflow_storage::Storage;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// A file that reached `Reported`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedFile {
    pub file_name: String,
    pub records: usize,
    pub archive: ArchiveOutcome,
}

pub struct FileProcessor {
    storage: Arc<dyn Storage>,
    extractor: Arc<dyn DocumentExtractor>,
    sink: Arc<dyn WarehouseSink>,
    mover: ArchiveMover,
    table: TableRef,
    mime_type: String,
    strict_archive: bool,
}

impl FileProcessor {
    pub fn new(
        storage: Arc<dyn Storage>,
        extractor: Arc<dyn DocumentExtractor>,
        sink: Arc<dyn WarehouseSink>,
        table: TableRef,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            mover: ArchiveMover::new(storage.clone()),
            storage,
            extractor,
            sink,
            table,
            mime_type: mime_type.into(),
            strict_archive: false,
        }
    }

    /// Treat a leftover source object after archiving as a failure.
    pub fn with_strict_archive(mut self, strict: bool) -> Self {
        self.strict_archive = strict;
        self
    }

    /// Fetch, extract and flatten. No side effects.
    pub async fn extract(&self, file: &FileRecord) -> Result<Vec<Record>, FileError> {
        let start = Instant::now();

        let content = self
            .storage
            .download(&file.source_key())
            .await
            .map_err(|source| FileError::Fetch {
                file: file.file_name.clone(),
                source,
            })?;

        let document = self
            .extractor
            .process(&content, &self.mime_type)
            .await
            .map_err(|source| FileError::Extraction {
                file: file.file_name.clone(),
                source,
            })?;

        let records = flatten(&document).map_err(|source| FileError::Flatten {
            file: file.file_name.clone(),
            source,
        })?;

        tracing::info!(
            file = %file.file_name,
            size_bytes = content.len(),
            entities = document.entities.len(),
            records = records.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File extracted"
        );

        Ok(records)
    }

    /// Append the file's records to the warehouse. This is the commit point.
    pub async fn persist(&self, file: &FileRecord, records: &[Record]) -> Result<(), FileError> {
        if records.is_empty() {
            tracing::info!(file = %file.file_name, "No records to persist");
            return Ok(());
        }

        let rows = WarehouseRow::for_file(&file.file_name, records);
        let errors = self
            .sink
            .insert_rows(&self.table, &rows)
            .await
            .map_err(|source| FileError::Persist {
                file: file.file_name.clone(),
                source,
            })?;

        if !errors.is_empty() {
            return Err(FileError::Rejected {
                file: file.file_name.clone(),
                errors,
            });
        }

        tracing::info!(
            file = %file.file_name,
            table = %self.table,
            rows = rows.len(),
            "Records persisted"
        );

        Ok(())
    }

    /// Move a persisted file to the archive prefix.
    pub async fn archive(&self, file: &FileRecord) -> Result<ArchiveOutcome, FileError> {
        let outcome = self.mover.archive(file).await?;
        match outcome {
            ArchiveOutcome::Duplicated { reason } if self.strict_archive => {
                Err(FileError::SourceNotDeleted {
                    file: file.file_name.clone(),
                    reason,
                })
            }
            outcome => Ok(outcome),
        }
    }

    /// Run every stage for one file.
    pub async fn process(&self, file: &FileRecord) -> Result<ProcessedFile, FileError> {
        let records = self.extract(file).await?;
        self.persist(file, &records).await?;
        let archive = self.archive(file).await?;

        Ok(ProcessedFile {
            file_name: file.file_name.clone(),
            records: records.len(),
            archive,
        })
    }
}
