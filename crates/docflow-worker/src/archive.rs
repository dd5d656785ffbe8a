use crate::error::FileError;
use docflow_core::{error_chain, FileRecord};
use docflow_storage::{Storage, StorageError};
use serde::Serialize;
use std::sync::Arc;

/// Result of moving a file from the inbox prefix to the archive prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ArchiveOutcome {
    /// Copied and the source removed.
    Moved,
    /// Copied, but the source object could not be deleted.
    Duplicated { reason: String },
}

impl ArchiveOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, ArchiveOutcome::Moved)
    }
}

/// Copy-then-delete move inside one bucket.
#[derive(Clone)]
pub struct ArchiveMover {
    storage: Arc<dyn Storage>,
}

impl ArchiveMover {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Safe to call again for a file whose records are already persisted.
    pub async fn archive(&self, file: &FileRecord) -> Result<ArchiveOutcome, FileError> {
        let source_key = file.source_key();
        let destination_key = file.destination_key();

        self.storage
            .copy(&source_key, &destination_key)
            .await
            .map_err(|source| FileError::Archive {
                file: file.file_name.clone(),
                source,
            })?;

        match self.storage.delete(&source_key).await {
            Err(StorageError::NotFound(_)) => {
                // Already removed by someone else; only the archive copy is left.
                tracing::info!(
                    file = %file.file_name,
                    bucket = %file.bucket,
                    source_key = %source_key,
                    "Source already gone after archive copy"
                );
                Ok(ArchiveOutcome::Moved)
            }
            Ok(()) => {
                tracing::info!(
                    file = %file.file_name,
                    bucket = %file.bucket,
                    from = %file.source_prefix,
                    to = %file.destination_prefix,
                    "File moved to archive prefix"
                );
                Ok(ArchiveOutcome::Moved)
            }
            Err(e) => {
                let reason = error_chain(&e);
                tracing::warn!(
                    file = %file.file_name,
                    bucket = %file.bucket,
                    source_key = %source_key,
                    error = %reason,
                    "Archive copy written but source not deleted"
                );
                Ok(ArchiveOutcome::Duplicated { reason })
            }
        }
    }
}
