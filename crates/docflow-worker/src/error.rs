use docflow_core::{ErrorMetadata, FileStage, LogLevel};
use docflow_processing::SpanError;
use docflow_services::{ExtractionError, InsertError, WarehouseError};
use docflow_storage::StorageError;
use thiserror::Error;

/// Why one file did not reach `Reported`.
///
/// Display only describes the failing step; the underlying cause is the
/// error source (render both with [`docflow_core::error_chain`]).
#[derive(Error, Debug)]
pub enum FileError {
    #[error("Failed to fetch {file}")]
    Fetch {
        file: String,
        #[source]
        source: StorageError,
    },

    #[error("Extraction failed for {file}")]
    Extraction {
        file: String,
        #[source]
        source: ExtractionError,
    },

    #[error("Failed to flatten {file}")]
    Flatten {
        file: String,
        #[source]
        source: SpanError,
    },

    #[error("Warehouse insert failed for {file}")]
    Persist {
        file: String,
        #[source]
        source: WarehouseError,
    },

    #[error("Warehouse rejected {} row error(s) for {file}: {}", .errors.len(), first_error(.errors))]
    Rejected {
        file: String,
        errors: Vec<InsertError>,
    },

    #[error("Failed to copy {file} to the archive prefix")]
    Archive {
        file: String,
        #[source]
        source: StorageError,
    },

    #[error("Archived {file} but the source object is still present: {reason}")]
    SourceNotDeleted { file: String, reason: String },
}

fn first_error(errors: &[InsertError]) -> String {
    errors
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

impl FileError {
    pub fn file_name(&self) -> &str {
        match self {
            FileError::Fetch { file, .. }
            | FileError::Extraction { file, .. }
            | FileError::Flatten { file, .. }
            | FileError::Persist { file, .. }
            | FileError::Rejected { file, .. }
            | FileError::Archive { file, .. }
            | FileError::SourceNotDeleted { file, .. } => file,
        }
    }

    /// Last stage the file completed before the failure.
    pub fn stage(&self) -> FileStage {
        match self {
            FileError::Fetch { .. } | FileError::Extraction { .. } => FileStage::Pending,
            FileError::Flatten { .. } | FileError::Persist { .. } | FileError::Rejected { .. } => {
                FileStage::Extracted
            }
            FileError::Archive { .. } | FileError::SourceNotDeleted { .. } => FileStage::Persisted,
        }
    }

    /// Records are in the warehouse but the file was not moved out of the inbox.
    pub fn is_persisted(&self) -> bool {
        self.stage() >= FileStage::Persisted
    }
}

impl ErrorMetadata for FileError {
    fn error_code(&self) -> &'static str {
        match self {
            FileError::Fetch { .. } => "FETCH_ERROR",
            FileError::Extraction { .. } => "EXTRACTION_ERROR",
            FileError::Flatten { .. } => "FLATTEN_ERROR",
            FileError::Persist { .. } => "PERSIST_ERROR",
            FileError::Rejected { .. } => "ROWS_REJECTED",
            FileError::Archive { .. } => "ARCHIVE_ERROR",
            FileError::SourceNotDeleted { .. } => "SOURCE_NOT_DELETED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            FileError::Fetch { source, .. } => !matches!(source, StorageError::NotFound(_)),
            FileError::Extraction { source, .. } => match source {
                ExtractionError::Api { status, .. } => *status == 429 || *status >= 500,
                _ => true,
            },
            FileError::Flatten { .. } | FileError::Rejected { .. } => false,
            FileError::Persist { .. } | FileError::Archive { .. } => true,
            FileError::SourceNotDeleted { .. } => true,
        }
    }

    fn log_level(&self) -> LogLevel {
        if let FileError::Fetch {
            source: StorageError::NotFound(_),
            ..
        } = self
        {
            // Gone between listing and fetch, usually archived by an overlapping run.
            LogLevel::Debug
        } else if self.is_persisted() {
            // Warehouse and bucket disagree until someone re-runs the archive step.
            LogLevel::Error
        } else {
            LogLevel::Warn
        }
    }
}
