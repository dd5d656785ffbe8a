use chrono::{DateTime, Utc};
use docflow_core::FileStage;
use serde::Serialize;
use uuid::Uuid;

/// A file that did not reach `Reported`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub file_name: String,
    /// Last stage the file completed.
    pub stage: FileStage,
    pub error_code: String,
    pub error: String,
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// PDF files found under the source prefix.
    pub candidates: usize,
    /// Files that reached `Reported`, in discovery order.
    pub processed: Vec<String>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    /// JSON array of processed file names.
    pub fn payload(&self) -> String {
        serde_json::Value::from(self.processed.clone()).to_string()
    }

    /// Non-zero only when there was work and none of it succeeded.
    pub fn exit_code(&self) -> i32 {
        if self.candidates > 0 && self.processed.is_empty() {
            1
        } else {
            0
        }
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
