use crate::auth::AuthError;
use async_trait::async_trait;
use docflow_core::{Document, Record};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Extraction request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Extraction API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Extraction response missing document")]
    MissingDocument,
}

#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Warehouse request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Warehouse API returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Turns raw file bytes into a structured [`Document`].
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn process(&self, content: &[u8], mime_type: &str) -> Result<Document, ExtractionError>;
}

/// Fully qualified warehouse table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableRef {
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            table_id: table_id.into(),
        }
    }
}

impl Display for TableRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

/// One row to append, with the id used for best-effort de-duplication.
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseRow {
    pub insert_id: String,
    pub record: Record,
}

/// Hex characters of the file-name digest kept in an insert id.
const INSERT_ID_DIGEST_LEN: usize = 16;

impl WarehouseRow {
    /// Id of the `index`-th row of a file: `{digest}:{index}`, where the
    /// digest is a SHA-256 prefix of the file name. Stays well under the
    /// 128-character `insertId` limit for any object name.
    pub fn insert_id(file_name: &str, index: usize) -> String {
        let digest = hex::encode(Sha256::digest(file_name.as_bytes()));
        format!("{}:{}", &digest[..INSERT_ID_DIGEST_LEN], index)
    }

    pub fn for_file(file_name: &str, records: &[Record]) -> Vec<WarehouseRow> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| WarehouseRow {
                insert_id: Self::insert_id(file_name, index),
                record: record.clone(),
            })
            .collect()
    }
}

/// Per-row rejection reported by the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertError {
    pub index: u64,
    pub reason: String,
    pub message: String,
}

impl Display for InsertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "row {}: {} ({})", self.index, self.message, self.reason)
    }
}

/// Append-only destination for flattened records.
#[async_trait]
pub trait WarehouseSink: Send + Sync {
    /// An empty result means every row was accepted.
    async fn insert_rows(
        &self,
        table: &TableRef,
        rows: &[WarehouseRow],
    ) -> Result<Vec<InsertError>, WarehouseError>;
}
