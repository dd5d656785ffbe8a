use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Lifecycle of one inbox file.
///
/// A file only becomes `Archived` after `Persisted`, and only counts as
/// processed once `Reported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStage {
    Pending,
    Extracted,
    Persisted,
    Archived,
    Reported,
}

impl FileStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStage::Pending => "pending",
            FileStage::Extracted => "extracted",
            FileStage::Persisted => "persisted",
            FileStage::Archived => "archived",
            FileStage::Reported => "reported",
        }
    }
}

impl Display for FileStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Identifies one unit of work: a file under the source prefix of a bucket
/// and where it goes once processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub bucket: String,
    pub source_prefix: String,
    pub destination_prefix: String,
    pub file_name: String,
}

impl FileRecord {
    pub fn new(
        bucket: impl Into<String>,
        source_prefix: impl Into<String>,
        destination_prefix: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            source_prefix: source_prefix.into(),
            destination_prefix: destination_prefix.into(),
            file_name: file_name.into(),
        }
    }

    /// `{source_prefix}/{file_name}`
    pub fn source_key(&self) -> String {
        join_key(&self.source_prefix, &self.file_name)
    }

    /// `{destination_prefix}/{file_name}`
    pub fn destination_key(&self) -> String {
        join_key(&self.destination_prefix, &self.file_name)
    }
}

fn join_key(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", prefix, file_name)
    }
}
