//! In-memory doubles for the pipeline collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use docflow_core::{Document, Entity, Record};
use docflow_services::{
    DocumentExtractor, ExtractionError, InsertError, TableRef, WarehouseError, WarehouseRow,
    WarehouseSink,
};
use docflow_storage::{Storage, StorageBackend, StorageError, StorageResult};
use docflow_worker::{BatchRunner, FileProcessor, RunnerSettings};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BUCKET: &str = "polizas";
pub const SOURCE: &str = "entrada";
pub const DESTINATION: &str = "procesados";

/// Bucket kept in a sorted map; selected operations can be made to fail.
#[derive(Clone, Default)]
pub struct MockStorage {
    objects: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    failing_downloads: Arc<Mutex<HashSet<String>>>,
    failing_copies: Arc<Mutex<HashSet<String>>>,
    failing_deletes: Arc<Mutex<HashSet<String>>>,
    vanishing: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn fail_download_of(&self, key: &str) {
        self.failing_downloads
            .lock()
            .unwrap()
            .insert(key.to_string());
    }

    pub fn fail_copy_from(&self, key: &str) {
        self.failing_copies.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_delete_of(&self, key: &str) {
        self.failing_deletes.lock().unwrap().insert(key.to_string());
    }

    /// `key` disappears just before its delete lands, as when another run
    /// archived it first.
    pub fn vanish_before_delete(&self, key: &str) {
        self.vanishing.lock().unwrap().insert(key.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing_downloads.lock().unwrap().clear();
        self.failing_copies.lock().unwrap().clear();
        self.failing_deletes.lock().unwrap().clear();
    }

    /// Mutating calls (`copy`, `delete`, `upload`) in order.
    pub fn mutations(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let dir = format!("{}/", prefix.trim_matches('/'));
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(&dir) && !k[dir.len()..].contains('/'))
            .cloned()
            .collect())
    }

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        if self.failing_downloads.lock().unwrap().contains(key) {
            return Err(StorageError::DownloadFailed("connection reset".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn upload_with_key(&self, key: &str, data: Vec<u8>, _content_type: &str) -> StorageResult<()> {
        self.calls.lock().unwrap().push(format!("upload {}", key));
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.calls.lock().unwrap().push(format!("delete {}", key));
        if self.failing_deletes.lock().unwrap().contains(key) {
            return Err(StorageError::DeleteFailed("permission denied".to_string()));
        }
        if self.vanishing.lock().unwrap().contains(key) {
            self.objects.lock().unwrap().remove(key);
        }
        self.objects
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.contains(key))
    }

    async fn copy(&self, from: &str, to: &str) -> StorageResult<()> {
        self.calls.lock().unwrap().push(format!("copy {} {}", from, to));
        if self.failing_copies.lock().unwrap().contains(from) {
            return Err(StorageError::CopyFailed("backend unavailable".to_string()));
        }
        let mut objects = self.objects.lock().unwrap();
        let data = objects
            .get(from)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(from.to_string()))?;
        objects.insert(to.to_string(), data);
        Ok(())
    }

    fn bucket(&self) -> &str {
        BUCKET
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Returns the document registered for a file's bytes; unknown content fails
/// like a rejected request.
#[derive(Clone, Default)]
pub struct MockExtractor {
    documents: Arc<Mutex<HashMap<Vec<u8>, Document>>>,
    calls: Arc<Mutex<usize>>,
    delay_for: Arc<Mutex<HashMap<Vec<u8>, Duration>>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, content: &[u8], document: Document) {
        self.documents
            .lock()
            .unwrap()
            .insert(content.to_vec(), document);
    }

    pub fn delay(&self, content: &[u8], delay: Duration) {
        self.delay_for
            .lock()
            .unwrap()
            .insert(content.to_vec(), delay);
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl DocumentExtractor for MockExtractor {
    async fn process(&self, content: &[u8], _mime_type: &str) -> Result<Document, ExtractionError> {
        *self.calls.lock().unwrap() += 1;
        let delay = self.delay_for.lock().unwrap().get(content).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let document = self.documents.lock().unwrap().get(content).cloned();
        document.ok_or(ExtractionError::Api {
            status: 400,
            body: "Unsupported input file format.".to_string(),
        })
    }
}

/// Records every insert; can reject the rows of one file or fail its
/// request outright.
#[derive(Clone, Default)]
pub struct MockSink {
    inserted: Arc<Mutex<Vec<WarehouseRow>>>,
    calls: Arc<Mutex<usize>>,
    reject_file: Arc<Mutex<Option<String>>>,
    unavailable_for: Arc<Mutex<Option<String>>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_rows_of(&self, file_name: &str) {
        *self.reject_file.lock().unwrap() = Some(file_name.to_string());
    }

    pub fn fail_request_for(&self, file_name: &str) {
        *self.unavailable_for.lock().unwrap() = Some(file_name.to_string());
    }

    pub fn rows(&self) -> Vec<WarehouseRow> {
        self.inserted.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl WarehouseSink for MockSink {
    async fn insert_rows(
        &self,
        _table: &TableRef,
        rows: &[WarehouseRow],
    ) -> Result<Vec<InsertError>, WarehouseError> {
        *self.calls.lock().unwrap() += 1;
        let unavailable = self.unavailable_for.lock().unwrap().clone();
        if let Some(file) = unavailable {
            let first_id = WarehouseRow::insert_id(&file, 0);
            if rows.iter().any(|r| r.insert_id == first_id) {
                return Err(WarehouseError::Api {
                    status: 503,
                    body: "Backend Error".to_string(),
                });
            }
        }
        let reject = self.reject_file.lock().unwrap().clone();
        if let Some(file) = reject {
            let first_id = WarehouseRow::insert_id(&file, 0);
            if rows.iter().any(|r| r.insert_id == first_id) {
                return Ok(vec![InsertError {
                    index: 0,
                    reason: "invalid".to_string(),
                    message: "no such field: monto.".to_string(),
                }]);
            }
        }
        self.inserted.lock().unwrap().extend_from_slice(rows);
        Ok(Vec::new())
    }
}

pub struct Harness {
    pub storage: MockStorage,
    pub extractor: MockExtractor,
    pub sink: MockSink,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            storage: MockStorage::new(),
            extractor: MockExtractor::new(),
            sink: MockSink::new(),
        }
    }

    /// Put `entrada/{name}` with its name as content and register a one-item
    /// invoice for it.
    pub fn add_invoice(&self, name: &str, amount: &str) {
        self.storage.put(&source_key(name), name.as_bytes());
        self.extractor.register(name.as_bytes(), invoice(amount));
    }

    /// Put `entrada/{name}` without a registered document: extraction fails.
    pub fn add_unreadable(&self, name: &str) {
        self.storage.put(&source_key(name), name.as_bytes());
    }

    pub fn processor(&self, strict_archive: bool) -> FileProcessor {
        FileProcessor::new(
            Arc::new(self.storage.clone()),
            Arc::new(self.extractor.clone()),
            Arc::new(self.sink.clone()),
            TableRef::new("p", "d", "t"),
            "application/pdf",
        )
        .with_strict_archive(strict_archive)
    }

    pub fn runner(&self, max_concurrent_files: usize, strict_archive: bool) -> BatchRunner {
        BatchRunner::new(
            Arc::new(self.storage.clone()),
            Arc::new(self.processor(strict_archive)),
            RunnerSettings {
                bucket: BUCKET.to_string(),
                source_prefix: SOURCE.to_string(),
                destination_prefix: DESTINATION.to_string(),
                max_concurrent_files,
            },
        )
    }
}

pub fn source_key(name: &str) -> String {
    format!("{}/{}", SOURCE, name)
}

pub fn destination_key(name: &str) -> String {
    format!("{}/{}", DESTINATION, name)
}

pub fn invoice(amount: &str) -> Document {
    Document::new(
        "",
        vec![
            Entity::leaf("fecha", "2024-01-01"),
            Entity::composite(
                "item",
                vec![Entity::leaf("monto", amount), Entity::leaf("desc", "agua")],
            ),
        ],
    )
}

pub fn record(pairs: &[(&str, &str)]) -> Record {
    pairs.iter().copied().collect()
}
