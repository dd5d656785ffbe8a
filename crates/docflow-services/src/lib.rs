//! Docflow Services Library
//!
//! Remote collaborators of the pipeline: the Document AI extractor, the
//! BigQuery sink and the OAuth token providers they authenticate with.
//! The worker only sees the [`DocumentExtractor`] and [`WarehouseSink`]
//! traits so tests can swap in in-memory doubles.

pub mod auth;
pub mod bigquery;
pub mod document_ai;
pub mod traits;

pub use auth::{AuthError, MetadataTokenProvider, StaticTokenProvider, TokenProvider};
pub use bigquery::BigQuerySink;
pub use document_ai::DocumentAiClient;
pub use traits::{
    DocumentExtractor, ExtractionError, InsertError, TableRef, WarehouseError, WarehouseRow,
    WarehouseSink,
};
