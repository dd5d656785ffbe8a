//! Docflow Core Library
//!
//! This crate provides the domain models, configuration and error metadata
//! shared by every docflow component: the extracted document tree, the flat
//! warehouse records built from it, and the unit of work that moves a file
//! from the inbox prefix to the archive prefix.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, LogFormat, Secret};
pub use error::{error_chain, ErrorMetadata, LogLevel};
pub use models::{Document, Entity, FileRecord, FileStage, Record, TextAnchor, TextSegment};
pub use storage_types::StorageBackend;
