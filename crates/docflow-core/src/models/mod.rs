//! Domain models

pub mod document;
pub mod file;
pub mod record;

pub use document::{Document, Entity, TextAnchor, TextSegment};
pub use file::{FileRecord, FileStage};
pub use record::Record;
