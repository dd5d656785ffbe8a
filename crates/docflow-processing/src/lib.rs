//! Docflow Processing Library
//!
//! Pure transformations over an extracted [`Document`](docflow_core::Document):
//! resolving text anchors into literal text and flattening the two-level
//! entity tree into warehouse records. Nothing here performs I/O.

pub mod flatten;
pub mod span;

pub use flatten::{flatten, FlattenState};
pub use span::{resolve, DocumentText, SpanError};
