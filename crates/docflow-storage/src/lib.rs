//! Docflow Storage Library
//!
//! Object storage abstraction for the inbox/archive bucket. A [`Storage`]
//! value is bound to one bucket; keys are `{prefix}/{file_name}` paths inside
//! it.
//!
//! Keys must not contain `..` or a leading `/`. Key helpers live in the
//! `keys` module so all backends agree on the layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-gcs")]
pub mod gcs;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use docflow_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-gcs")]
pub use gcs::GcsStorage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
