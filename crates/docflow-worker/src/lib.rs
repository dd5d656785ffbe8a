//! Docflow Worker Library
//!
//! Drives inbox files through extract → flatten → persist → archive.
//! [`BatchRunner`] discovers the candidate files and hands each one to a
//! [`FileProcessor`]; a failing file is recorded and skipped, the others keep
//! going.
//!
//! The warehouse insert is the commit point of a file. Archiving happens
//! only after it succeeds and can be re-run on its own through
//! [`ArchiveMover`].

pub mod archive;
pub mod error;
pub mod processor;
pub mod report;
pub mod runner;

pub use archive::{ArchiveMover, ArchiveOutcome};
pub use error::FileError;
pub use processor::{FileProcessor, ProcessedFile};
pub use report::{BatchReport, FileFailure};
pub use runner::{BatchRunner, RunnerSettings};
