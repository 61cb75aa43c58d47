//! # LakeSync Engine - Object Transfer Library
//!
//! A headless engine for copying selected objects from a source object
//! store into a data-lake destination, with optional Parquet conversion
//! and optional end-to-end checksum verification.
//!
//! ## Overview
//!
//! The engine provides a core library for one-shot transfer runs.
//! It features:
//! - Per-item state tracking and error isolation (one failing object never
//!   aborts the run)
//! - Best-effort CSV/JSON to Parquet conversion with encoding fallback
//! - Streamed MD5 comparison between local files and uploaded objects
//! - A scoped temporary workspace removed on every exit path
//! - Progress reporting via callbacks (decoupled from UI technology)
//!
//! ## Basic Usage
//!
//! ```no_run
//! use engine::{run_transfer, DirSourceStore, DirDestinationStore, RunContext, TransferOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = DirSourceStore::new("/srv/source");
//! let dest = DirDestinationStore::new("/srv/lake");
//!
//! let ctx = RunContext::new(
//!     "data",
//!     "analytics",
//!     TransferOptions { convert_to_parquet: true, verify_checksum: true },
//! );
//!
//! let selection = vec!["exports/sales.csv".to_string()];
//! let report = run_transfer(&ctx, &source, &dest, &selection, None)?;
//!
//! println!(
//!     "{} uploaded, {} failed",
//!     report.uploaded_count(),
//!     report.failed_count()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: Core data structures (RunContext, WorkItem, TransferReport)
//! - **error**: Error types and handling
//! - **checksums**: Streamed MD5 digests for verification
//! - **convert**: CSV/JSON to Parquet conversion
//! - **workspace**: Scoped temporary directory management
//! - **store**: Source/destination store contracts and directory-backed stores
//! - **pipeline**: Run orchestration (download, convert, upload, verify)
//! - **progress**: Progress callback trait

pub mod checksums;
pub mod convert;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod store;
pub mod workspace;

// Re-export main types and functions
pub use checksums::{digest_file, digest_reader, DIGEST_CHUNK_SIZE};
pub use convert::{convert_to_parquet, ConversionReport, PARQUET_EXTENSION};
pub use error::{ConvertError, HashError, PipelineError, StoreError};
pub use model::{
    ItemError, RemoteObject, RunContext, Stage, TransferOptions, TransferReport,
    VerificationOutcome, WorkItem, DEFAULT_EXTENSIONS, DESTINATION_PREFIX,
};
pub use pipeline::run_transfer;
pub use progress::ProgressCallback;
pub use store::{
    DestinationStore, DirDestinationStore, DirSourceStore, DirectoryStatus, SourceStore,
};
pub use workspace::Workspace;
