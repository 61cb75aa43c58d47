//! Core data model for transfer runs.
//!
//! This module defines the main data structures for representing one
//! transfer run:
//! - RunContext: container names and options, created fresh per run
//! - WorkItem: a single selected object moving through the pipeline
//! - TransferReport: per-item outcomes plus aggregate accounting
//! - Stage, VerificationOutcome: enums describing dispositions

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Fixed top-level path segment every upload lands under.
pub const DESTINATION_PREFIX: &str = "raw_data";

/// Extensions listed from the source store by default.
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["csv", "json", "parquet"];

/// An object enumerated from the source store.
///
/// Immutable once listed; identity is the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteObject {
    /// Full path/name of the object in the source store
    pub key: String,

    /// Object size in bytes
    pub size_bytes: u64,
}

impl RemoteObject {
    /// Size in mebibytes, rounded to two decimals for display.
    pub fn size_megabytes(&self) -> f64 {
        (self.size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
    }

    /// Base name of the key (final `/`-separated segment).
    pub fn file_name(&self) -> &str {
        object_base_name(&self.key)
    }
}

/// Options controlling one transfer run. Immutable for the run's duration.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TransferOptions {
    /// Convert CSV/JSON inputs to Parquet before uploading
    pub convert_to_parquet: bool,

    /// Compare local and remote MD5 digests after uploading
    pub verify_checksum: bool,
}

/// Everything a run needs beyond the two store handles.
///
/// Created fresh per run and never retained across runs; the store
/// connection handles are the only state deliberately reused between
/// listing and transfer.
#[derive(Debug, Clone, Serialize)]
pub struct RunContext {
    /// Source bucket to fetch from
    pub source_bucket: String,

    /// Destination container to write into
    pub dest_container: String,

    /// Transfer options for this run
    pub options: TransferOptions,
}

impl RunContext {
    pub fn new(source_bucket: &str, dest_container: &str, options: TransferOptions) -> Self {
        RunContext {
            source_bucket: source_bucket.to_string(),
            dest_container: dest_container.to_string(),
            options,
        }
    }
}

/// Pipeline stage, used to attribute failures and progress events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Download,
    Convert,
    Upload,
    Verify,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Download => write!(f, "download"),
            Stage::Convert => write!(f, "convert"),
            Stage::Upload => write!(f, "upload"),
            Stage::Verify => write!(f, "verify"),
        }
    }
}

/// A single selected object as it moves through the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct WorkItem {
    /// Unique identifier for this item within the run
    pub id: Uuid,

    /// Key of the object in the source store
    pub source_key: String,

    /// Local path of the file that will be uploaded; switches to the
    /// converted file when conversion succeeds
    pub local_path: PathBuf,

    /// File name at the destination; extension replaced with `.parquet`
    /// on successful conversion, unchanged otherwise
    pub remote_file_name: String,

    /// True when the uploaded bytes are the converted Parquet file
    pub converted: bool,

    /// Set when conversion was attempted and fell back to the original
    pub conversion_warning: Option<String>,
}

impl WorkItem {
    /// New item for `source_key`, downloaded to `local_path`. The remote
    /// file name starts as the key's base name.
    pub fn new(source_key: &str, local_path: PathBuf) -> Self {
        WorkItem {
            id: Uuid::new_v4(),
            source_key: source_key.to_string(),
            local_path,
            remote_file_name: object_base_name(source_key).to_string(),
            converted: false,
            conversion_warning: None,
        }
    }

    /// Destination path: `raw_data/<remote_file_name>`. Flat single-level
    /// placement; source key hierarchy is not recreated.
    pub fn remote_path(&self) -> String {
        format!("{}/{}", DESTINATION_PREFIX, self.remote_file_name)
    }
}

/// One (name, reason) failure record.
#[derive(Debug, Clone, Serialize)]
pub struct ItemError {
    /// Source key (preparation) or remote file name (upload)
    pub name: String,

    /// Human-readable failure reason
    pub reason: String,
}

impl ItemError {
    pub fn new(name: &str, reason: String) -> Self {
        ItemError { name: name.to_string(), reason }
    }
}

/// Result of verifying one uploaded file.
#[derive(Debug, Clone, Serialize)]
pub enum VerificationOutcome {
    /// Both digests were computed and compared
    Verified {
        file_name: String,
        local_digest: String,
        remote_digest: String,
        matched: bool,
    },

    /// Either digest computation failed
    Failed { file_name: String, reason: String },
}

impl VerificationOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            Self::Verified { file_name, .. } | Self::Failed { file_name, .. } => file_name,
        }
    }

    /// True only for a successful comparison with equal digests.
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Verified { matched: true, .. })
    }
}

/// Aggregate outcome of one transfer run.
///
/// Lists hold per-item records; counts are derived, never stored.
#[derive(Debug, Serialize)]
pub struct TransferReport {
    /// Unique identifier for this run
    pub run_id: Uuid,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished (None while still executing)
    pub finished_at: Option<DateTime<Utc>>,

    /// Items that survived the preparation phase (downloaded, possibly
    /// converted) in selection order
    pub prepared: Vec<WorkItem>,

    /// Prepared items that were written to the destination
    pub uploaded: Vec<WorkItem>,

    /// One outcome per uploaded item when verification was enabled
    pub verified: Vec<VerificationOutcome>,

    /// (source key, reason) for items that failed preparation
    pub preparation_errors: Vec<ItemError>,

    /// (remote file name, reason) for items that failed upload
    pub upload_errors: Vec<ItemError>,

    /// Non-fatal conditions: conversion fallbacks, cleanup failures
    pub warnings: Vec<String>,

    /// Total bytes written to the destination
    pub total_bytes_uploaded: u64,
}

impl TransferReport {
    pub fn new() -> Self {
        TransferReport {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            prepared: Vec::new(),
            uploaded: Vec::new(),
            verified: Vec::new(),
            preparation_errors: Vec::new(),
            upload_errors: Vec::new(),
            warnings: Vec::new(),
            total_bytes_uploaded: 0,
        }
    }

    /// Items that reached the destination.
    pub fn uploaded_count(&self) -> usize {
        self.uploaded.len()
    }

    /// Items that failed at any stage.
    pub fn failed_count(&self) -> usize {
        self.preparation_errors.len() + self.upload_errors.len()
    }

    /// Verification outcomes whose digests differ or could not be computed.
    pub fn verification_failures(&self) -> usize {
        self.verified.iter().filter(|v| !v.is_match()).count()
    }

    /// True when every item uploaded and, if verified, every digest matched.
    pub fn is_fully_successful(&self) -> bool {
        self.failed_count() == 0 && self.verification_failures() == 0
    }
}

impl Default for TransferReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Base name of an object key: the final `/`-separated segment.
pub fn object_base_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
