//! Transfer run orchestration.
//!
//! Drives the per-item sequence download, optional conversion, upload, and
//! optional verification, with per-item error isolation: one failing item
//! never aborts the run, it is recorded in the report and processing moves
//! to the next item. Items are processed sequentially; the network calls
//! into the two stores are the only blocking operations.
//!
//! The temporary workspace holding downloaded and converted files is
//! removed exactly once at the end of the run, on every path.

use std::fs;
use std::path::Path;

use chrono::Utc;
use tracing::{debug, warn};

use crate::checksums::{self, DIGEST_CHUNK_SIZE};
use crate::convert::{self, PARQUET_EXTENSION};
use crate::error::PipelineError;
use crate::model::{
    object_base_name, ItemError, RunContext, Stage, TransferReport, VerificationOutcome,
    WorkItem, DESTINATION_PREFIX,
};
use crate::progress::ProgressCallback;
use crate::store::{DestinationStore, SourceStore};
use crate::workspace::Workspace;

/// Execute one transfer run over `selection`.
///
/// Both store handles must already be connected; pre-condition checks
/// (credentials, container names) belong to the caller. The returned
/// report carries every item's disposition — the only errors returned
/// here are an empty selection and workspace allocation failure.
pub fn run_transfer(
    ctx: &RunContext,
    source: &dyn SourceStore,
    dest: &dyn DestinationStore,
    selection: &[String],
    progress: Option<&dyn ProgressCallback>,
) -> Result<TransferReport, PipelineError> {
    if selection.is_empty() {
        return Err(PipelineError::EmptySelection);
    }

    // Fresh workspace per run; never reused, so no stale files leak
    // between runs.
    let workspace = Workspace::open(None)?;
    debug!(workspace = %workspace.path().display(), items = selection.len(), "run started");

    let mut report = TransferReport::new();
    if let Some(cb) = progress {
        cb.on_run_started(selection.len());
    }

    prepare_items(ctx, source, selection, &workspace, &mut report, progress);
    upload_items(ctx, dest, &mut report, progress);
    if ctx.options.verify_checksum && !report.uploaded.is_empty() {
        verify_items(ctx, dest, &mut report, progress);
    }

    if let Err(e) = workspace.close() {
        let message = format!("could not remove temporary workspace: {}", e);
        warn!("{}", message);
        report.warnings.push(message);
    }

    report.finished_at = Some(Utc::now());
    if let Some(cb) = progress {
        cb.on_run_completed(&report);
    }
    Ok(report)
}

/// Download each selected object and optionally convert it. Failed items
/// land in `preparation_errors` and are excluded from all later stages.
fn prepare_items(
    ctx: &RunContext,
    source: &dyn SourceStore,
    selection: &[String],
    workspace: &Workspace,
    report: &mut TransferReport,
    progress: Option<&dyn ProgressCallback>,
) {
    let total = selection.len();
    if let Some(cb) = progress {
        cb.on_stage_started(Stage::Download, total);
    }

    for (index, key) in selection.iter().enumerate() {
        let local_path = workspace.allocate(object_base_name(key));

        if let Err(e) = source.fetch(&ctx.source_bucket, key, &local_path) {
            let reason = e.to_string();
            if let Some(cb) = progress {
                cb.on_item_failed(Stage::Download, key, &reason);
                cb.on_item_completed(Stage::Download, index + 1, total, key);
            }
            report.preparation_errors.push(ItemError::new(key, reason));
            continue;
        }

        let mut item = WorkItem::new(key, local_path);
        if ctx.options.convert_to_parquet && is_convertible(&item.remote_file_name) {
            try_convert(&mut item, workspace, report, progress);
        }

        report.prepared.push(item);
        if let Some(cb) = progress {
            cb.on_item_completed(Stage::Download, index + 1, total, key);
        }
    }
}

fn is_convertible(file_name: &str) -> bool {
    matches!(
        convert::file_extension(Path::new(file_name)).as_str(),
        "csv" | "json"
    )
}

/// Convert the downloaded file in place, best-effort: on failure the item
/// keeps the original file and the failure becomes a warning.
fn try_convert(
    item: &mut WorkItem,
    workspace: &Workspace,
    report: &mut TransferReport,
    progress: Option<&dyn ProgressCallback>,
) {
    let parquet_name = replace_extension(&item.remote_file_name, PARQUET_EXTENSION);
    let parquet_path = workspace.allocate(&parquet_name);

    match convert::convert_to_parquet(&item.local_path, &parquet_path) {
        Ok(conversion) => {
            debug!(
                key = %item.source_key,
                input_bytes = conversion.input_size_bytes,
                output_bytes = conversion.output_size_bytes,
                "converted to parquet"
            );

            let original = std::mem::replace(&mut item.local_path, parquet_path);
            item.remote_file_name = parquet_name;
            item.converted = true;

            // The original download is dead weight now; a failed removal
            // must not fail the item but is surfaced, not swallowed.
            if let Err(e) = fs::remove_file(&original) {
                let message = format!(
                    "could not remove original file after conversion: {}: {}",
                    original.display(),
                    e
                );
                warn!("{}", message);
                report.warnings.push(message);
            }
        }
        Err(e) => {
            let reason = e.to_string();
            warn!(key = %item.source_key, "conversion failed, uploading original: {}", reason);
            if let Some(cb) = progress {
                cb.on_item_failed(Stage::Convert, &item.source_key, &reason);
            }
            report
                .warnings
                .push(format!("{}: conversion failed, uploading original - {}", item.source_key, reason));
            item.conversion_warning = Some(reason);
        }
    }
}

/// Upload every prepared item under the fixed destination prefix.
fn upload_items(
    ctx: &RunContext,
    dest: &dyn DestinationStore,
    report: &mut TransferReport,
    progress: Option<&dyn ProgressCallback>,
) {
    if report.prepared.is_empty() {
        return;
    }

    let prepared = report.prepared.clone();
    let total = prepared.len();
    if let Some(cb) = progress {
        cb.on_stage_started(Stage::Upload, total);
    }

    if let Err(e) = dest.ensure_directory(&ctx.dest_container, DESTINATION_PREFIX) {
        // No destination directory means nothing can land; every prepared
        // item keeps an observable disposition.
        let reason = e.to_string();
        for (index, item) in prepared.iter().enumerate() {
            if let Some(cb) = progress {
                cb.on_item_failed(Stage::Upload, &item.remote_file_name, &reason);
                cb.on_item_completed(Stage::Upload, index + 1, total, &item.remote_file_name);
            }
            report
                .upload_errors
                .push(ItemError::new(&item.remote_file_name, reason.clone()));
        }
        return;
    }

    for (index, item) in prepared.iter().enumerate() {
        let remote_path = item.remote_path();
        match dest.write(&ctx.dest_container, &item.local_path, &remote_path) {
            Ok(bytes) => {
                debug!(file = %item.remote_file_name, bytes, "uploaded");
                report.total_bytes_uploaded += bytes;
                report.uploaded.push(item.clone());
            }
            Err(e) => {
                let reason = e.to_string();
                if let Some(cb) = progress {
                    cb.on_item_failed(Stage::Upload, &item.remote_file_name, &reason);
                }
                report
                    .upload_errors
                    .push(ItemError::new(&item.remote_file_name, reason));
            }
        }
        if let Some(cb) = progress {
            cb.on_item_completed(Stage::Upload, index + 1, total, &item.remote_file_name);
        }
    }
}

/// Compare local and remote digests for every uploaded item. Runs after
/// the whole upload batch so a slow remote digest never delays uploads.
fn verify_items(
    ctx: &RunContext,
    dest: &dyn DestinationStore,
    report: &mut TransferReport,
    progress: Option<&dyn ProgressCallback>,
) {
    let uploaded = report.uploaded.clone();
    let total = uploaded.len();
    if let Some(cb) = progress {
        cb.on_stage_started(Stage::Verify, total);
    }

    for (index, item) in uploaded.iter().enumerate() {
        let outcome = verify_one(ctx, dest, item);
        if !outcome.is_match() {
            let reason = match &outcome {
                VerificationOutcome::Verified { .. } => "checksum mismatch".to_string(),
                VerificationOutcome::Failed { reason, .. } => reason.clone(),
            };
            if let Some(cb) = progress {
                cb.on_item_failed(Stage::Verify, &item.remote_file_name, &reason);
            }
        }

        report.verified.push(outcome);
        if let Some(cb) = progress {
            cb.on_item_completed(Stage::Verify, index + 1, total, &item.remote_file_name);
        }
    }
}

/// Digest the final local file and the freshly uploaded object with the
/// same chunk size so the two hex strings are directly comparable.
fn verify_one(
    ctx: &RunContext,
    dest: &dyn DestinationStore,
    item: &WorkItem,
) -> VerificationOutcome {
    let local_digest = match checksums::digest_file(&item.local_path, DIGEST_CHUNK_SIZE) {
        Ok(digest) => digest,
        Err(e) => {
            return VerificationOutcome::Failed {
                file_name: item.remote_file_name.clone(),
                reason: format!("local digest: {}", e),
            };
        }
    };

    let remote_digest =
        match dest.remote_digest(&ctx.dest_container, &item.remote_path(), DIGEST_CHUNK_SIZE) {
            Ok(digest) => digest,
            Err(e) => {
                return VerificationOutcome::Failed {
                    file_name: item.remote_file_name.clone(),
                    reason: format!("remote digest: {}", e),
                };
            }
        };

    let matched = local_digest == remote_digest;
    VerificationOutcome::Verified {
        file_name: item.remote_file_name.clone(),
        local_digest,
        remote_digest,
        matched,
    }
}

/// Swap the extension of `file_name` (or append one if it has none).
fn replace_extension(file_name: &str, extension: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) => format!("{}.{}", stem, extension),
        None => format!("{}.{}", file_name, extension),
    }
}
