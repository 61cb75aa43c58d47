//! Progress reporting trait.
//!
//! This module defines the ProgressCallback trait, which decouples the
//! transfer pipeline from any specific UI technology. The CLI provides a
//! stderr implementation; other front-ends can subscribe the same way.

use crate::model::{Stage, TransferReport};

/// Trait for receiving progress updates from a transfer run.
///
/// All methods are called synchronously while the run executes. The item
/// total reported by `on_run_started` is fixed for the whole run; within a
/// stage, `completed` increases by exactly one per processed item (failed
/// items included), so a UI can render a monotonic bar.
pub trait ProgressCallback: Send {
    /// Called once before any item is processed.
    fn on_run_started(&self, total_items: usize);

    /// Called when a stage begins, with the number of items it will see.
    fn on_stage_started(&self, stage: Stage, item_count: usize);

    /// Called after each item finishes a stage, successfully or not.
    fn on_item_completed(&self, stage: Stage, completed: usize, total: usize, name: &str);

    /// Called when an item fails a stage (or falls back, for conversion).
    fn on_item_failed(&self, stage: Stage, name: &str, reason: &str);

    /// Called once when the run is complete and the report is final.
    fn on_run_completed(&self, report: &TransferReport);
}
