//! LakeSync - Command-line interface for the object transfer engine.
//!
//! This is a simple CLI for testing and manual use of the transfer engine.
//! It provides argument parsing, progress reporting to stderr, and an
//! optional JSON dump of the final report.

use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use engine::{
    run_transfer, DestinationStore, DirDestinationStore, DirSourceStore, ProgressCallback,
    RunContext, SourceStore, Stage, TransferOptions, TransferReport, VerificationOutcome,
    DEFAULT_EXTENSIONS,
};

/// LakeSync - copy object-store files into a data lake
#[derive(Parser, Debug)]
#[command(name = "lakesync")]
#[command(version = "0.1.0")]
#[command(about = "Copy objects into a data lake with optional Parquet conversion and verification")]
struct Args {
    /// Root directory of the source store (buckets are subdirectories)
    #[arg(long, value_name = "PATH")]
    source_root: PathBuf,

    /// Source bucket name
    #[arg(long, value_name = "NAME")]
    bucket: String,

    /// Root directory of the destination store (containers are subdirectories)
    #[arg(long, value_name = "PATH")]
    dest_root: PathBuf,

    /// Destination container name
    #[arg(long, value_name = "NAME")]
    container: String,

    /// Object key to transfer (repeatable); all listed objects when omitted
    #[arg(long = "key", value_name = "KEY")]
    keys: Vec<String>,

    /// List matching objects and exit without transferring
    #[arg(long)]
    list: bool,

    /// Convert CSV/JSON files to Parquet before upload
    #[arg(long)]
    convert: bool,

    /// Verify checksums (MD5) after upload
    #[arg(long)]
    verify: bool,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(long)]
    verbose: bool,
}

/// CLI implementation of ProgressCallback for displaying transfer progress
struct CliProgress {
    verbose: bool,
    start_time: Instant,
}

impl CliProgress {
    fn new(verbose: bool) -> Self {
        CliProgress { verbose, start_time: Instant::now() }
    }

    fn format_bytes(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_idx = 0;

        while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
            size /= 1024.0;
            unit_idx += 1;
        }

        format!("{:.2} {}", size, UNITS[unit_idx])
    }

    fn progress_bar(completed: usize, total: usize) -> String {
        let percent = if total == 0 { 100 } else { completed * 100 / total };
        let filled = percent / 5;
        let empty = 20 - filled;
        format!("[{}{}] {}/{}", "=".repeat(filled), " ".repeat(empty), completed, total)
    }
}

impl ProgressCallback for CliProgress {
    fn on_run_started(&self, total_items: usize) {
        eprintln!("Transferring {} item(s)...", total_items);
    }

    fn on_stage_started(&self, stage: Stage, item_count: usize) {
        eprintln!();
        eprintln!("{}: {} item(s)", stage, item_count);
    }

    fn on_item_completed(&self, stage: Stage, completed: usize, total: usize, name: &str) {
        if self.verbose {
            eprintln!("  [{:3}/{}] {}: {}", completed, total, stage, name);
        } else {
            eprint!("\r  {}", Self::progress_bar(completed, total));
            if completed == total {
                eprintln!();
            }
            let _ = std::io::Write::flush(&mut std::io::stderr());
        }
    }

    fn on_item_failed(&self, stage: Stage, name: &str, reason: &str) {
        if self.verbose {
            eprintln!("  {} failed for {}: {}", stage, name, reason);
        }
    }

    fn on_run_completed(&self, report: &TransferReport) {
        eprintln!();
        eprintln!("Transfer complete!");
        eprintln!(
            "Summary: {} uploaded, {} failed",
            report.uploaded_count(),
            report.failed_count()
        );

        if !report.verified.is_empty() {
            eprintln!(
                "Verification: {} OK, {} failed",
                report.verified.iter().filter(|v| v.is_match()).count(),
                report.verification_failures()
            );
        }

        eprintln!("Bytes uploaded: {}", Self::format_bytes(report.total_bytes_uploaded));
        eprintln!("Elapsed: {:.1}s", self.start_time.elapsed().as_secs_f64());

        if !report.preparation_errors.is_empty() {
            eprintln!();
            eprintln!("Preparation failures:");
            for error in &report.preparation_errors {
                eprintln!("  {}: {}", error.name, error.reason);
            }
        }

        if !report.upload_errors.is_empty() {
            eprintln!();
            eprintln!("Upload failures:");
            for error in &report.upload_errors {
                eprintln!("  {}: {}", error.name, error.reason);
            }
        }

        let mismatches: Vec<&VerificationOutcome> =
            report.verified.iter().filter(|v| !v.is_match()).collect();
        if !mismatches.is_empty() {
            eprintln!();
            eprintln!("Verification failures:");
            for outcome in mismatches {
                match outcome {
                    VerificationOutcome::Verified { file_name, .. } => {
                        eprintln!("  {}: local and remote checksums differ", file_name);
                    }
                    VerificationOutcome::Failed { file_name, reason } => {
                        eprintln!("  {}: {}", file_name, reason);
                    }
                }
            }
        }

        if !report.warnings.is_empty() {
            eprintln!();
            eprintln!("Warnings:");
            for warning in &report.warnings {
                eprintln!("  {}", warning);
            }
        }
    }
}

/// Parse and validate command-line arguments, then run the transfer
fn main() {
    let args = Args::parse();

    if args.verbose {
        use tracing_subscriber::filter::LevelFilter;
        tracing_subscriber::fmt()
            .with_max_level(LevelFilter::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    let exit_code = match run_cli(&args) {
        Ok(()) => 0,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            2
        }
    };

    std::process::exit(exit_code);
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args) -> Result<(), String> {
    if !args.source_root.is_dir() {
        return Err(format!(
            "Source root does not exist: {}",
            args.source_root.display()
        ));
    }
    if !args.dest_root.is_dir() {
        return Err(format!("Destination root does not exist: {}", args.dest_root.display()));
    }

    let source = DirSourceStore::new(&args.source_root);
    let dest = DirDestinationStore::new(&args.dest_root);

    source
        .check_access(&args.bucket)
        .map_err(|e| format!("Source bucket check failed: {}", e))?;

    let objects = source
        .list_objects(&args.bucket, &DEFAULT_EXTENSIONS)
        .map_err(|e| format!("Listing failed: {}", e))?;

    if args.list {
        if objects.is_empty() {
            eprintln!("No matching objects in bucket '{}'", args.bucket);
        } else {
            eprintln!("{} object(s) in bucket '{}':", objects.len(), args.bucket);
            for object in &objects {
                println!("{}\t{} MB", object.key, object.size_megabytes());
            }
        }
        return Ok(());
    }

    let selection: Vec<String> = if args.keys.is_empty() {
        objects.iter().map(|o| o.key.clone()).collect()
    } else {
        let listed: HashSet<&str> = objects.iter().map(|o| o.key.as_str()).collect();
        for key in &args.keys {
            if !listed.contains(key.as_str()) {
                return Err(format!("Object '{}' not found in bucket '{}'", key, args.bucket));
            }
        }
        args.keys.clone()
    };

    if selection.is_empty() {
        return Err(format!("No matching objects in bucket '{}'", args.bucket));
    }

    dest.check_access(&args.container)
        .map_err(|e| format!("Destination container check failed: {}", e))?;

    let ctx = RunContext::new(
        &args.bucket,
        &args.container,
        TransferOptions {
            convert_to_parquet: args.convert,
            verify_checksum: args.verify,
        },
    );

    let progress = CliProgress::new(args.verbose);
    let report = run_transfer(&ctx, &source, &dest, &selection, Some(&progress))
        .map_err(|e| format!("Transfer failed: {}", e))?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Could not render report: {}", e))?;
        println!("{}", rendered);
    }

    if report.is_fully_successful() {
        Ok(())
    } else {
        Err("One or more objects failed to transfer".to_string())
    }
}
