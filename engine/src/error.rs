//! Error types for the transfer engine.
//!
//! Each concern gets its own enum so callers can match on the kind of
//! failure instead of inspecting message text. Per-item failures during a
//! run are recorded in the TransferReport, not returned as errors; the only
//! errors `run_transfer` itself returns are pre-condition violations and
//! workspace allocation failures (see `PipelineError`).

use std::error::Error;
use std::fmt::{self, Display};
use std::io;
use std::path::PathBuf;

/// Failures reported by a source or destination store.
///
/// Store implementations must map their native error codes onto these
/// variants; the pipeline and any front-end match on the variant, never on
/// the reason string.
#[derive(Debug)]
pub enum StoreError {
    /// The connection handle could not be created or used
    Connection(String),

    /// Authenticated but not authorized for the container or object
    AccessDenied(String),

    /// Container or object does not exist
    NotFound(String),

    /// Any other remote-side failure
    Store(String),
}

impl StoreError {
    /// Human-readable reason carried by the variant.
    pub fn reason(&self) -> &str {
        match self {
            Self::Connection(reason)
            | Self::AccessDenied(reason)
            | Self::NotFound(reason)
            | Self::Store(reason) => reason,
        }
    }

    /// True when the failure means the object or container is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(reason) => write!(f, "connection error: {}", reason),
            Self::AccessDenied(reason) => write!(f, "access denied: {}", reason),
            Self::NotFound(reason) => write!(f, "not found: {}", reason),
            Self::Store(reason) => write!(f, "store error: {}", reason),
        }
    }
}

impl Error for StoreError {}

/// Failures while converting a tabular file to Parquet.
#[derive(Debug)]
pub enum ConvertError {
    /// Input extension is neither `.csv` nor `.json`
    UnsupportedFormat { extension: String },

    /// No candidate encoding produced parsable text
    Decode { attempted: Vec<&'static str> },

    /// The input decoded and parsed but contained zero records
    EmptyInput,

    /// Local filesystem failure while reading input or writing output
    Io { path: PathBuf, source: io::Error },
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat { extension } => {
                if extension.is_empty() {
                    write!(f, "unsupported file type (no extension); only CSV and JSON are supported")
                } else {
                    write!(f, "unsupported file type: .{}; only CSV and JSON are supported", extension)
                }
            }
            Self::Decode { attempted } => {
                write!(f, "could not decode input; attempted encodings: {}", attempted.join(", "))
            }
            Self::EmptyInput => write!(f, "input file is empty or contains no records"),
            Self::Io { path, .. } => write!(f, "I/O error on {}", path.display()),
        }
    }
}

impl Error for ConvertError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failures while computing a content digest from a local file.
#[derive(Debug)]
pub enum HashError {
    /// File does not exist
    NotFound { path: PathBuf },

    /// Read failed partway through; the partial digest is discarded
    Io { path: PathBuf, source: io::Error },
}

impl Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "file not found: {}", path.display()),
            Self::Io { path, .. } => write!(f, "failed to read file: {}", path.display()),
        }
    }
}

impl Error for HashError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::NotFound { .. } => None,
        }
    }
}

/// Run-level errors that prevent a transfer from executing at all.
///
/// Everything that happens after the run starts is isolated per item and
/// recorded in the report instead.
#[derive(Debug)]
pub enum PipelineError {
    /// The selection contained no object keys
    EmptySelection,

    /// The temporary workspace could not be created
    Workspace { source: io::Error },
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySelection => write!(f, "no objects selected for transfer"),
            Self::Workspace { source } => {
                write!(f, "failed to create temporary workspace: {}", source)
            }
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Workspace { source } => Some(source),
            Self::EmptySelection => None,
        }
    }
}

impl From<io::Error> for PipelineError {
    fn from(err: io::Error) -> Self {
        PipelineError::Workspace { source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_reason() {
        let err = StoreError::NotFound("bucket 'data' does not exist".to_string());
        assert_eq!(err.reason(), "bucket 'data' does not exist");
        assert!(err.is_not_found());
        assert!(!StoreError::AccessDenied("nope".to_string()).is_not_found());
    }

    #[test]
    fn test_store_error_display_includes_kind() {
        assert!(StoreError::AccessDenied("x".into()).to_string().starts_with("access denied"));
        assert!(StoreError::Connection("x".into()).to_string().starts_with("connection error"));
    }

    #[test]
    fn test_convert_error_decode_names_encodings() {
        let err = ConvertError::Decode {
            attempted: vec!["utf-8", "windows-1252"],
        };
        let msg = err.to_string();
        assert!(msg.contains("utf-8"));
        assert!(msg.contains("windows-1252"));
    }

    #[test]
    fn test_unsupported_format_display() {
        let err = ConvertError::UnsupportedFormat { extension: "xlsx".to_string() };
        assert!(err.to_string().contains(".xlsx"));
    }
}
