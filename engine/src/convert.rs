//! Tabular file conversion.
//!
//! Reads a CSV or JSON file, infers an Arrow schema, and writes a Parquet
//! file with the schema embedded and no row-index column. Text decoding
//! tries a fixed list of encodings in order; JSON input may be a single
//! document (array of records, or one object) or newline-delimited records.
//!
//! The converter writes exactly one output file and never deletes its
//! input; the caller owns the input's lifecycle.

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::Path;
use std::sync::Arc;

use arrow::csv;
use arrow::error::ArrowError;
use arrow::json;
use arrow::json::reader::infer_json_schema_from_iterator;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde_json::Value;

use crate::error::ConvertError;

/// Extension the converter produces.
pub const PARQUET_EXTENSION: &str = "parquet";

/// Candidate encodings, tried in order. The first one under which the
/// input both decodes and parses wins.
const ENCODING_CANDIDATES: [&str; 4] = ["utf-8", "utf-8-sig", "windows-1252", "latin-1"];

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Byte sizes before and after conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionReport {
    pub input_size_bytes: u64,
    pub output_size_bytes: u64,
}

enum InputKind {
    Csv,
    Json,
}

/// Lowercased extension of `path`, without the dot.
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Convert a CSV or JSON file to Parquet.
///
/// All rows and columns of the parsed input are preserved. Fails with
/// `UnsupportedFormat` for other extensions, `Decode` when no candidate
/// encoding yields parsable text, and `EmptyInput` when the input parses
/// to zero records.
pub fn convert_to_parquet(input: &Path, output: &Path) -> Result<ConversionReport, ConvertError> {
    let kind = match file_extension(input).as_str() {
        "csv" => InputKind::Csv,
        "json" => InputKind::Json,
        other => {
            return Err(ConvertError::UnsupportedFormat { extension: other.to_string() });
        }
    };

    let raw = fs::read(input).map_err(|e| ConvertError::Io {
        path: input.to_path_buf(),
        source: e,
    })?;

    let batches = decode_and_parse(&raw, &kind)?;
    write_parquet(&batches, output)?;

    let output_size = fs::metadata(output)
        .map_err(|e| ConvertError::Io { path: output.to_path_buf(), source: e })?
        .len();

    Ok(ConversionReport {
        input_size_bytes: raw.len() as u64,
        output_size_bytes: output_size,
    })
}

/// Try each candidate encoding until the input decodes and parses.
fn decode_and_parse(raw: &[u8], kind: &InputKind) -> Result<Vec<RecordBatch>, ConvertError> {
    for name in ENCODING_CANDIDATES {
        let Some(text) = decode(raw, name) else {
            continue;
        };

        let parsed = match kind {
            InputKind::Csv => parse_csv(&text),
            InputKind::Json => parse_json(&text),
        };

        match parsed {
            Ok(batches) => {
                let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
                if rows == 0 {
                    return Err(ConvertError::EmptyInput);
                }
                return Ok(batches);
            }
            Err(_) => continue,
        }
    }

    Err(ConvertError::Decode { attempted: ENCODING_CANDIDATES.to_vec() })
}

/// Decode `raw` under one named encoding. Returns None when the bytes are
/// not valid for that encoding.
fn decode(raw: &[u8], encoding: &str) -> Option<String> {
    match encoding {
        // Strict UTF-8; input with a byte-order mark is deferred to the
        // utf-8-sig candidate so the mark never leaks into a column name.
        "utf-8" => {
            if raw.starts_with(&UTF8_BOM) {
                return None;
            }
            std::str::from_utf8(raw).ok().map(str::to_owned)
        }
        "utf-8-sig" => {
            let stripped = raw.strip_prefix(&UTF8_BOM[..]).unwrap_or(raw);
            std::str::from_utf8(stripped).ok().map(str::to_owned)
        }
        "windows-1252" => {
            let (text, had_errors) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(raw);
            if had_errors {
                None
            } else {
                Some(text.into_owned())
            }
        }
        // encoding_rs aliases latin-1 to windows-1252 per WHATWG, so the
        // true ISO-8859-1 mapping is done directly.
        "latin-1" => Some(raw.iter().map(|&b| b as char).collect()),
        _ => None,
    }
}

fn parse_csv(text: &str) -> Result<Vec<RecordBatch>, ArrowError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let format = csv::reader::Format::default().with_header(true);

    let mut cursor = Cursor::new(text.as_bytes());
    let (schema, _) = format.infer_schema(&mut cursor, None)?;
    if schema.fields().is_empty() {
        return Ok(Vec::new());
    }

    cursor.set_position(0);
    let reader = csv::ReaderBuilder::new(Arc::new(schema))
        .with_format(format)
        .build(cursor)?;

    reader.collect()
}

fn parse_json(text: &str) -> Result<Vec<RecordBatch>, ArrowError> {
    let records = json_records(text)?;
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let schema = infer_json_schema_from_iterator(records.iter().cloned().map(Ok))?;
    let mut decoder = json::ReaderBuilder::new(Arc::new(schema)).build_decoder()?;
    decoder.serialize(&records)?;

    Ok(decoder.flush()?.into_iter().collect())
}

/// Extract JSON records: whole document first, then newline-delimited.
fn json_records(text: &str) -> Result<Vec<Value>, ArrowError> {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        match value {
            Value::Array(items) if items.iter().all(Value::is_object) => return Ok(items),
            object @ Value::Object(_) => return Ok(vec![object]),
            // Structurally not records (scalar, or array of scalars):
            // fall through to the newline-delimited attempt.
            _ => {}
        }
    }

    let mut records = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(object @ Value::Object(_)) => records.push(object),
            _ => {
                return Err(ArrowError::ParseError(
                    "input is neither a JSON document of records nor newline-delimited JSON"
                        .to_string(),
                ));
            }
        }
    }
    Ok(records)
}

fn write_parquet(batches: &[RecordBatch], output: &Path) -> Result<(), ConvertError> {
    let schema = batches[0].schema();
    let file = File::create(output).map_err(|e| ConvertError::Io {
        path: output.to_path_buf(),
        source: e,
    })?;

    let props = WriterProperties::builder().build();
    let mut writer =
        ArrowWriter::try_new(file, schema, Some(props)).map_err(|e| parquet_io(output, e))?;

    for batch in batches {
        writer.write(batch).map_err(|e| parquet_io(output, e))?;
    }
    writer.close().map_err(|e| parquet_io(output, e))?;

    Ok(())
}

/// Parquet write failures are local I/O failures as far as callers care.
fn parquet_io(path: &Path, e: parquet::errors::ParquetError) -> ConvertError {
    ConvertError::Io {
        path: path.to_path_buf(),
        source: io::Error::other(e),
    }
}
