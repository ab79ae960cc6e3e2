//! I/O error types for execflag-io.

use std::path::PathBuf;

use execflag_frame::FrameError;

/// Errors from CSV ingestion and frame export.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of fields than the header.
    #[error("malformed row in {path}: row {row_index} has {got} fields, expected {expected}")]
    MalformedRow {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Number of header fields.
        expected: usize,
        /// Number of fields in this row.
        got: usize,
    },

    /// Returned when a field is not a finite number.
    #[error("cannot parse number in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    NumericParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Header name of the offending column.
        column: String,
        /// The raw field text.
        raw: String,
    },

    /// Returned when the formula names a column the file does not have.
    #[error("column \"{column}\" required by formula is missing from {path}")]
    MissingFormulaColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// The missing column name.
        column: String,
    },

    /// Returned when the header or parsed rows violate a frame invariant.
    #[error("invalid frame in {path}")]
    Frame {
        /// Path to the CSV file.
        path: PathBuf,
        /// Underlying frame error.
        source: FrameError,
    },

    /// Returned when an output file stem contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid output name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidOutputName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a CSV file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },
}
