//! Error types for the dashboard's startup and ingest paths.

use std::path::PathBuf;

use thiserror::Error;

/// Reasons the dashboard cannot start. All of them are fatal.
#[derive(Error, Debug)]
pub enum StartupError {
    /// The dataset file does not exist or cannot be opened.
    #[error("cannot open dataset {path:?}: {source}")]
    DatasetUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more required columns are absent after trimming header whitespace.
    #[error("dataset is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A row could not be read or one of its feature cells is not a number.
    #[error("malformed dataset row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    /// The dataset has a header but no examples.
    #[error("dataset contains no rows")]
    EmptyDataset,

    /// The classifier rejected the training data.
    #[error("failed to train {target} model: {reason}")]
    Training { target: String, reason: String },

    /// Low-level CSV error not tied to a specific row.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Why a sensor line was skipped. Recoverable, no backoff.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The line did not split into exactly three comma-separated fields.
    #[error("expected 3 comma-separated values, got {0}")]
    FieldCount(usize),

    /// A field is not a decimal number.
    #[error("non-numeric value {0:?}")]
    NotANumber(String),
}

/// Errors that interrupt the ingest loop and trigger its backoff pause.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Reading from the sensor connection failed.
    #[error("sensor read failed: {0}")]
    Io(#[from] std::io::Error),

    /// The sensor sent bytes that are not UTF-8.
    #[error("sensor sent invalid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// The sensor sent more than this many bytes without a newline.
    #[error("sensor line exceeds {0} bytes")]
    LineTooLong(usize),

    /// The connection reached end of stream.
    #[error("sensor connection closed")]
    Disconnected,

    /// A classifier failed on a well-formed reading.
    #[error("prediction failed: {0}")]
    Prediction(String),
}

/// Specialized Result type for startup operations.
pub type Result<T> = std::result::Result<T, StartupError>;
