use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Identifies which part of the input a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRef {
    /// A record whose `id` could be read.
    Id(i64),
    /// A record identified only by its zero-based position in the input.
    Index(usize),
    /// The input document as a whole.
    Batch,
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRef::Id(id) => write!(f, "record {id}"),
            RecordRef::Index(index) => write!(f, "record at position {index}"),
            RecordRef::Batch => f.write_str("batch"),
        }
    }
}

/// A unit-price string that does not match the configured currency format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Nothing but the currency symbol (or whitespace) was supplied.
    #[error("price {0:?} has no amount")]
    Empty(String),

    /// The configured currency symbol is mandatory but absent.
    #[error("price {raw:?} does not start with currency symbol {symbol:?}")]
    MissingSymbol { raw: String, symbol: String },

    /// The remainder after stripping the symbol is not a plain decimal number.
    #[error("price {0:?} is not a valid decimal amount")]
    InvalidNumber(String),
}

/// All errors produced while building and delivering a sales report.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report or message file could not be written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A record's unit price could not be parsed.
    #[error("Invalid price in record {id}: {source}")]
    Parse {
        id: i64,
        #[source]
        source: PriceError,
    },

    /// A record or the batch violates the data model.
    #[error("Invalid {record}: {reason}")]
    Validation { record: RecordRef, reason: String },

    /// An email address is malformed or could inject headers.
    #[error("Invalid email address: {0:?}")]
    InvalidAddress(String),

    /// The mail transport rejected or failed to deliver a message.
    #[error("Mail delivery failed: {0}")]
    MailDelivery(String),

    /// The document backend could not lay out or encode the report.
    #[error("Report rendering failed: {0}")]
    Render(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// Shorthand for a [`ReportError::Validation`] about `record`.
    pub fn validation(record: RecordRef, reason: impl Into<String>) -> Self {
        ReportError::Validation {
            record,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the sales crates.
pub type Result<T> = std::result::Result<T, ReportError>;
