use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for delimited text reading.
#[derive(Error, Debug)]
pub enum CsvError {
    /// IO error while opening or reading the source. The reader is closed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Invalid configuration or construction argument.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A file source did not exist when the reader was constructed.
    #[error("File {} does not exist", .0.display())]
    FileNotFound(PathBuf),

    /// The reader was used after it had been closed.
    #[error("This reader has already been closed")]
    Closed,

    /// A column grew past the safety limit. The reader is closed.
    #[error(
        "Maximum column length of {limit} exceeded in column {column} in record {record}; \
         disable the safety switch if you expect longer columns"
    )]
    ColumnLengthExceeded {
        limit: usize,
        column: usize,
        record: u64,
    },

    /// A record grew past the safety limit on column count. The reader is closed.
    #[error(
        "Maximum column count of {limit} exceeded in record {record}; \
         disable the safety switch if you expect more columns per record"
    )]
    ColumnCountExceeded { limit: usize, record: u64 },
}

impl CsvError {
    /// Returns true for the errors raised by the safety switch.
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(
            self,
            CsvError::ColumnLengthExceeded { .. } | CsvError::ColumnCountExceeded { .. }
        )
    }
}

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, CsvError>;
