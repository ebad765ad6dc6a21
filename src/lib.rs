//! csv-pull: a streaming, pull-based reader for delimited text
//!
//! Records are parsed one at a time from a file, a byte stream or an
//! in-memory string, through a fixed-size character window, so memory use
//! does not depend on input size.
//!
//! # Quick Start
//!
//! ```no_run
//! use csv_pull::{CsvReader, encoding_rs::UTF_8};
//!
//! let mut reader = CsvReader::from_path("data.csv", UTF_8)?;
//! reader.read_headers()?;
//!
//! while reader.read_record()? {
//!     println!("{} lives in {}", reader.get_by_name("name")?, reader.get_by_name("city")?);
//! }
//! reader.close();
//! # Ok::<(), csv_pull::CsvError>(())
//! ```
//!
//! # Dialects
//!
//! Everything about the dialect lives in [`ReaderConfig`] and must be set
//! before the first read:
//!
//! ```
//! use csv_pull::{CsvReader, EscapeMode, ReaderConfig};
//!
//! let mut config = ReaderConfig::new();
//! config
//!     .delimiter('\t')
//!     .escape_mode(EscapeMode::Backslash)
//!     .use_comments(true);
//!
//! let mut reader = CsvReader::from_text("# note\n\"say \\\"hi\\\"\"\tx\n").with_config(config);
//! assert!(reader.read_record().unwrap());
//! assert_eq!(reader.values().unwrap(), vec!["say \"hi\"", "x"]);
//! ```
//!
//! # Quoting rules
//!
//! - A column is quoted only when the text qualifier is its first character
//!   (leading whitespace is dropped first when trimming is on).
//! - Characters after the closing qualifier, up to the next delimiter, are
//!   discarded.
//! - A CR immediately followed by LF ends one record; a lone CR or LF also
//!   ends a record.
//! - Without a closing qualifier the column extends to end of input.

mod buffer;
mod config;
pub mod encoding;
mod error;
mod escape;
mod headers;
mod machine;
mod reader;
mod record;
mod source;

pub use config::{EscapeMode, MAX_COLUMN_COUNT, MAX_COLUMN_LENGTH, ReaderConfig};
pub use error::{CsvError, Result};
pub use headers::HeaderTable;
pub use reader::{CsvReader, Records};
pub use record::Column;

// Re-export so callers can name encodings without a direct dependency
pub use encoding_rs;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api() {
        let _config = ReaderConfig::default();
        let _mode = EscapeMode::Doubled;
        let _column = Column::new("a", false);
        let _headers = HeaderTable::default();
        let _reader = CsvReader::from_text("");
        let _encoding = encoding::for_label("utf-8").unwrap();
        assert_eq!(MAX_COLUMN_LENGTH, 100_000);
        assert_eq!(MAX_COLUMN_COUNT, 100_000);
    }

    #[test]
    fn test_read_simple_csv() {
        let mut reader = CsvReader::from_text("a,b,c\n1,2,3\n4,5,6\n");
        let rows: Vec<Vec<String>> = reader.records().collect::<Result<_>>().unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], vec!["4", "5", "6"]);
    }

    #[test]
    fn test_builder_pattern() {
        let mut config = ReaderConfig::new();
        config
            .delimiter(';')
            .text_qualifier('\'')
            .trim_whitespace(false)
            .capture_raw_record(true);

        let mut reader = CsvReader::from_text("' x ';y \n").with_config(config);
        assert!(reader.read_record().unwrap());
        assert_eq!(reader.values().unwrap(), vec![" x ", "y "]);
        assert_eq!(reader.raw_record().unwrap(), "' x ';y ");
    }
}
