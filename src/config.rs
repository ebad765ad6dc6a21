//! Parsing options for [`CsvReader`](crate::CsvReader).

use std::fmt;
use std::str::FromStr;

use crate::error::{CsvError, Result};

/// Maximum characters in one column while the safety switch is on.
pub const MAX_COLUMN_LENGTH: usize = 100_000;

/// Maximum columns in one record while the safety switch is on.
pub const MAX_COLUMN_COUNT: usize = 100_000;

/// How an occurrence of the text qualifier is escaped inside qualified data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EscapeMode {
    /// Double up the qualifier (`"a""b"`).
    #[default]
    Doubled,
    /// Precede special characters with a backslash (`"a\"b"`), and accept
    /// mnemonic and numeric backslash escapes.
    Backslash,
}

impl EscapeMode {
    /// Legacy numeric code for this mode.
    pub const fn code(&self) -> i32 {
        match self {
            EscapeMode::Doubled => 1,
            EscapeMode::Backslash => 2,
        }
    }
}

impl TryFrom<i32> for EscapeMode {
    type Error = CsvError;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            1 => Ok(EscapeMode::Doubled),
            2 => Ok(EscapeMode::Backslash),
            other => Err(CsvError::InvalidConfig(format!(
                "escape mode must be 1 (doubled) or 2 (backslash), got {other}"
            ))),
        }
    }
}

impl FromStr for EscapeMode {
    type Err = CsvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "doubled" | "double" => Ok(EscapeMode::Doubled),
            "backslash" => Ok(EscapeMode::Backslash),
            _ => Err(CsvError::InvalidConfig(format!(
                "unknown escape mode {s:?}, expected \"doubled\" or \"backslash\""
            ))),
        }
    }
}

impl fmt::Display for EscapeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscapeMode::Doubled => write!(f, "doubled"),
            EscapeMode::Backslash => write!(f, "backslash"),
        }
    }
}

/// Reader configuration.
///
/// Fields may be set directly or through the chainable setters. Once a reader
/// has started reading, its configuration can no longer be changed.
///
/// ```
/// use csv_pull::{EscapeMode, ReaderConfig};
///
/// let mut config = ReaderConfig::new();
/// config
///     .delimiter(';')
///     .escape_mode(EscapeMode::Backslash)
///     .use_comments(true);
///
/// assert_eq!(config.delimiter, ';');
/// assert!(config.use_comments);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Column delimiter.
    pub delimiter: char,
    /// Custom record delimiter. `None` ends records on CR, LF or CRLF.
    pub record_delimiter: Option<char>,
    /// Character wrapping qualified columns.
    pub text_qualifier: char,
    /// Whether the text qualifier is honoured at all.
    pub use_text_qualifier: bool,
    /// Escape dialect.
    pub escape_mode: EscapeMode,
    /// Comment line marker.
    pub comment: char,
    /// Whether lines starting with the comment marker are skipped.
    pub use_comments: bool,
    /// Trim leading and trailing space/tab from unqualified columns.
    pub trim_whitespace: bool,
    /// Drop lines that contain no columns.
    pub skip_empty_records: bool,
    /// Enforce [`MAX_COLUMN_LENGTH`] and [`MAX_COLUMN_COUNT`].
    pub safety_switch: bool,
    /// Keep the raw text of each record.
    pub capture_raw_record: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderConfig {
    /// Create a configuration with default settings.
    pub const fn new() -> Self {
        Self {
            delimiter: ',',
            record_delimiter: None,
            text_qualifier: '"',
            use_text_qualifier: true,
            escape_mode: EscapeMode::Doubled,
            comment: '#',
            use_comments: false,
            trim_whitespace: true,
            skip_empty_records: true,
            safety_switch: true,
            capture_raw_record: true,
        }
    }

    /// Set the column delimiter.
    pub fn delimiter(&mut self, delimiter: char) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    /// Use a custom record delimiter instead of CR/LF detection.
    pub fn record_delimiter(&mut self, record_delimiter: char) -> &mut Self {
        self.record_delimiter = Some(record_delimiter);
        self
    }

    /// Go back to CR/LF record detection.
    pub fn default_record_delimiter(&mut self) -> &mut Self {
        self.record_delimiter = None;
        self
    }

    /// Set the text qualifier.
    pub fn text_qualifier(&mut self, text_qualifier: char) -> &mut Self {
        self.text_qualifier = text_qualifier;
        self
    }

    /// Enable or disable text qualifiers.
    pub fn use_text_qualifier(&mut self, use_text_qualifier: bool) -> &mut Self {
        self.use_text_qualifier = use_text_qualifier;
        self
    }

    /// Set the escape dialect.
    pub fn escape_mode(&mut self, escape_mode: EscapeMode) -> &mut Self {
        self.escape_mode = escape_mode;
        self
    }

    /// Set the comment marker.
    pub fn comment(&mut self, comment: char) -> &mut Self {
        self.comment = comment;
        self
    }

    /// Enable or disable comment line skipping.
    pub fn use_comments(&mut self, use_comments: bool) -> &mut Self {
        self.use_comments = use_comments;
        self
    }

    /// Enable or disable whitespace trimming of unqualified columns.
    pub fn trim_whitespace(&mut self, trim_whitespace: bool) -> &mut Self {
        self.trim_whitespace = trim_whitespace;
        self
    }

    /// Enable or disable skipping of empty lines.
    pub fn skip_empty_records(&mut self, skip_empty_records: bool) -> &mut Self {
        self.skip_empty_records = skip_empty_records;
        self
    }

    /// Enable or disable the column length and column count limits.
    ///
    /// Only turn this off for trusted, well-formed input.
    pub fn safety_switch(&mut self, safety_switch: bool) -> &mut Self {
        self.safety_switch = safety_switch;
        self
    }

    /// Enable or disable raw record capture.
    pub fn capture_raw_record(&mut self, capture_raw_record: bool) -> &mut Self {
        self.capture_raw_record = capture_raw_record;
        self
    }

    /// Returns true if `ch` terminates a record under this configuration.
    #[inline]
    pub fn is_record_delimiter(&self, ch: char) -> bool {
        match self.record_delimiter {
            Some(delimiter) => ch == delimiter,
            None => ch == '\r' || ch == '\n',
        }
    }
}
