//! Record state machine.
//!
//! The scanner walks the chunk buffer one character at a time. Every column
//! starts in the column-start scan, which dispatches to the quoted or the
//! unquoted column scan. Those run until the column ends (delimiter or record
//! delimiter), refilling the chunk whenever it is exhausted.
//!
//! A column whose text is a contiguous run of the current chunk is sliced out
//! directly when it ends. Everything else (escapes, refill crossings, quoted
//! columns) goes through the column accumulator: the scanner flushes the
//! pending range `[column_start, position)` before it skips over a character.

use log::trace;

use crate::buffer::{ChunkBuffer, ColumnBuffer, RawBuffer, collect_value};
use crate::config::{EscapeMode, MAX_COLUMN_COUNT, MAX_COLUMN_LENGTH, ReaderConfig};
use crate::error::{CsvError, Result};
use crate::escape::{
    ComplexEscape, EscapeValue, Escaped, INVALID_ESCAPE, after_backslash, combine_surrogates,
    continues_unicode_escape,
};
use crate::record::{Column, Record};
use crate::source::Source;

const CR: char = '\r';
const LF: char = '\n';
const BACKSLASH: char = '\\';

/// Scan state that outlives a single column.
#[derive(Debug, Clone, Copy)]
struct ScanState {
    started_column: bool,
    started_with_qualifier: bool,
    last_char: Option<char>,
    has_more_data: bool,
    record_complete: bool,
    /// Decoded `\u` high surrogate waiting for its low half.
    high_surrogate: Option<u16>,
}

impl Default for ScanState {
    fn default() -> Self {
        Self {
            started_column: false,
            started_with_qualifier: false,
            last_char: None,
            has_more_data: true,
            record_complete: false,
            high_surrogate: None,
        }
    }
}

/// Per-column state of a quoted column.
#[derive(Debug, Default)]
struct QuotedColumn {
    last_was_qualifier: bool,
    last_was_escape: bool,
    eating_trailing_junk: bool,
    complex: Option<ComplexEscape>,
}

/// Per-column state of an unquoted column.
#[derive(Debug, Default)]
struct UnquotedColumn {
    last_was_backslash: bool,
    complex: Option<ComplexEscape>,
}

/// Parser core: owns the source, the buffers and the current record.
#[derive(Debug)]
pub(crate) struct Scanner {
    pub(crate) config: ReaderConfig,
    source: Source,
    chunk: ChunkBuffer,
    column: ColumnBuffer,
    raw: RawBuffer,
    state: ScanState,
    pub(crate) record: Record,
    raw_record: String,
    /// Records delivered so far.
    pub(crate) records_read: u64,
    /// Set by the first read operation; configuration is frozen from then on.
    pub(crate) started: bool,
}

impl Scanner {
    pub(crate) fn new(source: Source, chunk_capacity: usize) -> Self {
        Self {
            config: ReaderConfig::default(),
            source,
            chunk: ChunkBuffer::with_capacity(chunk_capacity),
            column: ColumnBuffer::new(),
            raw: RawBuffer::new(),
            state: ScanState::default(),
            record: Record::new(),
            raw_record: String::new(),
            records_read: 0,
            started: false,
        }
    }

    /// Replace the chunk buffer. Only valid before the first read.
    pub(crate) fn set_chunk_capacity(&mut self, capacity: usize) {
        self.chunk = ChunkBuffer::with_capacity(capacity);
    }

    pub(crate) fn raw_record(&self) -> &str {
        &self.raw_record
    }

    pub(crate) fn has_more_data(&self) -> bool {
        self.state.has_more_data
    }

    /// Read the next record into `self.record`. Returns false at end of source.
    pub(crate) fn read_record(&mut self) -> Result<bool> {
        self.started = true;
        self.record.clear();
        self.raw.clear();
        self.chunk.line_start = self.chunk.position;
        self.state.record_complete = false;

        if self.state.has_more_data {
            while self.state.has_more_data && !self.state.record_complete {
                if self.chunk.is_exhausted() {
                    self.refill()?;
                } else {
                    self.scan_column_start()?;
                }
            }

            if self.state.started_column || self.state.last_char == Some(self.config.delimiter) {
                if !self.state.started_column {
                    self.state.started_with_qualifier = false;
                }
                self.end_column()?;
                self.end_record();
            }
        }

        self.capture_raw_record();
        Ok(self.state.record_complete)
    }

    /// Skip to the next physical line ending without interpreting columns.
    ///
    /// Leaves the cursor on the CR or LF so the caller decides whether to
    /// consume it.
    pub(crate) fn skip_to_line_end(&mut self) -> Result<bool> {
        self.started = true;
        self.record.clear();
        let mut skipped = false;

        if self.state.has_more_data {
            let mut found_eol = false;
            while self.state.has_more_data && !found_eol {
                if self.chunk.is_exhausted() {
                    self.refill()?;
                    continue;
                }
                skipped = true;
                let ch = self.chunk.current();
                if ch == CR || ch == LF {
                    found_eol = true;
                } else {
                    self.chunk.position += 1;
                }
                self.state.last_char = Some(ch);
            }
            self.column.clear();
            self.chunk.line_start = self.chunk.position + 1;
        }

        self.raw.clear();
        self.raw_record.clear();
        Ok(skipped)
    }

    /// Skip past the next line ending, consuming the terminator itself.
    pub(crate) fn skip_line(&mut self) -> Result<bool> {
        let skipped = self.skip_to_line_end()?;
        if self.state.has_more_data && !self.chunk.is_exhausted() {
            let ch = self.chunk.current();
            if ch == CR || ch == LF {
                self.chunk.position += 1;
                self.chunk.line_start = self.chunk.position;
            }
        }
        Ok(skipped)
    }

    /// One step of the column-start scan at the cursor.
    fn scan_column_start(&mut self) -> Result<()> {
        self.state.started_with_qualifier = false;
        let ch = self.chunk.current();

        if self.config.use_text_qualifier && ch == self.config.text_qualifier {
            self.scan_quoted_column(ch)?;
        } else if ch == self.config.delimiter {
            self.state.last_char = Some(ch);
            self.end_column()?;
        } else if self.config.is_record_delimiter(ch) {
            self.record_delimiter_at_column_start(ch)?;
        } else if self.config.use_comments && self.record.is_empty() && ch == self.config.comment {
            self.state.last_char = Some(ch);
            self.skip_to_line_end()?;
            self.state.started_column = false;
        } else if self.config.trim_whitespace && (ch == ' ' || ch == '\t') {
            self.state.started_column = true;
            self.chunk.column_start = self.chunk.position + 1;
        } else {
            self.scan_unquoted_column(ch)?;
        }

        if self.state.has_more_data {
            self.chunk.position += 1;
        }
        Ok(())
    }

    /// A record delimiter seen before any column text on this line.
    fn record_delimiter_at_column_start(&mut self, ch: char) -> Result<()> {
        let ends_record = self.state.started_column
            || !self.record.is_empty()
            || (!self.config.skip_empty_records
                && match self.config.record_delimiter {
                    Some(_) => true,
                    // An LF right after a CR is the second half of CRLF.
                    None => ch == CR || self.state.last_char != Some(CR),
                });

        if ends_record {
            self.end_column()?;
            self.end_record();
        } else {
            self.chunk.line_start = self.chunk.position + 1;
        }
        self.state.last_char = Some(ch);
        Ok(())
    }

    fn scan_quoted_column(&mut self, qualifier: char) -> Result<()> {
        self.state.last_char = Some(qualifier);
        self.state.started_column = true;
        self.state.started_with_qualifier = true;
        self.chunk.column_start = self.chunk.position + 1;
        self.chunk.position += 1;

        let mut column = QuotedColumn::default();
        while self.state.has_more_data && self.state.started_column {
            if self.chunk.is_exhausted() {
                self.refill()?;
                continue;
            }
            let ch = self.chunk.current();
            self.quoted_transition(&mut column, ch)?;
            self.after_column_char(ch)?;
        }
        Ok(())
    }

    fn quoted_transition(&mut self, column: &mut QuotedColumn, ch: char) -> Result<()> {
        let backslash_mode = self.config.escape_mode == EscapeMode::Backslash;
        if !continues_unicode_escape(column.complex.is_some(), column.last_was_escape, ch) {
            self.release_high_surrogate();
        }

        if column.eating_trailing_junk {
            self.chunk.column_start = self.chunk.position + 1;
            self.end_column_on(ch)?;
        } else if let Some(escape) = column.complex {
            column.complex = self.complex_escape_digit(escape, ch);
        } else if ch == self.config.text_qualifier {
            if column.last_was_escape {
                // Second half of an escaped qualifier: keep it as text.
                column.last_was_escape = false;
                column.last_was_qualifier = false;
            } else {
                self.flush_pending();
                if !backslash_mode {
                    column.last_was_escape = true;
                }
                column.last_was_qualifier = true;
            }
        } else if backslash_mode && column.last_was_escape {
            column.complex = self.backslash_escape(ch);
            column.last_was_escape = false;
        } else if backslash_mode && ch == BACKSLASH && !column.last_was_qualifier {
            self.flush_pending();
            column.last_was_escape = true;
        } else if column.last_was_qualifier {
            if !self.end_column_on(ch)? {
                self.chunk.column_start = self.chunk.position + 1;
                column.eating_trailing_junk = true;
            }
            column.last_was_qualifier = false;
        }
        Ok(())
    }

    fn scan_unquoted_column(&mut self, first: char) -> Result<()> {
        self.state.started_column = true;
        self.chunk.column_start = self.chunk.position;

        let mut column = UnquotedColumn::default();
        self.unquoted_transition(&mut column, first)?;
        self.after_column_char(first)?;

        while self.state.has_more_data && self.state.started_column {
            if self.chunk.is_exhausted() {
                self.refill()?;
                continue;
            }
            let ch = self.chunk.current();
            self.unquoted_transition(&mut column, ch)?;
            self.after_column_char(ch)?;
        }
        Ok(())
    }

    fn unquoted_transition(&mut self, column: &mut UnquotedColumn, ch: char) -> Result<()> {
        let backslash_mode = self.config.escape_mode == EscapeMode::Backslash;
        if !continues_unicode_escape(column.complex.is_some(), column.last_was_backslash, ch) {
            self.release_high_surrogate();
        }

        if backslash_mode && !self.config.use_text_qualifier && ch == BACKSLASH {
            if column.last_was_backslash {
                column.last_was_backslash = false;
            } else {
                self.flush_pending();
                column.last_was_backslash = true;
            }
        } else if let Some(escape) = column.complex {
            column.complex = self.complex_escape_digit(escape, ch);
        } else if backslash_mode && column.last_was_backslash {
            column.complex = self.backslash_escape(ch);
            column.last_was_backslash = false;
        } else {
            self.end_column_on(ch)?;
        }
        Ok(())
    }

    /// Bookkeeping after a character inside a column: remember it, advance
    /// while the column is still open, and enforce the column length limit.
    fn after_column_char(&mut self, ch: char) -> Result<()> {
        self.state.last_char = Some(ch);
        if !self.state.started_column {
            return Ok(());
        }

        self.chunk.position += 1;
        let length = self.chunk.position.saturating_sub(self.chunk.column_start) + self.column.len();
        if self.config.safety_switch && length > MAX_COLUMN_LENGTH {
            return Err(CsvError::ColumnLengthExceeded {
                limit: MAX_COLUMN_LENGTH,
                column: self.record.len(),
                record: self.records_read,
            });
        }
        Ok(())
    }

    /// End the column (and maybe the record) if `ch` is a delimiter.
    fn end_column_on(&mut self, ch: char) -> Result<bool> {
        if ch == self.config.delimiter {
            self.end_column()?;
            Ok(true)
        } else if self.config.is_record_delimiter(ch) {
            self.end_column()?;
            self.end_record();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Decode the character following a backslash. Returns the numeric
    /// escape it starts, if any.
    fn backslash_escape(&mut self, ch: char) -> Option<ComplexEscape> {
        match after_backslash(ch) {
            Escaped::Char(decoded) => {
                self.append_decoded(decoded);
                None
            }
            Escaped::Complex(escape) => {
                self.chunk.column_start = self.chunk.position + 1;
                Some(escape)
            }
            Escaped::Literal => None,
        }
    }

    /// Feed one digit to a numeric escape. Returns the escape while it is
    /// still incomplete.
    fn complex_escape_digit(&mut self, mut escape: ComplexEscape, ch: char) -> Option<ComplexEscape> {
        match escape.push(ch) {
            Some(value) => {
                self.append_escape_value(value);
                None
            }
            None => {
                self.chunk.column_start = self.chunk.position + 1;
                Some(escape)
            }
        }
    }

    /// Append a completed numeric escape, pairing UTF-16 surrogate halves.
    fn append_escape_value(&mut self, value: EscapeValue) {
        let pending = self.state.high_surrogate.take();
        if let (Some(high), EscapeValue::Low(low)) = (pending, value) {
            self.append_decoded(combine_surrogates(high, low));
            return;
        }
        if pending.is_some() {
            self.column.push(INVALID_ESCAPE);
        }

        match value {
            EscapeValue::Char(decoded) => self.append_decoded(decoded),
            EscapeValue::High(high) => {
                self.state.high_surrogate = Some(high);
                self.chunk.column_start = self.chunk.position + 1;
            }
            EscapeValue::Low(_) => self.append_decoded(INVALID_ESCAPE),
        }
    }

    /// A held high surrogate that no low surrogate followed decodes to U+FFFD.
    /// The character at the cursor stays pending.
    fn release_high_surrogate(&mut self) {
        if self.state.high_surrogate.take().is_none() {
            return;
        }
        if self.chunk.column_start < self.chunk.position {
            let pending = self.chunk.slice(self.chunk.column_start, self.chunk.position);
            self.column.extend_from_slice(pending);
        }
        self.chunk.column_start = self.chunk.position;
        self.column.push(INVALID_ESCAPE);
    }

    /// Move `chunk[column_start, position)` into the column accumulator.
    fn flush_pending(&mut self) {
        if self.state.started_column && self.chunk.column_start < self.chunk.position {
            let pending = self.chunk.slice(self.chunk.column_start, self.chunk.position);
            self.column.extend_from_slice(pending);
        }
        self.chunk.column_start = self.chunk.position + 1;
    }

    fn append_decoded(&mut self, ch: char) {
        self.column.push(ch);
        self.chunk.column_start = self.chunk.position + 1;
    }

    fn end_column(&mut self) -> Result<()> {
        self.release_high_surrogate();
        let mut value = String::new();
        if self.state.started_column {
            let trim = self.config.trim_whitespace && !self.state.started_with_qualifier;
            if self.column.is_empty() {
                let text = self.chunk.slice(self.chunk.column_start, self.chunk.position);
                value = collect_value(text, trim);
            } else {
                self.flush_pending();
                value = self.column.to_value(trim);
            }
        }

        self.column.clear();
        self.state.started_column = false;

        if self.config.safety_switch && self.record.len() >= MAX_COLUMN_COUNT {
            return Err(CsvError::ColumnCountExceeded {
                limit: MAX_COLUMN_COUNT,
                record: self.records_read,
            });
        }

        self.record
            .push(Column::new(value, self.state.started_with_qualifier));
        Ok(())
    }

    fn end_record(&mut self) {
        self.state.record_complete = true;
        self.records_read += 1;
    }

    /// Load the next chunk, carrying pending column and raw text over.
    fn refill(&mut self) -> Result<()> {
        self.flush_pending();

        if self.config.capture_raw_record && self.chunk.count > 0 {
            let carried = self.chunk.slice(self.chunk.line_start, self.chunk.count);
            self.raw.extend_from_slice(carried);
        }

        let count = self.source.read_chars(self.chunk.spare())?;
        trace!("refilled chunk with {count} chars");
        if count == 0 {
            self.state.has_more_data = false;
        }
        self.chunk.reset(count);
        Ok(())
    }

    fn capture_raw_record(&mut self) {
        self.raw_record.clear();
        if !self.config.capture_raw_record {
            return;
        }

        if !self.raw.is_empty() {
            self.raw_record.push_str(self.raw.as_str());
        }
        if self.state.has_more_data {
            // The cursor sits one past the record terminator.
            let end = self.chunk.position.saturating_sub(1);
            self.raw_record
                .extend(self.chunk.slice(self.chunk.line_start, end));
        }
    }
}
