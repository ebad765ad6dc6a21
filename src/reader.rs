//! The public reader: construction, lifecycle and per-record accessors.

use std::io::Read;
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use log::{debug, warn};

use crate::buffer::{FILE_CHUNK_CAPACITY, STREAM_CHUNK_CAPACITY};
use crate::config::ReaderConfig;
use crate::error::{CsvError, Result};
use crate::headers::HeaderTable;
use crate::machine::Scanner;
use crate::record::Column;
use crate::source::Source;

/// Streaming, pull-based reader for delimited text.
///
/// Each call to [`read_record`](CsvReader::read_record) parses one record,
/// which is then available through the accessors until the next read.
///
/// The reader fails closed: a source read error or a tripped safety limit
/// closes it before the error is returned, and every later call fails with
/// [`CsvError::Closed`].
///
/// # Example
///
/// ```
/// use csv_pull::CsvReader;
///
/// let mut reader = CsvReader::from_text("id,name\n1,\"Alice, A\"\n2,Bob\n");
/// reader.read_headers().unwrap();
///
/// assert!(reader.read_record().unwrap());
/// assert_eq!(reader.get_by_name("name").unwrap(), "Alice, A");
/// assert!(reader.is_qualified(1).unwrap());
///
/// assert!(reader.read_record().unwrap());
/// assert_eq!(reader.get(1).unwrap(), "Bob");
/// assert_eq!(reader.current_record_index().unwrap(), Some(1));
///
/// assert!(!reader.read_record().unwrap());
/// reader.close();
/// ```
#[derive(Debug)]
pub struct CsvReader {
    /// `None` once closed; dropping the scanner releases the source.
    inner: Option<Box<Scanner>>,
    headers: Option<HeaderTable>,
}

impl CsvReader {
    fn with_source(source: Source, chunk_capacity: usize) -> Self {
        Self {
            inner: Some(Box::new(Scanner::new(source, chunk_capacity))),
            headers: None,
        }
    }

    /// Read a file decoded with `encoding`.
    ///
    /// The file must exist now, but it is only opened on the first read.
    pub fn from_path<P: AsRef<Path>>(path: P, encoding: &'static Encoding) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CsvError::FileNotFound(path.to_path_buf()));
        }
        Ok(Self::with_source(
            Source::pending(path.to_path_buf(), encoding),
            FILE_CHUNK_CAPACITY,
        ))
    }

    /// Read UTF-8 text from an open stream.
    pub fn from_reader<R: Read + 'static>(reader: R) -> Self {
        Self::from_reader_with_encoding(reader, UTF_8)
    }

    /// Read text in `encoding` from an open byte stream.
    pub fn from_reader_with_encoding<R: Read + 'static>(
        reader: R,
        encoding: &'static Encoding,
    ) -> Self {
        Self::with_source(
            Source::stream(Box::new(reader), encoding),
            STREAM_CHUNK_CAPACITY,
        )
    }

    /// Read an in-memory string.
    pub fn from_text<S: Into<String>>(text: S) -> Self {
        Self::with_source(Source::text(text.into()), STREAM_CHUNK_CAPACITY)
    }

    /// Use `delimiter` as the column delimiter.
    pub fn with_delimiter(self, delimiter: char) -> Self {
        self.configure(|scanner| {
            scanner.config.delimiter = delimiter;
        })
    }

    /// Replace the whole configuration.
    pub fn with_config(self, config: ReaderConfig) -> Self {
        self.configure(|scanner| scanner.config = config)
    }

    /// Use a chunk buffer of `capacity` characters.
    pub fn with_chunk_capacity(self, capacity: usize) -> Self {
        self.configure(|scanner| scanner.set_chunk_capacity(capacity))
    }

    fn configure(mut self, apply: impl FnOnce(&mut Scanner)) -> Self {
        match self.inner.as_deref_mut() {
            Some(scanner) if !scanner.started => apply(scanner),
            _ => warn!("ignoring configuration change on a reader that already started"),
        }
        self
    }

    fn scanner(&self) -> Result<&Scanner> {
        self.inner.as_deref().ok_or(CsvError::Closed)
    }

    /// Run a read operation, closing the reader if it fails.
    fn drive<T>(&mut self, op: impl FnOnce(&mut Scanner) -> Result<T>) -> Result<T> {
        let scanner = self.inner.as_deref_mut().ok_or(CsvError::Closed)?;
        match op(scanner) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!("closing reader: {err}");
                self.close();
                Err(err)
            }
        }
    }

    /// The active configuration.
    pub fn config(&self) -> Result<&ReaderConfig> {
        Ok(&self.scanner()?.config)
    }

    /// Mutable access to the configuration. Fails once reading has started.
    pub fn config_mut(&mut self) -> Result<&mut ReaderConfig> {
        let scanner = self.inner.as_deref_mut().ok_or(CsvError::Closed)?;
        if scanner.started {
            return Err(CsvError::InvalidConfig(
                "configuration cannot change after reading has started".to_string(),
            ));
        }
        Ok(&mut scanner.config)
    }

    /// Read the next record. Returns false at end of source.
    pub fn read_record(&mut self) -> Result<bool> {
        self.drive(Scanner::read_record)
    }

    /// Read the next record and use its values as header names.
    ///
    /// The header record does not count toward
    /// [`current_record_index`](CsvReader::current_record_index).
    pub fn read_headers(&mut self) -> Result<bool> {
        let found = self.read_record()?;
        let scanner = self.inner.as_deref_mut().ok_or(CsvError::Closed)?;

        let table = HeaderTable::new(scanner.record.values());
        debug!("designated {} header(s)", table.len());
        self.headers = Some(table);

        if found {
            scanner.records_read -= 1;
        }
        scanner.record.clear();
        Ok(found)
    }

    /// Install header names without reading them from the source.
    pub fn set_headers(&mut self, headers: Vec<String>) -> Result<()> {
        self.scanner()?;
        self.headers = Some(HeaderTable::new(headers));
        Ok(())
    }

    /// Parse and discard the next record without counting it.
    pub fn skip_record(&mut self) -> Result<bool> {
        self.drive(|scanner| {
            if !scanner.has_more_data() {
                return Ok(false);
            }
            let found = scanner.read_record()?;
            if found {
                scanner.records_read -= 1;
            }
            Ok(found)
        })
    }

    /// Skip past the next CR or LF without interpreting columns.
    pub fn skip_line(&mut self) -> Result<bool> {
        self.drive(Scanner::skip_line)
    }

    /// Release the source and all buffers. Calling it again does nothing.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            debug!("reader closed");
        }
        self.headers = None;
    }

    /// Returns true once the reader has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Number of columns in the current record.
    pub fn column_count(&self) -> Result<usize> {
        Ok(self.scanner()?.record.len())
    }

    /// Zero-based index of the current record, or `None` before the first
    /// data record.
    pub fn current_record_index(&self) -> Result<Option<u64>> {
        Ok(self.scanner()?.records_read.checked_sub(1))
    }

    /// Value of column `index`, or `""` if there is no such column.
    pub fn get(&self, index: usize) -> Result<&str> {
        Ok(self
            .scanner()?
            .record
            .get(index)
            .map_or("", Column::as_str))
    }

    /// Value of the column named `header`, or `""` if unknown.
    pub fn get_by_name(&self, header: &str) -> Result<&str> {
        match self.index_of(header)? {
            Some(index) => self.get(index),
            None => Ok(""),
        }
    }

    /// Whether column `index` was wrapped in the text qualifier.
    pub fn is_qualified(&self, index: usize) -> Result<bool> {
        Ok(self
            .scanner()?
            .record
            .get(index)
            .is_some_and(|column| column.quoted))
    }

    /// All columns of the current record.
    pub fn columns(&self) -> Result<&[Column]> {
        Ok(self.scanner()?.record.columns())
    }

    /// Copy of the current record's values.
    pub fn values(&self) -> Result<Vec<String>> {
        Ok(self.scanner()?.record.values())
    }

    /// Raw text of the current record, without its terminator.
    ///
    /// Empty when raw capture is disabled.
    pub fn raw_record(&self) -> Result<&str> {
        Ok(self.scanner()?.raw_record())
    }

    /// Header name of column `index`, or `""` if there is none.
    pub fn header(&self, index: usize) -> Result<&str> {
        self.scanner()?;
        Ok(self
            .headers
            .as_ref()
            .and_then(|headers| headers.get(index))
            .unwrap_or(""))
    }

    /// Number of header names.
    pub fn header_count(&self) -> Result<usize> {
        self.scanner()?;
        Ok(self.headers.as_ref().map_or(0, HeaderTable::len))
    }

    /// Column index of `header`.
    pub fn index_of(&self, header: &str) -> Result<Option<usize>> {
        self.scanner()?;
        Ok(self
            .headers
            .as_ref()
            .and_then(|headers| headers.index_of(header)))
    }

    /// Copy of the header names, or `None` if headers were never set.
    pub fn headers(&self) -> Result<Option<Vec<String>>> {
        self.scanner()?;
        Ok(self.headers.as_ref().map(|headers| headers.names().to_vec()))
    }

    /// Iterate over the remaining records as owned values.
    ///
    /// The iterator stops after the first error.
    pub fn records(&mut self) -> Records<'_> {
        Records {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over the remaining records of a [`CsvReader`].
#[derive(Debug)]
pub struct Records<'a> {
    reader: &'a mut CsvReader,
    done: bool,
}

impl Iterator for Records<'_> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_record() {
            Ok(true) => Some(self.reader.values()),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
