//! Character sources feeding the chunk buffer.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

use encoding_rs::{CoderResult, Decoder, Encoding};
use log::{debug, warn};

/// Buffered reader capacity for file sources.
const FILE_READ_BUFFER: usize = 4 * 1024;

/// Bytes pulled from a byte stream per decode step.
const BYTE_CHUNK: usize = 8 * 1024;

/// Where characters come from.
pub(crate) enum Source {
    /// A file that is opened on the first read.
    Pending {
        path: PathBuf,
        encoding: &'static Encoding,
    },
    /// An open byte stream decoded into characters.
    Stream(DecodingReader),
    /// In-memory text.
    Text(TextReader),
}

impl Source {
    pub(crate) fn pending(path: PathBuf, encoding: &'static Encoding) -> Self {
        Source::Pending { path, encoding }
    }

    pub(crate) fn stream(reader: Box<dyn Read>, encoding: &'static Encoding) -> Self {
        Source::Stream(DecodingReader::new(reader, encoding))
    }

    pub(crate) fn text(text: String) -> Self {
        Source::Text(TextReader { text, offset: 0 })
    }

    /// Fill `out` with up to `out.len()` characters. Returns 0 at end of source.
    pub(crate) fn read_chars(&mut self, out: &mut [char]) -> io::Result<usize> {
        match self {
            Source::Pending { path, encoding } => {
                let encoding = *encoding;
                debug!("opening {} as {}", path.display(), encoding.name());
                let file = File::open(path.as_path())?;
                let reader = BufReader::with_capacity(FILE_READ_BUFFER, file);
                let mut decoding = DecodingReader::new(Box::new(reader), encoding);
                let read = decoding.read_chars(out);
                *self = Source::Stream(decoding);
                read
            }
            Source::Stream(reader) => reader.read_chars(out),
            Source::Text(reader) => Ok(reader.read_chars(out)),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Pending { path, encoding } => f
                .debug_struct("Pending")
                .field("path", path)
                .field("encoding", &encoding.name())
                .finish(),
            Source::Stream(reader) => f
                .debug_struct("Stream")
                .field("encoding", &reader.encoding.name())
                .field("finished", &reader.finished)
                .finish(),
            Source::Text(reader) => f
                .debug_struct("Text")
                .field("len", &reader.text.len())
                .field("offset", &reader.offset)
                .finish(),
        }
    }
}

/// Decodes a byte stream into characters with `encoding_rs`.
///
/// A BOM at the start of the stream overrides `encoding` and is dropped.
pub(crate) struct DecodingReader {
    inner: Box<dyn Read>,
    encoding: &'static Encoding,
    decoder: Decoder,
    bytes: Vec<u8>,
    decoded: String,
    cursor: usize,
    finished: bool,
    warned: bool,
}

impl DecodingReader {
    fn new(inner: Box<dyn Read>, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            encoding,
            decoder: encoding.new_decoder(),
            bytes: vec![0; BYTE_CHUNK],
            decoded: String::new(),
            cursor: 0,
            finished: false,
            warned: false,
        }
    }

    fn read_chars(&mut self, out: &mut [char]) -> io::Result<usize> {
        loop {
            if self.cursor < self.decoded.len() {
                let mut n = 0;
                for ch in self.decoded[self.cursor..].chars().take(out.len()) {
                    out[n] = ch;
                    n += 1;
                    self.cursor += ch.len_utf8();
                }
                return Ok(n);
            }

            if self.finished || out.is_empty() {
                return Ok(0);
            }

            self.decode_next()?;
        }
    }

    /// Read one block of bytes and decode it, flushing the decoder at end of input.
    fn decode_next(&mut self) -> io::Result<()> {
        let read = loop {
            match self.inner.read(&mut self.bytes) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        let last = read == 0;

        self.decoded.clear();
        self.cursor = 0;
        let needed = self
            .decoder
            .max_utf8_buffer_length(read)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "decode buffer overflow"))?;
        self.decoded.reserve(needed);

        let (result, _, replaced) =
            self.decoder
                .decode_to_string(&self.bytes[..read], &mut self.decoded, last);
        // The reserve above leaves room for the whole block.
        debug_assert_eq!(result, CoderResult::InputEmpty);
        if replaced && !self.warned {
            warn!(
                "malformed {} input replaced with U+FFFD",
                self.encoding.name()
            );
            self.warned = true;
        }
        if last {
            self.finished = true;
        }
        Ok(())
    }
}

/// Serves characters out of an owned string.
pub(crate) struct TextReader {
    text: String,
    offset: usize,
}

impl TextReader {
    fn read_chars(&mut self, out: &mut [char]) -> usize {
        let mut n = 0;
        for ch in self.text[self.offset..].chars().take(out.len()) {
            out[n] = ch;
            n += 1;
            self.offset += ch.len_utf8();
        }
        n
    }
}
