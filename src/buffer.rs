//! Working buffers for the record state machine.

/// Chunk capacity for stream and in-memory sources.
pub(crate) const STREAM_CHUNK_CAPACITY: usize = 1024;

/// Chunk capacity for file sources.
pub(crate) const FILE_CHUNK_CAPACITY: usize = 4 * 1024;

const INITIAL_COLUMN_CAPACITY: usize = 50;
const INITIAL_RAW_CAPACITY: usize = INITIAL_COLUMN_CAPACITY * 10;

/// Fixed-capacity window over the source.
///
/// Invariant: `position <= count <= data.len()`. `column_start` and
/// `line_start` only refer to the current chunk and are reset on refill.
#[derive(Debug)]
pub(crate) struct ChunkBuffer {
    data: Vec<char>,
    pub(crate) position: usize,
    pub(crate) count: usize,
    pub(crate) column_start: usize,
    pub(crate) line_start: usize,
}

impl ChunkBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec!['\0'; capacity.max(1)],
            position: 0,
            count: 0,
            column_start: 0,
            line_start: 0,
        }
    }

    #[inline]
    pub(crate) fn is_exhausted(&self) -> bool {
        self.position == self.count
    }

    #[inline]
    pub(crate) fn current(&self) -> char {
        self.data[self.position]
    }

    /// Valid characters in `[start, end)`, clamped to the loaded part.
    #[inline]
    pub(crate) fn slice(&self, start: usize, end: usize) -> &[char] {
        let end = end.min(self.count);
        &self.data[start.min(end)..end]
    }

    /// The whole backing array, for the loader to fill.
    pub(crate) fn spare(&mut self) -> &mut [char] {
        &mut self.data
    }

    /// Start over on freshly loaded data.
    pub(crate) fn reset(&mut self, count: usize) {
        self.count = count;
        self.position = 0;
        self.line_start = 0;
        self.column_start = 0;
    }
}

/// Collects a column's characters when they cannot be sliced from the chunk.
///
/// Growth follows `Vec`: capacity doubles, or grows to the exact requirement
/// when doubling is not enough.
#[derive(Debug)]
pub(crate) struct ColumnBuffer {
    chars: Vec<char>,
}

impl ColumnBuffer {
    pub(crate) fn new() -> Self {
        Self {
            chars: Vec::with_capacity(INITIAL_COLUMN_CAPACITY),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.chars.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub(crate) fn extend_from_slice(&mut self, chars: &[char]) {
        self.chars.extend_from_slice(chars);
    }

    pub(crate) fn push(&mut self, ch: char) {
        self.chars.push(ch);
    }

    pub(crate) fn clear(&mut self) {
        self.chars.clear();
    }

    /// Contents as a string, optionally without trailing space/tab.
    pub(crate) fn to_value(&self, trim_trailing: bool) -> String {
        collect_value(&self.chars, trim_trailing)
    }
}

/// Carries the part of a raw record that was read before a chunk refill.
#[derive(Debug)]
pub(crate) struct RawBuffer {
    text: String,
}

impl RawBuffer {
    pub(crate) fn new() -> Self {
        Self {
            text: String::with_capacity(INITIAL_RAW_CAPACITY),
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub(crate) fn extend_from_slice(&mut self, chars: &[char]) {
        self.text.extend(chars);
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.text
    }

    pub(crate) fn clear(&mut self) {
        self.text.clear();
    }
}

#[inline]
pub(crate) fn is_trimmable(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

/// Build a string from `chars`, dropping trailing space/tab when asked.
pub(crate) fn collect_value(chars: &[char], trim_trailing: bool) -> String {
    let mut end = chars.len();
    if trim_trailing {
        while end > 0 && is_trimmable(chars[end - 1]) {
            end -= 1;
        }
    }
    chars[..end].iter().collect()
}
