/// One parsed column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Column {
    /// The column value after unquoting, unescaping and trimming.
    pub value: String,
    /// Whether the column started with the text qualifier.
    pub quoted: bool,
}

impl Column {
    /// Create a new column.
    pub fn new(value: impl Into<String>, quoted: bool) -> Self {
        Self {
            value: value.into(),
            quoted,
        }
    }

    /// The column value.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

const INITIAL_COLUMN_COUNT: usize = 10;

/// The record currently held by a reader. Overwritten on every read.
#[derive(Debug, Clone)]
pub(crate) struct Record {
    columns: Vec<Column>,
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl Record {
    pub(crate) fn new() -> Self {
        Self {
            columns: Vec::with_capacity(INITIAL_COLUMN_COUNT),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub(crate) fn push(&mut self, column: Column) {
        self.columns.push(column);
    }

    pub(crate) fn clear(&mut self) {
        self.columns.clear();
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub(crate) fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn values(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.value.clone()).collect()
    }
}
