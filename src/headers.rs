//! Header name lookup.

use foldhash::{HashMap, HashMapExt};
use log::debug;

/// Header names with a name→index map.
///
/// When a name occurs more than once, lookups return the index of its last
/// occurrence.
#[derive(Debug, Clone, Default)]
pub struct HeaderTable {
    names: Vec<String>,
    index_by_name: HashMap<String, usize>,
}

impl HeaderTable {
    /// Build a table from header names in column order.
    pub fn new(names: Vec<String>) -> Self {
        let mut index_by_name = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            index_by_name.insert(name.clone(), i);
        }

        if index_by_name.len() < names.len() {
            debug!(
                "header row has {} duplicate name(s); lookups use the last occurrence",
                names.len() - index_by_name.len()
            );
        }

        Self {
            names,
            index_by_name,
        }
    }

    /// Number of headers.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if there are no headers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Header name at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Column index for `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    /// Header names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
