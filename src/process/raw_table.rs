use std::collections::HashMap;

/// A score sheet as read from disk, before any column is selected.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Column names from the first line, in file order.
    pub headers: Vec<String>,
    /// Name → zero-based position. A duplicated name points at its last occurrence.
    pub header_index: HashMap<String, usize>,
    /// The second line, verbatim. Positionally aligned with `headers`.
    pub max_scores: Vec<String>,
    /// Each non-empty data line, as a Vec of Strings (one per field).
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, max_scores: Vec<String>) -> Self {
        let mut header_index = HashMap::with_capacity(headers.len());
        for (idx, name) in headers.iter().enumerate() {
            // last write wins
            header_index.insert(name.clone(), idx);
        }
        RawTable {
            headers,
            header_index,
            max_scores,
            rows: Vec::new(),
        }
    }

    /// True when nothing at all was read (missing or empty source).
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.header_index.get(name).copied()
    }
}
