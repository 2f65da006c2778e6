//! Construction parameters of a [`crate::Table`].

use std::{ops::Range, sync::Arc};

use ahash::{AHashMap, AHashSet};
use pdstable_format::{KeyColumnNames, ValidityOverrides, Value};

use crate::time::TimeConverter;

/// Per-column repair hook, applied to the raw (Latin-1 decoded) field text of every row
/// before any other processing.
pub type FieldCallback = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Hook applied to the raw records right after they have been read and counted.
pub type RecordsCallback = Arc<dyn Fn(Vec<Vec<u8>>) -> Vec<Vec<u8>> + Send + Sync>;

/// Exact-match value substitutions for one column.
///
/// Pairs whose both sides are strings are applied to the raw field text before type
/// conversion, matching either the raw text or its trimmed form. All other pairs are
/// applied to the converted values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Replacements {
    pairs: Vec<(Value, Value)>,
}

impl Replacements {
    pub fn new() -> Replacements {
        Default::default()
    }

    pub fn with(mut self, before: impl Into<Value>, after: impl Into<Value>) -> Self {
        self.pairs.push((before.into(), after.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(Value, Value)] {
        &self.pairs
    }

    /// Text substitutions applied before conversion.
    pub fn raw_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .filter_map(|(before, after)| Some((before.as_str()?, after.as_str()?)))
    }

    /// Substitutions applied to converted values.
    pub fn typed_pairs(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.pairs
            .iter()
            .filter(|(before, after)| !(before.is_string() && after.is_string()))
            .map(|(before, after)| (before, after))
    }
}

/// Options controlling how a table is read and decoded.
///
/// All fields are public; the `with_*` methods are provided for chained construction.
#[derive(Clone, Default)]
pub struct TableOptions {
    /// Columns to decode, in the requested order. Empty selects every column.
    pub columns: Vec<String>,
    /// Time columns converted to seconds by [`TableOptions::time_converter`]. Time
    /// columns not listed here are decoded as strings.
    pub times: AHashSet<String>,
    /// String columns whose values keep their surrounding whitespace.
    pub nostrip: AHashSet<String>,
    pub callbacks: AHashMap<String, FieldCallback>,
    pub replacements: AHashMap<String, Replacements>,
    /// Caller validity rules, unioned with the ones declared by the schema.
    pub validity: ValidityOverrides,
    /// One mask bit per row (`true`) or per row and item (`false`) for multi-item
    /// columns.
    pub merge_masks: bool,
    /// Number of leading characters of a filename key that are significant. Zero keeps
    /// the whole key.
    pub filename_keylen: usize,
    /// Decode only the records in this range. Requires fixed-length records.
    pub row_range: Option<Range<usize>>,
    pub records_callback: Option<RecordsCallback>,
    pub time_converter: Option<Arc<dyn TimeConverter>>,
    /// Synonym lists used to locate the volume-ID and file-specification columns.
    pub key_columns: KeyColumnNames,
    /// Upper bound on the number of columns decoded concurrently. `Some(1)` decodes
    /// sequentially on the calling thread. Larger bounds run on a process-wide pool of
    /// that many threads, started by the first table that asks for it and shared by
    /// later ones. `None` uses the global rayon pool.
    pub max_parallelism: Option<usize>,
}

impl TableOptions {
    pub fn new() -> TableOptions {
        Default::default()
    }

    pub fn with_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_times(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.times.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn with_nostrip(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.nostrip.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn with_callback<F>(mut self, column: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.callbacks.insert(column.into(), Arc::new(callback));
        self
    }

    pub fn with_replacements(mut self, column: impl Into<String>, replacements: Replacements) -> Self {
        self.replacements.insert(column.into(), replacements);
        self
    }

    pub fn with_validity(mut self, validity: ValidityOverrides) -> Self {
        self.validity = validity;
        self
    }

    pub fn with_merge_masks(mut self, merge_masks: bool) -> Self {
        self.merge_masks = merge_masks;
        self
    }

    pub fn with_filename_keylen(mut self, filename_keylen: usize) -> Self {
        self.filename_keylen = filename_keylen;
        self
    }

    pub fn with_row_range(mut self, row_range: Range<usize>) -> Self {
        self.row_range = Some(row_range);
        self
    }

    pub fn with_records_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(Vec<Vec<u8>>) -> Vec<Vec<u8>> + Send + Sync + 'static,
    {
        self.records_callback = Some(Arc::new(callback));
        self
    }

    pub fn with_time_converter(mut self, converter: impl TimeConverter + 'static) -> Self {
        self.time_converter = Some(Arc::new(converter));
        self
    }

    pub fn with_key_columns(mut self, key_columns: KeyColumnNames) -> Self {
        self.key_columns = key_columns;
        self
    }

    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = Some(max_parallelism);
        self
    }

    pub(crate) fn strips(&self, column: &str) -> bool {
        !self.nostrip.contains(column)
    }

    pub(crate) fn converts_time(&self, column: &str) -> bool {
        self.times.contains(column)
    }
}

#[cfg(test)]
mod tests {
    use super::{Replacements, TableOptions};
    use pdstable_format::Value;

    #[test]
    fn test_replacement_passes() {
        let replacements = Replacements::new()
            .with("N/A", "-999")
            .with(-1, 0)
            .with("x", 5);
        assert_eq!(replacements.raw_pairs().collect::<Vec<_>>(), [("N/A", "-999")]);
        let typed = replacements.typed_pairs().collect::<Vec<_>>();
        assert_eq!(typed.len(), 2);
        assert_eq!(typed[0], (&Value::Integer(-1), &Value::Integer(0)));
    }

    #[test]
    fn test_options_builder() {
        let options = TableOptions::new()
            .with_columns(["A", "B"])
            .with_times(["START_TIME"])
            .with_nostrip(["B"])
            .with_row_range(2..4);
        assert_eq!(options.columns, ["A", "B"]);
        assert!(options.converts_time("START_TIME"));
        assert!(!options.strips("B"));
        assert!(options.strips("A"));
        assert_eq!(options.row_range, Some(2..4));
        assert!(!options.merge_masks);
    }
}
