//! Row lookups by key/value predicates.

use ahash::AHashSet;
use itertools::Itertools;
use pdstable_common::{Result, error::Error};
use pdstable_format::Value;

use crate::{
    row_dict::{LowercaseOptions, RowDict, key_lookup},
    table::Table,
};

/// Conjunction of `key = value` predicates over row-dictionary keys.
///
/// Keys are resolved like the keys of a [`RowDict`] built with the query's
/// [`LowercaseOptions`], so `<name>_lower` keys compare against lower-cased values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowQuery {
    predicates: Vec<(String, Value)>,
    substring_keys: AHashSet<String>,
    lowercase: LowercaseOptions,
    limit: Option<usize>,
}

impl RowQuery {
    pub fn new() -> RowQuery {
        Default::default()
    }

    /// Requires the value under `key` to equal `value`.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push((key.into(), value.into()));
        self
    }

    /// Requires the string under `key` to contain `value`.
    pub fn with_substring(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.substring_keys.insert(key.clone());
        self.predicates.push((key, Value::String(value.into())));
        self
    }

    pub fn with_lowercase(mut self, lowercase: LowercaseOptions) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// Stops after `limit` matching rows. Zero means no limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn predicates(&self) -> &[(String, Value)] {
        &self.predicates
    }

    pub fn lowercase(&self) -> LowercaseOptions {
        self.lowercase
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit.filter(|&limit| limit > 0)
    }

    /// Returns `true` if `key`, or the column key of a `<key>_lower` entry, is tested
    /// for substrings.
    pub fn is_substring_key(&self, key: &str) -> bool {
        self.substring_keys.contains(key)
            || key
                .strip_suffix("_lower")
                .is_some_and(|stem| self.substring_keys.contains(stem))
    }

    /// Human-readable form of the predicates.
    pub fn describe(&self) -> String {
        self.predicates
            .iter()
            .map(|(key, value)| {
                if self.is_substring_key(key) {
                    format!("{key} contains {value}")
                } else {
                    format!("{key}={value}")
                }
            })
            .join(", ")
    }
}

impl Table {
    /// Returns the indices of the rows matching every predicate of `query`, in row
    /// order.
    ///
    /// A row matches a predicate if its mask for the column is entirely false and its
    /// value equals the predicate value (or contains it, for substring keys). Every
    /// item of a multi-item column must match. Fails with `UnknownColumn` if a key
    /// does not resolve to a decoded column.
    pub fn find_row_indices(&self, query: &RowQuery) -> Result<Vec<usize>> {
        let lookup = key_lookup(self.columns(), query.lowercase());
        let predicates = query
            .predicates()
            .iter()
            .map(|(key, value)| -> Result<_> {
                let &(index, lowercase) = lookup
                    .get(key.as_str())
                    .ok_or_else(|| Error::unknown_column(key.as_str()))?;
                let expected = if lowercase {
                    value.to_lowercase()
                } else {
                    value.clone()
                };
                Ok((&self.columns()[index], expected, query.is_substring_key(key), lowercase))
            })
            .collect::<Result<Vec<_>>>()?;

        let limit = query.limit();
        let mut rows = Vec::new();
        for row in 0..self.row_count() {
            let matches = predicates.iter().all(|(column, expected, substring, lowercase)| {
                column.row_matches(row, expected, *substring, *lowercase)
            });
            if matches {
                rows.push(row);
                if limit.is_some_and(|limit| rows.len() >= limit) {
                    break;
                }
            }
        }
        Ok(rows)
    }

    /// Returns the first matching row index, or `RowNotFound`.
    pub fn find_row_index(&self, query: &RowQuery) -> Result<usize> {
        let rows = self.find_row_indices(&query.clone().with_limit(1))?;
        rows.first()
            .copied()
            .ok_or_else(|| Error::row_not_found(query.describe()))
    }

    /// Returns the row dictionaries of the matching rows, built with the query's
    /// lower-casing options.
    pub fn find_rows(&self, query: &RowQuery) -> Result<Vec<RowDict>> {
        let rows = self.find_row_indices(query)?;
        let dicts = self.row_dicts(query.lowercase());
        Ok(rows.into_iter().map(|row| dicts[row].clone()).collect())
    }

    /// Returns the row dictionary of the first matching row, or `RowNotFound`.
    pub fn find_row(&self, query: &RowQuery) -> Result<RowDict> {
        let row = self.find_row_index(query)?;
        Ok(self.row_dicts(query.lowercase())[row].clone())
    }
}

#[cfg(test)]
mod tests {
    use pdstable_format::Value;

    use super::RowQuery;
    use crate::row_dict::LowercaseOptions;

    #[test]
    fn test_query_builder() {
        let query = RowQuery::new()
            .with_value("VOLUME_ID_lower", "coiss_2001")
            .with_substring("FILE_SPECIFICATION_NAME", "N1454")
            .with_lowercase(LowercaseOptions::new(false, true))
            .with_limit(0);
        assert_eq!(query.predicates().len(), 2);
        assert_eq!(query.predicates()[0].1, Value::from("coiss_2001"));
        assert!(query.is_substring_key("FILE_SPECIFICATION_NAME_lower"));
        assert!(!query.is_substring_key("VOLUME_ID_lower"));
        assert_eq!(query.limit(), None);
        assert_eq!(
            query.describe(),
            "VOLUME_ID_lower=\"coiss_2001\", FILE_SPECIFICATION_NAME contains \"N1454\""
        );
    }
}
