//! Validity configuration: invalid-value sets and valid ranges.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Inclusive numeric range of valid values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidRange {
    pub min: f64,
    pub max: f64,
}

impl ValidRange {
    pub fn new(min: f64, max: f64) -> ValidRange {
        ValidRange { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Caller-supplied validity rules, applied on top of the constants declared by the label.
///
/// For every column the per-name invalid set is used when present, otherwise the
/// `default_invalid` bucket. A per-name valid range replaces the label's range.
#[derive(Debug, Clone, Default)]
pub struct ValidityOverrides {
    pub default_invalid: Vec<Value>,
    pub invalid: AHashMap<String, Vec<Value>>,
    pub valid_ranges: AHashMap<String, ValidRange>,
}

impl ValidityOverrides {
    pub fn new() -> ValidityOverrides {
        Default::default()
    }

    pub fn with_default_invalid(
        mut self,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> ValidityOverrides {
        self.default_invalid = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_invalid(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> ValidityOverrides {
        self.invalid.insert(
            column.into(),
            values.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn with_valid_range(mut self, column: impl Into<String>, range: ValidRange) -> Self {
        self.valid_ranges.insert(column.into(), range);
        self
    }

    pub fn invalid_for(&self, column: &str) -> &[Value] {
        self.invalid
            .get(column)
            .map(Vec::as_slice)
            .unwrap_or(&self.default_invalid)
    }

    pub fn valid_range_for(&self, column: &str) -> Option<ValidRange> {
        self.valid_ranges.get(column).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.default_invalid.is_empty() && self.invalid.is_empty() && self.valid_ranges.is_empty()
    }
}
