use std::ops::Range;

use crate::{
    logical_type::LogicalType,
    validity::{ValidRange, ValidityOverrides},
    value::{Value, ValueKind},
};

/// Immutable description of one table column: its byte geometry within a record,
/// its logical type and its validity rules.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    name: String,
    column_number: usize,
    field_number: usize,
    start_byte: Option<usize>,
    byte_length: Option<usize>,
    item_count: usize,
    item_byte_length: Option<usize>,
    item_offset: Option<usize>,
    logical_type: LogicalType,
    numeric_base: u32,
    invalid_values: Vec<Value>,
    valid_range: Option<ValidRange>,
}

impl ColumnSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zero-based declaration order.
    pub fn column_number(&self) -> usize {
        self.column_number
    }

    /// Zero-based position of the field within a delimited record.
    pub fn field_number(&self) -> usize {
        self.field_number
    }

    /// One-based start byte within a fixed-width record.
    pub fn start_byte(&self) -> Option<usize> {
        self.start_byte
    }

    pub fn byte_length(&self) -> Option<usize> {
        self.byte_length
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn item_byte_length(&self) -> Option<usize> {
        self.item_byte_length.or(self.byte_length)
    }

    pub fn item_offset(&self) -> Option<usize> {
        self.item_offset.or(self.byte_length)
    }

    pub fn is_multi_item(&self) -> bool {
        self.item_count > 1
    }

    pub fn logical_type(&self) -> LogicalType {
        self.logical_type
    }

    pub fn numeric_base(&self) -> u32 {
        self.numeric_base
    }

    pub fn invalid_values(&self) -> &[Value] {
        &self.invalid_values
    }

    pub fn valid_range(&self) -> Option<ValidRange> {
        self.valid_range
    }

    /// Zero-based byte range of the whole column within a fixed-width record.
    pub fn record_range(&self) -> Option<Range<usize>> {
        let start = self.start_byte?.checked_sub(1)?;
        Some(start..start + self.byte_length?)
    }

    /// Zero-based byte range of item `index` within a fixed-width record.
    pub fn item_range(&self, index: usize) -> Option<Range<usize>> {
        let column = self.record_range()?;
        let start = column.start + index * self.item_offset()?;
        Some(start..start + self.item_byte_length()?)
    }

    /// Returns `true` if `value` matches one of the declared invalid values.
    pub fn is_invalid_value(&self, value: &Value) -> bool {
        self.invalid_values.iter().any(|v| v.loosely_eq(value))
    }

    /// Returns `true` if a valid range is declared and the numeric `value` lies outside it.
    /// NaN is never out of range.
    pub fn is_out_of_range(&self, value: f64) -> bool {
        self.valid_range
            .is_some_and(|range| value < range.min || value > range.max)
    }

    /// Unions the invalid values chosen for this column by `overrides` into the declared
    /// set and replaces the valid range when an override exists.
    pub fn apply_overrides(&mut self, overrides: &ValidityOverrides) {
        for value in overrides.invalid_for(&self.name) {
            self.add_invalid_value(value.clone());
        }
        if let Some(range) = overrides.valid_range_for(&self.name) {
            self.valid_range = Some(range);
        }
    }

    fn add_invalid_value(&mut self, value: Value) {
        let value = normalize_literal(value, self.logical_type);
        if !self.invalid_values.iter().any(|v| v == &value) {
            self.invalid_values.push(value);
        }
    }

    pub(crate) fn set_position(&mut self, column_number: usize) {
        self.column_number = column_number;
        if self.field_number == usize::MAX {
            self.field_number = column_number;
        }
    }
}

/// Textual literals declared for numeric columns are parsed, so that label constants such
/// as `"-999"` compare equal to decoded integers.
fn normalize_literal(value: Value, logical_type: LogicalType) -> Value {
    match value {
        Value::String(ref s) if logical_type.is_numeric() => {
            let kind = logical_type.value_kind(false);
            Value::parse_literal(s).coerce(kind).unwrap_or(value)
        }
        Value::String(ref s) if logical_type == LogicalType::Boolean => {
            value.coerce(ValueKind::Boolean).unwrap_or_else(|| Value::from(s.trim()))
        }
        other => other,
    }
}

/// Builder for a [`ColumnSchema`]. The column number is assigned when the column is
/// added to a [`crate::TableSchemaBuilder`].
#[derive(Debug, Clone)]
pub struct ColumnSchemaBuilder {
    column: ColumnSchema,
}

impl ColumnSchemaBuilder {
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> ColumnSchemaBuilder {
        ColumnSchemaBuilder {
            column: ColumnSchema {
                name: name.into(),
                column_number: 0,
                field_number: usize::MAX,
                start_byte: None,
                byte_length: None,
                item_count: 1,
                item_byte_length: None,
                item_offset: None,
                logical_type,
                numeric_base: 10,
                invalid_values: Vec::new(),
                valid_range: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.column.name
    }

    /// Sets the one-based start byte and the byte length of the column.
    pub fn with_geometry(mut self, start_byte: usize, byte_length: usize) -> Self {
        self.column.start_byte = Some(start_byte);
        self.column.byte_length = Some(byte_length);
        self
    }

    pub fn with_items(mut self, item_count: usize, item_byte_length: usize, item_offset: usize) -> Self {
        self.column.item_count = item_count;
        self.column.item_byte_length = Some(item_byte_length);
        self.column.item_offset = Some(item_offset);
        self
    }

    pub fn with_item_count(mut self, item_count: usize) -> Self {
        self.column.item_count = item_count;
        self
    }

    /// Sets the zero-based field position used by delimited layouts.
    pub fn with_field_number(mut self, field_number: usize) -> Self {
        self.column.field_number = field_number;
        self
    }

    pub fn with_numeric_base(mut self, numeric_base: u32) -> Self {
        self.column.numeric_base = numeric_base;
        self
    }

    pub fn with_invalid_values(mut self, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        for value in values {
            self.column.add_invalid_value(value.into());
        }
        self
    }

    pub fn with_valid_range(mut self, range: ValidRange) -> Self {
        self.column.valid_range = Some(range);
        self
    }

    pub fn with_overrides(mut self, overrides: &ValidityOverrides) -> Self {
        self.column.apply_overrides(overrides);
        self
    }

    pub fn finish(self) -> ColumnSchema {
        self.column
    }
}

#[cfg(test)]
mod tests {
    use super::ColumnSchemaBuilder;
    use crate::{LogicalType, ValidRange, ValidityOverrides, Value};

    #[test]
    fn test_item_geometry() {
        let column = ColumnSchemaBuilder::new("VECTOR", LogicalType::Float)
            .with_geometry(11, 26)
            .with_items(3, 8, 9)
            .finish();
        assert_eq!(column.record_range(), Some(10..36));
        assert_eq!(column.item_range(0), Some(10..18));
        assert_eq!(column.item_range(2), Some(28..36));
        assert!(column.is_multi_item());
    }

    #[test]
    fn test_scalar_defaults() {
        let column = ColumnSchemaBuilder::new("N", LogicalType::Integer)
            .with_geometry(1, 4)
            .finish();
        assert_eq!(column.item_byte_length(), Some(4));
        assert_eq!(column.item_offset(), Some(4));
        assert_eq!(column.item_range(0), column.record_range());
    }

    #[test]
    fn test_invalid_literals_are_typed() {
        let column = ColumnSchemaBuilder::new("N", LogicalType::Integer)
            .with_invalid_values(["-999", "N/A"])
            .with_overrides(
                &ValidityOverrides::new()
                    .with_default_invalid([0])
                    .with_valid_range("N", ValidRange::new(-1000.0, 100.0)),
            )
            .finish();
        assert!(column.is_invalid_value(&Value::Integer(-999)));
        assert!(column.is_invalid_value(&Value::Float(-999.0)));
        assert!(column.is_invalid_value(&Value::from("N/A")));
        assert!(column.is_invalid_value(&Value::Integer(0)));
        assert!(column.is_out_of_range(101.0));
        assert!(!column.is_out_of_range(-999.0));
    }
}
