//! Decoded columns.

use pdstable_format::{LogicalType, Value, ValueKind};

/// Typed values of a column, flattened row-major for multi-item columns.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Integer(Vec<i64>),
    Float(Vec<f64>),
    String(Vec<String>),
    Boolean(Vec<bool>),
}

impl ColumnValues {
    pub fn kind(&self) -> ValueKind {
        match self {
            ColumnValues::Integer(_) => ValueKind::Integer,
            ColumnValues::Float(_) => ValueKind::Float,
            ColumnValues::String(_) => ValueKind::String,
            ColumnValues::Boolean(_) => ValueKind::Boolean,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Integer(v) => v.len(),
            ColumnValues::Float(v) => v.len(),
            ColumnValues::String(v) => v.len(),
            ColumnValues::Boolean(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the value at flat position `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            ColumnValues::Integer(v) => v.get(index).copied().map(Value::Integer),
            ColumnValues::Float(v) => v.get(index).copied().map(Value::Float),
            ColumnValues::String(v) => v.get(index).cloned().map(Value::String),
            ColumnValues::Boolean(v) => v.get(index).copied().map(Value::Boolean),
        }
    }

    pub fn as_integers(&self) -> Option<&[i64]> {
        match self {
            ColumnValues::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            ColumnValues::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            ColumnValues::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_booleans(&self) -> Option<&[bool]> {
        match self {
            ColumnValues::Boolean(v) => Some(v),
            _ => None,
        }
    }

    /// Tests the value at flat position `index` against `expected`.
    ///
    /// With `lowercase` the stored string is lower-cased before the comparison. With
    /// `substring` a string value matches if it contains `expected`; substring tests on
    /// other values never match.
    fn matches(&self, index: usize, expected: &Value, substring: bool, lowercase: bool) -> bool {
        match self {
            ColumnValues::String(v) => {
                let Some(expected) = expected.as_str() else {
                    return false;
                };
                let value = &v[index];
                match (lowercase, substring) {
                    (false, false) => value == expected,
                    (false, true) => value.contains(expected),
                    (true, false) => value.to_lowercase() == expected,
                    (true, true) => value.to_lowercase().contains(expected),
                }
            }
            _ if substring => false,
            ColumnValues::Integer(v) => Value::Integer(v[index]).loosely_eq(expected),
            ColumnValues::Float(v) => Value::Float(v[index]).loosely_eq(expected),
            ColumnValues::Boolean(v) => Value::Boolean(v[index]).loosely_eq(expected),
        }
    }
}

/// Validity mask of a column. `true` marks an invalid value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnMask {
    /// One flag per row.
    Merged(Vec<bool>),
    /// One flag per row and item, flattened row-major.
    PerItem { item_count: usize, bits: Vec<bool> },
}

impl ColumnMask {
    /// Returns `true` if any item of `row` is invalid. Rows past the end are not
    /// masked.
    pub fn is_masked(&self, row: usize) -> bool {
        match self {
            ColumnMask::Merged(bits) => bits.get(row).copied().unwrap_or(false),
            ColumnMask::PerItem { item_count, bits } => item_bits(bits, *item_count, row)
                .is_some_and(|items| items.iter().any(|&b| b)),
        }
    }

    /// Mask of one row, or `None` past the end.
    pub fn row(&self, row: usize) -> Option<CellMask> {
        match self {
            ColumnMask::Merged(bits) => bits.get(row).copied().map(CellMask::Scalar),
            ColumnMask::PerItem { item_count, bits } => {
                item_bits(bits, *item_count, row).map(|items| CellMask::Items(items.to_vec()))
            }
        }
    }

    /// One flag per row, OR-ed across items.
    pub fn merged(&self) -> Vec<bool> {
        match self {
            ColumnMask::Merged(bits) => bits.clone(),
            ColumnMask::PerItem { item_count, bits } => bits
                .chunks(*item_count)
                .map(|items| items.iter().any(|&b| b))
                .collect(),
        }
    }
}

fn item_bits(bits: &[bool], item_count: usize, row: usize) -> Option<&[bool]> {
    bits.get(row * item_count..(row + 1) * item_count)
}

/// Value of one cell: a scalar, or the items of a multi-item column.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Scalar(Value),
    Items(Vec<Value>),
}

impl CellValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            CellValue::Scalar(v) => Some(v),
            CellValue::Items(_) => None,
        }
    }

    pub fn to_lowercase(&self) -> CellValue {
        match self {
            CellValue::Scalar(v) => CellValue::Scalar(v.to_lowercase()),
            CellValue::Items(items) => CellValue::Items(items.iter().map(Value::to_lowercase).collect()),
        }
    }
}

/// Mask of one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellMask {
    Scalar(bool),
    Items(Vec<bool>),
}

impl CellMask {
    pub fn any(&self) -> bool {
        match self {
            CellMask::Scalar(b) => *b,
            CellMask::Items(bits) => bits.iter().any(|&b| b),
        }
    }
}

/// A decoded column of a [`crate::Table`].
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    logical_type: LogicalType,
    item_count: usize,
    values: ColumnValues,
    mask: ColumnMask,
}

impl Column {
    pub(crate) fn new(
        name: String,
        logical_type: LogicalType,
        item_count: usize,
        values: ColumnValues,
        mask: ColumnMask,
    ) -> Column {
        Column {
            name,
            logical_type,
            item_count,
            values,
            mask,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logical_type(&self) -> LogicalType {
        self.logical_type
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn is_multi_item(&self) -> bool {
        self.item_count > 1
    }

    pub fn row_count(&self) -> usize {
        self.values.len() / self.item_count
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn mask(&self) -> &ColumnMask {
        &self.mask
    }

    /// Value of item `item` of `row`, or `None` when either is out of range.
    pub fn value(&self, row: usize, item: usize) -> Option<Value> {
        if item >= self.item_count {
            return None;
        }
        self.values.get(row * self.item_count + item)
    }

    /// Value of `row`, or `None` past the last row.
    pub fn cell(&self, row: usize) -> Option<CellValue> {
        if self.is_multi_item() {
            (0..self.item_count)
                .map(|i| self.value(row, i))
                .collect::<Option<Vec<_>>>()
                .map(CellValue::Items)
        } else {
            self.values.get(row).map(CellValue::Scalar)
        }
    }

    pub fn cell_mask(&self, row: usize) -> Option<CellMask> {
        self.mask.row(row)
    }

    pub fn is_masked(&self, row: usize) -> bool {
        self.mask.is_masked(row)
    }

    /// Returns `true` if no item of `row` is masked and every item matches
    /// `expected`. See [`ColumnValues`] for the comparison rules; with `lowercase`,
    /// `expected` must already be lower-cased.
    pub(crate) fn row_matches(
        &self,
        row: usize,
        expected: &Value,
        substring: bool,
        lowercase: bool,
    ) -> bool {
        if row >= self.row_count() || self.is_masked(row) {
            return false;
        }
        let start = row * self.item_count;
        (start..start + self.item_count)
            .all(|index| self.values.matches(index, expected, substring, lowercase))
    }
}
