//! Export of decoded columns as Arrow arrays.
//!
//! Masked values become nulls. A multi-item column becomes a `FixedSizeList` array; its
//! child values carry the per-item mask when masks are not merged.

use std::sync::Arc;

use arrow_array::{
    Array, ArrayRef, BooleanArray, FixedSizeListArray, Float64Array, Int64Array, RecordBatch,
    StringArray,
};
use arrow_buffer::NullBuffer;
use arrow_schema::{DataType, Field, Schema};
use pdstable_common::{Result, error::Error};

use crate::{
    column::{Column, ColumnMask, ColumnValues},
    table::Table,
};

impl Column {
    /// Arrow data type of [`Column::to_arrow`].
    pub fn arrow_data_type(&self) -> DataType {
        let item_type = value_data_type(self.values());
        if self.is_multi_item() {
            DataType::FixedSizeList(
                Arc::new(Field::new("item", item_type, true)),
                self.item_count() as i32,
            )
        } else {
            item_type
        }
    }

    pub fn to_arrow(&self) -> Result<ArrayRef> {
        let row_nulls = nulls_from_mask(&self.mask().merged());
        if !self.is_multi_item() {
            return Ok(values_to_array(self.values(), row_nulls));
        }

        let item_nulls = match self.mask() {
            ColumnMask::PerItem { bits, .. } => nulls_from_mask(bits),
            ColumnMask::Merged(_) => None,
        };
        let items = values_to_array(self.values(), item_nulls);
        let field = Arc::new(Field::new("item", items.data_type().clone(), true));
        let list = FixedSizeListArray::try_new(field, self.item_count() as i32, items, row_nulls)
            .map_err(|e| Error::arrow(format!("column '{}'", self.name()), e))?;
        Ok(Arc::new(list))
    }
}

impl Table {
    /// Assembles the decoded columns into a `RecordBatch`, one nullable field per
    /// column.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let fields = self
            .columns()
            .iter()
            .map(|column| Field::new(column.name(), column.arrow_data_type(), true))
            .collect::<Vec<_>>();
        let arrays = self
            .columns()
            .iter()
            .map(Column::to_arrow)
            .collect::<Result<Vec<_>>>()?;
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
            .map_err(|e| Error::arrow("record batch", e))
    }
}

fn value_data_type(values: &ColumnValues) -> DataType {
    match values {
        ColumnValues::Integer(_) => DataType::Int64,
        ColumnValues::Float(_) => DataType::Float64,
        ColumnValues::String(_) => DataType::Utf8,
        ColumnValues::Boolean(_) => DataType::Boolean,
    }
}

/// Converts an invalid-value mask into a validity buffer, `None` when nothing is masked.
fn nulls_from_mask(mask: &[bool]) -> Option<NullBuffer> {
    if mask.iter().any(|&masked| masked) {
        Some(NullBuffer::from_iter(mask.iter().map(|&masked| !masked)))
    } else {
        None
    }
}

fn values_to_array(values: &ColumnValues, nulls: Option<NullBuffer>) -> ArrayRef {
    match values {
        ColumnValues::Integer(v) => Arc::new(Int64Array::new(v.clone().into(), nulls)),
        ColumnValues::Float(v) => Arc::new(Float64Array::new(v.clone().into(), nulls)),
        ColumnValues::Boolean(v) => Arc::new(BooleanArray::new(v.as_slice().into(), nulls)),
        ColumnValues::String(v) => {
            let array = v
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    nulls
                        .as_ref()
                        .is_none_or(|nulls| nulls.is_valid(i))
                        .then_some(s.as_str())
                })
                .collect::<StringArray>();
            Arc::new(array)
        }
    }
}

#[cfg(test)]
mod tests {
    use arrow_array::{Array, FixedSizeListArray, Int64Array, StringArray};
    use pdstable_format::LogicalType;

    use crate::column::{Column, ColumnMask, ColumnValues};

    #[test]
    fn test_scalar_export() {
        let column = Column::new(
            "N".into(),
            LogicalType::Integer,
            1,
            ColumnValues::Integer(vec![3, -999, 12]),
            ColumnMask::Merged(vec![false, true, false]),
        );
        let array = column.to_arrow().unwrap();
        let ints = array.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(ints.len(), 3);
        assert!(ints.is_null(1));
        assert_eq!(ints.value(2), 12);
    }

    #[test]
    fn test_multi_item_export() {
        let column = Column::new(
            "S".into(),
            LogicalType::String,
            2,
            ColumnValues::String(vec!["a".into(), "b".into(), "c".into(), "d".into()]),
            ColumnMask::PerItem {
                item_count: 2,
                bits: vec![false, false, false, true],
            },
        );
        let array = column.to_arrow().unwrap();
        let list = array.as_any().downcast_ref::<FixedSizeListArray>().unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.is_null(1));
        let items = list.values().as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(items.value(2), "c");
        assert!(items.is_null(3));
    }
}
