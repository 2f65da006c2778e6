//! Slicing of raw records into column fields.

use std::ops::Range;

use pdstable_common::{
    Result,
    error::{Error, ErrorKind},
};
use pdstable_format::{ColumnSchema, RecordLayout};

use crate::records::RawRecords;

/// Extracts the raw bytes of column items from the records of a table.
///
/// Delimited records are split into fields once, when the slicer is created.
pub struct RecordSlicer<'r> {
    records: &'r RawRecords,
    fields: Option<Vec<Vec<Range<usize>>>>,
}

impl<'r> RecordSlicer<'r> {
    pub fn new(records: &'r RawRecords, layout: RecordLayout) -> RecordSlicer<'r> {
        let fields = layout.field_delimiter().map(|delimiter| {
            records
                .iter()
                .map(|record| split_delimited(record, delimiter))
                .collect()
        });
        RecordSlicer { records, fields }
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    /// Number of items sliced for `column`. Item geometry only exists for fixed-length
    /// records; a delimited field is always a single item.
    pub fn item_count(&self, column: &ColumnSchema) -> usize {
        if self.fields.is_some() {
            1
        } else {
            column.item_count()
        }
    }

    /// Returns the raw bytes of item `item` of `column` for every record.
    pub fn slice(&self, column: &ColumnSchema, item: usize) -> Result<Vec<&'r [u8]>> {
        match &self.fields {
            None => self.slice_fixed(column, item),
            Some(fields) => self.slice_delimited(fields, column),
        }
    }

    fn slice_fixed(&self, column: &ColumnSchema, item: usize) -> Result<Vec<&'r [u8]>> {
        let records = self.records;
        let range = column.item_range(item).ok_or_else(|| {
            Error::schema(format!("column '{}' has no byte geometry", column.name()))
        })?;
        records
            .iter()
            .enumerate()
            .map(|(row, record)| {
                let content = strip_terminator(record);
                content.get(range.clone()).ok_or_else(|| {
                    Error::from(ErrorKind::RecordTooShort {
                        row,
                        column: column.name().to_string(),
                        required: range.end,
                        actual: content.len(),
                    })
                })
            })
            .collect()
    }

    fn slice_delimited(
        &self,
        fields: &[Vec<Range<usize>>],
        column: &ColumnSchema,
    ) -> Result<Vec<&'r [u8]>> {
        let records = self.records;
        let index = column.field_number();
        fields
            .iter()
            .enumerate()
            .map(|(row, bounds)| -> Result<&'r [u8]> {
                let range = bounds.get(index).ok_or_else(|| ErrorKind::RecordTooShort {
                    row,
                    column: column.name().to_string(),
                    required: index + 1,
                    actual: bounds.len(),
                })?;
                Ok(&records.record(row)[range.clone()])
            })
            .collect()
    }
}

/// Splits a delimited record into field byte ranges.
///
/// The line terminator is removed first. A delimiter inside double quotes does not end
/// a field, and the enclosing quotes of a quoted field are excluded from its range.
///
/// Only a field whose first non-blank byte is a double quote is quoted; a quote
/// elsewhere in a field is literal text.
pub fn split_delimited(record: &[u8], delimiter: u8) -> Vec<Range<usize>> {
    let end = strip_terminator(record).len();

    let mut fields = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut leading_blank = true;
    for (i, &b) in record[..end].iter().enumerate() {
        if quoted {
            quoted = b != b'"';
        } else if b == delimiter {
            fields.push(unquote(record, start..i));
            start = i + 1;
            leading_blank = true;
        } else if leading_blank && b == b'"' {
            quoted = true;
            leading_blank = false;
        } else if !b.is_ascii_whitespace() {
            leading_blank = false;
        }
    }
    fields.push(unquote(record, start..end));
    fields
}

/// The record without its trailing `\n` or `\r\n`.
fn strip_terminator(record: &[u8]) -> &[u8] {
    let record = record.strip_suffix(b"\n").unwrap_or(record);
    record.strip_suffix(b"\r").unwrap_or(record)
}

fn unquote(record: &[u8], range: Range<usize>) -> Range<usize> {
    let field = &record[range.clone()];
    let Some(first) = field.iter().position(|b| !b.is_ascii_whitespace()) else {
        return range;
    };
    let last = field.iter().rposition(|b| !b.is_ascii_whitespace()).unwrap_or(first);
    if last > first && field[first] == b'"' && field[last] == b'"' {
        range.start + first + 1..range.start + last
    } else {
        range
    }
}
