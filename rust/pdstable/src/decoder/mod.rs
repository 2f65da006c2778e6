//! Per-column decoding: field callbacks, replacements, type conversion and validity
//! masking.
//!
//! Every item of a column is converted in bulk first. If any row fails, the item is
//! converted again row by row: failing rows are masked and reported through a single
//! [`ColumnDecodeWarning`] per column.

mod convert;

use std::{borrow::Cow, fmt};

use pdstable_common::{Result, error::Error};
use pdstable_format::{ColumnSchema, LogicalType, Value, ValueKind, value::parse_boolean};

use crate::{
    column::{Column, ColumnMask},
    options::{FieldCallback, TableOptions},
    slicer::RecordSlicer,
    time::TimeConverter,
};

use convert::{Scalar, latin1, parse_float, parse_integer};

/// Aggregated report of the rows of one column whose text could not be converted.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDecodeWarning {
    pub column: String,
    pub logical_type: LogicalType,
    pub failure_count: usize,
    /// Trimmed text of the first failing row.
    pub example: String,
}

impl fmt::Display for ColumnDecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failure_count == 1 {
            write!(
                f,
                "Illegally formatted {} value in column {}: {}",
                self.logical_type, self.column, self.example
            )
        } else {
            write!(
                f,
                "{} illegally formatted {} values in column {}; first example is \"{}\"",
                self.failure_count, self.logical_type, self.column, self.example
            )
        }
    }
}

pub struct DecodedColumn {
    pub column: Column,
    pub warning: Option<ColumnDecodeWarning>,
}

/// Decodes one column of a table according to its schema and the table options.
pub struct ColumnDecoder<'a> {
    schema: &'a ColumnSchema,
    strip: bool,
    merge_masks: bool,
    callback: Option<&'a FieldCallback>,
    raw_replacements: Vec<(&'a str, &'a str)>,
    typed_replacements: Vec<(&'a Value, Value)>,
    time_converter: Option<&'a dyn TimeConverter>,
    invalid_values: Vec<Value>,
}

struct DecodedItem<T> {
    values: Vec<T>,
    mask: Vec<bool>,
    failure_count: usize,
    first_failure: Option<(usize, String)>,
}

impl<'a> ColumnDecoder<'a> {
    pub fn new(schema: &'a ColumnSchema, options: &'a TableOptions) -> Result<ColumnDecoder<'a>> {
        let name = schema.name();
        let time_converter = if schema.logical_type() == LogicalType::Time
            && options.converts_time(name)
        {
            let converter = options.time_converter.as_deref().ok_or_else(|| {
                Error::invalid_arg(
                    "time_converter",
                    format!("column '{name}' is converted to seconds but no converter is set"),
                )
            })?;
            Some(converter)
        } else {
            None
        };
        let kind = schema.logical_type().value_kind(time_converter.is_some());

        let mut raw_replacements = Vec::new();
        let mut typed_replacements = Vec::new();
        if let Some(replacements) = options.replacements.get(name) {
            raw_replacements.extend(replacements.raw_pairs());
            if kind != ValueKind::String {
                for (before, after) in replacements.typed_pairs() {
                    let after = after.coerce(kind).ok_or_else(|| {
                        Error::invalid_arg(
                            "replacements",
                            format!("{after} cannot replace values of {kind} column '{name}'"),
                        )
                    })?;
                    typed_replacements.push((before, after));
                }
            }
        }

        let mut invalid_values = schema.invalid_values().to_vec();
        if let Some(converter) = time_converter {
            let converted = schema
                .invalid_values()
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|text| converter.seconds_from_iso(text))
                .map(Value::Float)
                .collect::<Vec<_>>();
            invalid_values.extend(converted);
        }

        Ok(ColumnDecoder {
            schema,
            strip: options.strips(name),
            merge_masks: options.merge_masks,
            callback: options.callbacks.get(name),
            raw_replacements,
            typed_replacements,
            time_converter,
            invalid_values,
        })
    }

    /// Storage kind of the decoded values.
    pub fn value_kind(&self) -> ValueKind {
        self.schema
            .logical_type()
            .value_kind(self.time_converter.is_some())
    }

    pub fn decode(&self, slicer: &RecordSlicer) -> Result<DecodedColumn> {
        match (self.value_kind(), self.time_converter) {
            (ValueKind::Integer, _) => {
                let base = self.schema.numeric_base();
                self.decode_as(slicer, |text| parse_integer(text, base))
            }
            (ValueKind::Float, Some(converter)) => {
                self.decode_as(slicer, |text| converter.seconds_from_iso(text.trim()))
            }
            (ValueKind::Float, None) => self.decode_as(slicer, parse_float),
            (ValueKind::Boolean, _) => self.decode_as(slicer, parse_boolean),
            (ValueKind::String, _) => {
                let strip = self.strip;
                self.decode_as(slicer, |text| {
                    Some(if strip { text.trim() } else { text }.to_string())
                })
            }
        }
    }

    fn decode_as<T, F>(&self, slicer: &RecordSlicer, parse: F) -> Result<DecodedColumn>
    where
        T: Scalar,
        F: Fn(&str) -> Option<T>,
    {
        let item_count = slicer.item_count(self.schema);
        let rows = slicer.row_count();
        let items = (0..item_count)
            .map(|item| self.decode_item(slicer, item, &parse))
            .collect::<Result<Vec<_>>>()?;

        let warning = self.warning(&items);
        if let Some(warning) = &warning {
            log::warn!("{warning}");
        }

        let mut values = Vec::with_capacity(item_count);
        let mut masks = Vec::with_capacity(item_count);
        for item in items {
            values.push(item.values);
            masks.push(item.mask);
        }
        let mask = if item_count == 1 || self.merge_masks {
            ColumnMask::Merged((0..rows).map(|row| masks.iter().any(|m| m[row])).collect())
        } else {
            ColumnMask::PerItem {
                item_count,
                bits: interleave(masks, rows),
            }
        };
        let values = T::into_values(interleave(values, rows));

        let column = Column::new(
            self.schema.name().to_string(),
            self.schema.logical_type(),
            item_count,
            values,
            mask,
        );
        Ok(DecodedColumn { column, warning })
    }

    fn decode_item<T, F>(&self, slicer: &RecordSlicer, item: usize, parse: &F) -> Result<DecodedItem<T>>
    where
        T: Scalar,
        F: Fn(&str) -> Option<T>,
    {
        let texts = slicer
            .slice(self.schema, item)?
            .into_iter()
            .map(|field| self.prepare(field))
            .collect::<Vec<_>>();

        let mut item = match texts.iter().map(|text| parse(text)).collect::<Option<Vec<T>>>() {
            Some(values) => DecodedItem {
                mask: vec![false; values.len()],
                values,
                failure_count: 0,
                first_failure: None,
            },
            None => {
                log::debug!(
                    "column '{}': bulk conversion failed, converting row by row",
                    self.schema.name()
                );
                convert_rows(&texts, parse)
            }
        };

        if !self.typed_replacements.is_empty() {
            let pairs = self
                .typed_replacements
                .iter()
                .filter_map(|(before, after)| Some((*before, T::from_value(after)?)))
                .collect::<Vec<_>>();
            for (value, &failed) in item.values.iter_mut().zip(&item.mask) {
                if failed {
                    continue;
                }
                if let Some((_, after)) = pairs.iter().find(|(before, _)| value.eq_value(before)) {
                    *value = after.clone();
                }
            }
        }

        for (value, masked) in item.values.iter().zip(item.mask.iter_mut()) {
            *masked = *masked || self.is_invalid(value);
        }
        Ok(item)
    }

    /// Applies the field callback and the text replacements to one raw field.
    fn prepare<'f>(&self, field: &'f [u8]) -> Cow<'f, str> {
        let mut text = latin1(field);
        if let Some(callback) = self.callback {
            text = Cow::Owned(callback(&text));
        }
        for &(before, after) in &self.raw_replacements {
            if text == before || text.trim() == before {
                text = Cow::Owned(after.to_string());
            }
        }
        text
    }

    fn is_invalid<T: Scalar>(&self, value: &T) -> bool {
        self.invalid_values.iter().any(|invalid| value.eq_value(invalid))
            || value
                .as_f64()
                .is_some_and(|v| self.schema.is_out_of_range(v))
    }

    fn warning<T>(&self, items: &[DecodedItem<T>]) -> Option<ColumnDecodeWarning> {
        let failure_count = items.iter().map(|item| item.failure_count).sum::<usize>();
        if failure_count == 0 {
            return None;
        }
        let example = items
            .iter()
            .filter_map(|item| item.first_failure.as_ref())
            .min_by_key(|(row, _)| *row)
            .map(|(_, text)| text.clone())
            .unwrap_or_default();
        Some(ColumnDecodeWarning {
            column: self.schema.name().to_string(),
            logical_type: self.schema.logical_type(),
            failure_count,
            example,
        })
    }
}

fn convert_rows<T, F>(texts: &[Cow<'_, str>], parse: &F) -> DecodedItem<T>
where
    T: Scalar,
    F: Fn(&str) -> Option<T>,
{
    let mut item = DecodedItem {
        values: Vec::with_capacity(texts.len()),
        mask: Vec::with_capacity(texts.len()),
        failure_count: 0,
        first_failure: None,
    };
    for (row, text) in texts.iter().enumerate() {
        match parse(text) {
            Some(value) => {
                item.values.push(value);
                item.mask.push(false);
            }
            None => {
                item.values.push(T::placeholder());
                item.mask.push(true);
                item.failure_count += 1;
                item.first_failure
                    .get_or_insert_with(|| (row, text.trim().to_string()));
            }
        }
    }
    item
}

/// Interleaves per-item vectors into one row-major vector.
fn interleave<T>(items: Vec<Vec<T>>, rows: usize) -> Vec<T> {
    if items.len() == 1 {
        return items.into_iter().next().unwrap_or_default();
    }
    let mut result = Vec::with_capacity(items.len() * rows);
    let mut iters = items.into_iter().map(Vec::into_iter).collect::<Vec<_>>();
    for _ in 0..rows {
        for iter in &mut iters {
            result.extend(iter.next());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use pdstable_common::error::ErrorKind;
    use pdstable_format::{
        ColumnSchema, ColumnSchemaBuilder, LogicalType, RecordLayout, ValidRange, Value,
    };

    use super::{ColumnDecoder, DecodedColumn};
    use crate::{
        column::{ColumnMask, ColumnValues},
        options::{Replacements, TableOptions},
        records::RawRecords,
        slicer::RecordSlicer,
    };

    fn decode(lines: &[&str], column: &ColumnSchema, options: &TableOptions) -> DecodedColumn {
        let text = lines.iter().map(|l| format!("{l}\r\n")).collect::<String>();
        let records = RawRecords::split_lines(text.into_bytes());
        let row_byte_length = lines[0].len() + 2;
        let slicer = RecordSlicer::new(&records, RecordLayout::Fixed { row_byte_length });
        ColumnDecoder::new(column, options)
            .unwrap()
            .decode(&slicer)
            .unwrap()
    }

    #[test]
    fn test_integer_fallback() {
        let column = ColumnSchemaBuilder::new("N", LogicalType::Integer)
            .with_geometry(1, 4)
            .with_invalid_values(["-999"])
            .finish();
        let decoded = decode(&["   3", " abc", "  12", "-999"], &column, &TableOptions::new());
        assert_eq!(
            decoded.column.values(),
            &ColumnValues::Integer(vec![3, 0, 12, -999])
        );
        assert_eq!(
            decoded.column.mask(),
            &ColumnMask::Merged(vec![false, true, false, true])
        );
        let warning = decoded.warning.unwrap();
        assert_eq!(warning.failure_count, 1);
        assert_eq!(
            warning.to_string(),
            "Illegally formatted int value in column N: abc"
        );
    }

    #[test]
    fn test_bulk_path_has_no_warning() {
        let column = ColumnSchemaBuilder::new("X", LogicalType::Float)
            .with_geometry(1, 5)
            .with_valid_range(ValidRange::new(0.0, 10.0))
            .finish();
        let decoded = decode(&["  1.5", " 11.0", "  1E1"], &column, &TableOptions::new());
        assert!(decoded.warning.is_none());
        assert_eq!(decoded.column.mask().merged(), [false, true, false]);
    }

    #[test]
    fn test_multi_item_masks() {
        let column = ColumnSchemaBuilder::new("V", LogicalType::Integer)
            .with_geometry(1, 6)
            .with_items(3, 2, 2)
            .with_invalid_values([0])
            .finish();
        let lines = [" 1 0 x", " 4 5 6"];

        let decoded = decode(&lines, &column, &TableOptions::new());
        assert_eq!(
            decoded.column.values(),
            &ColumnValues::Integer(vec![1, 0, 0, 4, 5, 6])
        );
        assert_eq!(
            decoded.column.mask(),
            &ColumnMask::PerItem {
                item_count: 3,
                bits: vec![false, true, true, false, false, false],
            }
        );
        assert_eq!(decoded.warning.unwrap().example, "x");

        let merged = decode(&lines, &column, &TableOptions::new().with_merge_masks(true));
        assert_eq!(merged.column.mask(), &ColumnMask::Merged(vec![true, false]));
    }

    #[test]
    fn test_multiple_failures_message() {
        let column = ColumnSchemaBuilder::new("B", LogicalType::Boolean)
            .with_geometry(1, 3)
            .finish();
        let decoded = decode(&["  T", "bad", "yes", "???"], &column, &TableOptions::new());
        assert_eq!(
            decoded.column.values(),
            &ColumnValues::Boolean(vec![true, false, true, false])
        );
        assert_eq!(
            decoded.warning.unwrap().to_string(),
            "2 illegally formatted boolean values in column B; first example is \"bad\""
        );
    }

    #[test]
    fn test_callbacks_and_replacements() {
        let column = ColumnSchemaBuilder::new("N", LogicalType::Integer)
            .with_geometry(1, 4)
            .finish();
        let options = TableOptions::new()
            .with_callback("N", |text| text.replace('O', "0"))
            .with_replacements(
                "N",
                Replacements::new().with("N/A", "-1").with(-1, 99),
            );
        let decoded = decode(&["  1O", " N/A", "  -1"], &column, &options);
        assert_eq!(decoded.column.values(), &ColumnValues::Integer(vec![10, 99, 99]));
        assert!(decoded.warning.is_none());
    }

    #[test]
    fn test_strings_and_nostrip() {
        let column = ColumnSchemaBuilder::new("S", LogicalType::String)
            .with_geometry(1, 5)
            .with_invalid_values(["UNK"])
            .finish();
        let decoded = decode(&[" abc ", "UNK  "], &column, &TableOptions::new());
        assert_eq!(
            decoded.column.values(),
            &ColumnValues::String(vec!["abc".into(), "UNK".into()])
        );
        assert_eq!(decoded.column.mask().merged(), [false, true]);

        let decoded = decode(&[" abc ", "UNK  "], &column, &TableOptions::new().with_nostrip(["S"]));
        assert_eq!(decoded.column.values().as_strings().unwrap()[0], " abc ");
    }

    #[test]
    fn test_time_conversion() {
        let column = ColumnSchemaBuilder::new("T", LogicalType::Time)
            .with_geometry(1, 5)
            .with_invalid_values(["T+999"])
            .finish();
        let converter = |text: &str| text.strip_prefix("T+").and_then(|s| s.parse::<f64>().ok());
        let options = TableOptions::new()
            .with_times(["T"])
            .with_time_converter(converter);
        let decoded = decode(&["T+1.5", "T+999", "never"], &column, &options);
        let values = decoded.column.values().as_floats().unwrap();
        assert_eq!(values[..2], [1.5, 999.0]);
        assert!(values[2].is_nan());
        assert_eq!(decoded.column.mask().merged(), [false, true, true]);
        assert_eq!(decoded.warning.unwrap().logical_type, LogicalType::Time);

        let unconverted = decode(&["T+1.5"], &column, &TableOptions::new());
        assert_eq!(unconverted.column.values().get(0), Some(Value::from("T+1.5")));
    }

    #[test]
    fn test_construction_errors() {
        let time = ColumnSchemaBuilder::new("T", LogicalType::Time)
            .with_geometry(1, 5)
            .finish();
        let options = TableOptions::new().with_times(["T"]);
        let err = ColumnDecoder::new(&time, &options).err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));

        let n = ColumnSchemaBuilder::new("N", LogicalType::Integer)
            .with_geometry(1, 5)
            .finish();
        let options = TableOptions::new().with_replacements("N", Replacements::new().with(1, "one"));
        assert!(ColumnDecoder::new(&n, &options).is_err());
    }
}
