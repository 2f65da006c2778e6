//! Serializable table descriptors.
//!
//! A label parser (for either label dialect) reduces a label to a [`TableDescriptor`],
//! which is then validated and resolved into a [`TableSchema`]. Descriptors can be
//! exchanged as JSON.

use std::path::PathBuf;

use pdstable_common::{Result, error::Error};
use serde::{Deserialize, Serialize};

use crate::{
    column::ColumnSchemaBuilder,
    logical_type::LogicalType,
    table::{RecordLayout, TableSchema, TableSchemaBuilder},
    table_file::resolve_table_file,
    validity::{ValidRange, ValidityOverrides},
    value::Value,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Path of the label file; table files are resolved relative to its directory.
    #[serde(default)]
    pub label_path: Option<PathBuf>,
    /// `FIXED_LENGTH` or `DELIMITED`.
    pub record_type: String,
    #[serde(default = "default_interchange_format")]
    pub interchange_format: String,
    pub rows: usize,
    /// Record length in bytes, line terminator included. Required for fixed-length
    /// records, an upper bound for delimited ones.
    #[serde(default)]
    pub row_bytes: Option<usize>,
    /// Delimiter of delimited records, either a single character or a name such as
    /// `Comma` or `Horizontal_Tab`.
    #[serde(default)]
    pub field_delimiter: Option<String>,
    /// Table file names the label points to.
    #[serde(default)]
    pub table_files: Vec<String>,
    pub columns: Vec<ColumnDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub start_byte: Option<usize>,
    #[serde(default)]
    pub bytes: Option<usize>,
    #[serde(default)]
    pub items: Option<usize>,
    #[serde(default)]
    pub item_bytes: Option<usize>,
    #[serde(default)]
    pub item_offset: Option<usize>,
    /// One-based field number within a delimited record.
    #[serde(default)]
    pub field_number: Option<usize>,
    /// Literal values of the label's invalid, missing, unknown, not-applicable and null
    /// constants.
    #[serde(default)]
    pub invalid_constants: Vec<String>,
    #[serde(default)]
    pub valid_range: Option<ValidRange>,
}

fn default_interchange_format() -> String {
    "ASCII".to_string()
}

impl TableDescriptor {
    pub fn from_json(json: &str) -> Result<TableDescriptor> {
        serde_json::from_str(json)
            .map_err(|e| Error::schema(format!("malformed table descriptor: {e}")))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::schema(format!("table descriptor serialization: {e}")))
    }

    /// Validates the descriptor and resolves it into a [`TableSchema`].
    ///
    /// # Arguments
    ///
    /// * `overrides` - Caller validity rules, merged with the label constants.
    /// * `table_file` - Explicit choice among several table files described by the label.
    pub fn resolve(
        &self,
        overrides: &ValidityOverrides,
        table_file: Option<&str>,
    ) -> Result<TableSchema> {
        if !self.interchange_format.eq_ignore_ascii_case("ASCII") {
            return Err(Error::schema(format!(
                "table is not in ASCII format: {}",
                self.interchange_format
            )));
        }

        let layout = self.layout()?;
        let path = resolve_table_file(self.label_path.as_deref(), &self.table_files, table_file)?;

        let mut builder = TableSchemaBuilder::new(layout, self.rows).with_table_file_path(path);
        for column in &self.columns {
            builder.add_column(column.to_builder(overrides)?);
        }
        builder.build()
    }

    fn layout(&self) -> Result<RecordLayout> {
        match self.record_type.to_ascii_uppercase().as_str() {
            "FIXED_LENGTH" => {
                let row_byte_length = self.row_bytes.ok_or_else(|| {
                    Error::schema("fixed-length table does not declare its row bytes")
                })?;
                Ok(RecordLayout::Fixed { row_byte_length })
            }
            "DELIMITED" => {
                let delimiter = self.field_delimiter.as_deref().ok_or_else(|| {
                    Error::schema("delimited table does not declare its field delimiter")
                })?;
                Ok(RecordLayout::Delimited {
                    delimiter: parse_delimiter(delimiter)?,
                    max_row_byte_length: self.row_bytes,
                })
            }
            other => Err(Error::schema(format!("unsupported record type: {other}"))),
        }
    }
}

impl ColumnDescriptor {
    fn to_builder(&self, overrides: &ValidityOverrides) -> Result<ColumnSchemaBuilder> {
        let resolved = LogicalType::from_type_tag(&self.data_type, &self.name)?;
        let mut builder = ColumnSchemaBuilder::new(&self.name, resolved.logical_type)
            .with_numeric_base(resolved.numeric_base)
            .with_invalid_values(self.invalid_constants.iter().map(|c| Value::from(c.trim())));

        if let (Some(start_byte), Some(bytes)) = (self.start_byte, self.bytes) {
            builder = builder.with_geometry(start_byte, bytes);
            if let Some(items) = self.items {
                builder = builder.with_items(
                    items,
                    self.item_bytes.unwrap_or(bytes),
                    self.item_offset.unwrap_or(bytes),
                );
            }
        } else if let Some(items) = self.items {
            builder = builder.with_item_count(items);
        }
        if let Some(field_number) = self.field_number {
            if field_number == 0 {
                return Err(Error::schema(format!(
                    "column '{}' has field number 0; field numbers are one-based",
                    self.name
                )));
            }
            builder = builder.with_field_number(field_number - 1);
        }
        if let Some(range) = self.valid_range {
            builder = builder.with_valid_range(range);
        }
        Ok(builder.with_overrides(overrides))
    }
}

/// Parses a field delimiter given either as a single ASCII character or by name.
pub fn parse_delimiter(text: &str) -> Result<u8> {
    let delimiter = match text.to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
        "comma" => b',',
        "horizontal_tab" | "tab" => b'\t',
        "semicolon" => b';',
        "vertical_bar" => b'|',
        _ if text.len() == 1 && text.is_ascii() => text.as_bytes()[0],
        _ => {
            return Err(Error::schema(format!("unsupported field delimiter: {text}")));
        }
    };
    Ok(delimiter)
}
