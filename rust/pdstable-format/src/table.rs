use std::path::{Path, PathBuf};

use ahash::AHashMap;
use pdstable_common::{Result, error::Error, verify_data};

use crate::{column::ColumnSchema, column::ColumnSchemaBuilder, validity::ValidityOverrides};

/// Number of trailing line-terminator bytes (`\r\n`) in every fixed-length record.
pub const RECORD_TERMINATOR_LEN: usize = 2;

/// Physical layout of the records of a table file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// Every record occupies `row_byte_length` bytes, line terminator included.
    Fixed { row_byte_length: usize },
    /// Records are lines of fields separated by `delimiter`.
    Delimited {
        delimiter: u8,
        max_row_byte_length: Option<usize>,
    },
}

impl RecordLayout {
    pub fn is_fixed_length(&self) -> bool {
        matches!(self, RecordLayout::Fixed { .. })
    }

    pub fn fixed_row_byte_length(&self) -> Option<usize> {
        match self {
            RecordLayout::Fixed { row_byte_length } => Some(*row_byte_length),
            RecordLayout::Delimited { .. } => None,
        }
    }

    pub fn field_delimiter(&self) -> Option<u8> {
        match self {
            RecordLayout::Fixed { .. } => None,
            RecordLayout::Delimited { delimiter, .. } => Some(*delimiter),
        }
    }
}

/// Resolved, dialect-independent description of a table: its ordered columns, the
/// record geometry and the path of the data file.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    columns: Vec<ColumnSchema>,
    column_lookup: AHashMap<String, usize>,
    row_count: usize,
    layout: RecordLayout,
    table_file_path: PathBuf,
}

impl TableSchema {
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.column_lookup.get(name).map(|&i| &self.columns[i])
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    pub fn is_fixed_length(&self) -> bool {
        self.layout.is_fixed_length()
    }

    pub fn table_file_path(&self) -> &Path {
        &self.table_file_path
    }

    /// Returns a copy of this schema with the caller's validity rules applied to every
    /// column.
    pub fn with_validity_overrides(&self, overrides: &ValidityOverrides) -> TableSchema {
        let mut schema = self.clone();
        for column in &mut schema.columns {
            column.apply_overrides(overrides);
        }
        schema
    }

    pub fn with_table_file_path(mut self, path: impl Into<PathBuf>) -> TableSchema {
        self.table_file_path = path.into();
        self
    }
}

/// Builder for a [`TableSchema`]. `build` validates names and geometry.
#[derive(Debug, Clone)]
pub struct TableSchemaBuilder {
    layout: RecordLayout,
    row_count: usize,
    table_file_path: PathBuf,
    columns: Vec<ColumnSchemaBuilder>,
}

impl TableSchemaBuilder {
    pub fn new(layout: RecordLayout, row_count: usize) -> TableSchemaBuilder {
        TableSchemaBuilder {
            layout,
            row_count,
            table_file_path: PathBuf::new(),
            columns: Vec::new(),
        }
    }

    pub fn fixed(row_byte_length: usize, row_count: usize) -> TableSchemaBuilder {
        Self::new(RecordLayout::Fixed { row_byte_length }, row_count)
    }

    pub fn delimited(delimiter: u8, row_count: usize) -> TableSchemaBuilder {
        Self::new(
            RecordLayout::Delimited {
                delimiter,
                max_row_byte_length: None,
            },
            row_count,
        )
    }

    pub fn with_table_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.table_file_path = path.into();
        self
    }

    pub fn with_column(mut self, column: ColumnSchemaBuilder) -> Self {
        self.add_column(column);
        self
    }

    pub fn add_column(&mut self, column: ColumnSchemaBuilder) {
        self.columns.push(column);
    }

    pub fn build(self) -> Result<TableSchema> {
        if let RecordLayout::Fixed { row_byte_length } = self.layout {
            verify_data!(row_byte_length, row_byte_length > RECORD_TERMINATOR_LEN);
        }

        let mut columns = Vec::with_capacity(self.columns.len());
        let mut column_lookup = AHashMap::with_capacity(self.columns.len());
        for (i, builder) in self.columns.into_iter().enumerate() {
            let mut column = builder.finish();
            column.set_position(i);
            if column_lookup.insert(column.name().to_string(), i).is_some() {
                return Err(Error::schema(format!(
                    "duplicated column name: {}",
                    column.name()
                )));
            }
            validate_geometry(&column, self.layout)?;
            columns.push(column);
        }

        Ok(TableSchema {
            columns,
            column_lookup,
            row_count: self.row_count,
            layout: self.layout,
            table_file_path: self.table_file_path,
        })
    }
}

fn validate_geometry(column: &ColumnSchema, layout: RecordLayout) -> Result<()> {
    let name = column.name();
    if name.is_empty() {
        return Err(Error::schema("column with an empty name"));
    }
    if column.item_count() == 0 {
        return Err(Error::schema(format!("column '{name}' declares zero items")));
    }

    let RecordLayout::Fixed { row_byte_length } = layout else {
        return Ok(());
    };

    let (Some(start_byte), Some(byte_length)) = (column.start_byte(), column.byte_length()) else {
        return Err(Error::schema(format!(
            "column '{name}' has no byte geometry in a fixed-length table"
        )));
    };
    if start_byte == 0 || byte_length == 0 {
        return Err(Error::schema(format!(
            "column '{name}' has invalid geometry: start byte {start_byte}, {byte_length} bytes"
        )));
    }

    let item_bytes = column.item_byte_length().unwrap_or(byte_length);
    let item_offset = column.item_offset().unwrap_or(byte_length);
    let items_end = (column.item_count() - 1) * item_offset + item_bytes;
    if item_bytes == 0 || items_end > byte_length {
        return Err(Error::schema(format!(
            "items of column '{name}' do not fit into its {byte_length} bytes"
        )));
    }

    let column_end = start_byte - 1 + byte_length;
    if column_end > row_byte_length - RECORD_TERMINATOR_LEN {
        return Err(Error::schema(format!(
            "column '{name}' ends at byte {column_end}, beyond the record length \
             {row_byte_length} minus the line terminator"
        )));
    }
    Ok(())
}
