//! Table file fixtures.
//!
//! A fixture describes the columns and rows of a table, renders the table file and
//! produces the [`TableDescriptor`] a label parser would have produced for it.

use std::path::{Path, PathBuf};

use pdstable_format::{ColumnDescriptor, TableDescriptor, ValidRange};
use tempfile::TempDir;

#[derive(Debug, Clone)]
struct FixtureColumn {
    name: String,
    type_tag: String,
    item_width: usize,
    items: usize,
    quoted: bool,
    invalid_constants: Vec<String>,
    valid_range: Option<ValidRange>,
}

impl FixtureColumn {
    /// Bytes occupied by the column in a record, quotes included.
    fn width(&self) -> usize {
        let quotes = if self.quoted { 2 } else { 0 };
        self.items * (self.item_width + quotes) + (self.items - 1)
    }
}

/// A fixed-width table with comma-separated fields, in the style of PDS3 index tables.
/// String columns are enclosed in double quotes.
#[derive(Debug, Clone, Default)]
pub struct FixedWidthTable {
    columns: Vec<FixtureColumn>,
    rows: Vec<Vec<String>>,
}

impl FixedWidthTable {
    pub fn new() -> FixedWidthTable {
        Default::default()
    }

    /// Adds a right-aligned column such as `ASCII_INTEGER` or `ASCII_REAL`.
    pub fn column(self, name: &str, type_tag: &str, width: usize) -> Self {
        self.push_column(name, type_tag, width, 1, false)
    }

    /// Adds a quoted, left-aligned `CHARACTER` column.
    pub fn string_column(self, name: &str, width: usize) -> Self {
        self.push_column(name, "CHARACTER", width, 1, true)
    }

    /// Adds a multi-item column. Items are right-aligned and separated by commas.
    pub fn vector_column(self, name: &str, type_tag: &str, items: usize, item_width: usize) -> Self {
        self.push_column(name, type_tag, item_width, items, false)
    }

    /// Declares invalid constants for the most recently added column.
    pub fn invalid(mut self, constants: &[&str]) -> Self {
        if let Some(column) = self.columns.last_mut() {
            column
                .invalid_constants
                .extend(constants.iter().map(|c| c.to_string()));
        }
        self
    }

    /// Declares the valid range of the most recently added column.
    pub fn valid_range(mut self, min: f64, max: f64) -> Self {
        if let Some(column) = self.columns.last_mut() {
            column.valid_range = Some(ValidRange::new(min, max));
        }
        self
    }

    /// Appends a row. Multi-item cells list their items separated by `|`.
    pub fn row(mut self, cells: &[&str]) -> Self {
        assert_eq!(cells.len(), self.columns.len(), "cell count");
        self.rows.push(cells.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Record length, line terminator included.
    pub fn row_bytes(&self) -> usize {
        let fields = self.columns.iter().map(FixtureColumn::width).sum::<usize>();
        fields + self.columns.len().saturating_sub(1) + 2
    }

    pub fn render(&self) -> Vec<u8> {
        let mut out = String::with_capacity(self.row_bytes() * self.rows.len());
        for row in &self.rows {
            let fields = self
                .columns
                .iter()
                .zip(row)
                .map(|(column, cell)| render_cell(column, cell))
                .collect::<Vec<_>>();
            out.push_str(&fields.join(","));
            out.push_str("\r\n");
        }
        out.into_bytes()
    }

    pub fn descriptor(&self, label_path: &Path, table_file: &str) -> TableDescriptor {
        let mut columns = Vec::with_capacity(self.columns.len());
        let mut start_byte = 1;
        for column in &self.columns {
            let quote = usize::from(column.quoted);
            let multi = column.items > 1;
            columns.push(ColumnDescriptor {
                name: column.name.clone(),
                data_type: column.type_tag.clone(),
                start_byte: Some(start_byte + quote),
                bytes: Some(column.width() - 2 * quote),
                items: multi.then_some(column.items),
                item_bytes: multi.then_some(column.item_width),
                item_offset: multi.then_some(column.item_width + 1),
                field_number: None,
                invalid_constants: column.invalid_constants.clone(),
                valid_range: column.valid_range,
            });
            start_byte += column.width() + 1;
        }
        TableDescriptor {
            label_path: Some(label_path.to_path_buf()),
            record_type: "FIXED_LENGTH".to_string(),
            interchange_format: "ASCII".to_string(),
            rows: self.rows.len(),
            row_bytes: Some(self.row_bytes()),
            field_delimiter: None,
            table_files: vec![table_file.to_string()],
            columns,
        }
    }

    /// Writes the table as `dir/name` and returns the descriptor of its label.
    pub fn write(&self, dir: &Path, name: &str) -> anyhow::Result<TableDescriptor> {
        write_table(dir, name, &self.render())?;
        Ok(self.descriptor(&label_path(dir, name), name))
    }

    /// Writes the table into a fresh temporary directory.
    pub fn write_temp(&self, name: &str) -> anyhow::Result<(TempDir, TableDescriptor)> {
        let dir = tempfile::tempdir()?;
        let descriptor = self.write(dir.path(), name)?;
        Ok((dir, descriptor))
    }

    fn push_column(
        mut self,
        name: &str,
        type_tag: &str,
        item_width: usize,
        items: usize,
        quoted: bool,
    ) -> Self {
        assert!(items > 0 && item_width > 0);
        self.columns.push(FixtureColumn {
            name: name.to_string(),
            type_tag: type_tag.to_string(),
            item_width,
            items,
            quoted,
            invalid_constants: Vec::new(),
            valid_range: None,
        });
        self
    }
}

fn render_cell(column: &FixtureColumn, cell: &str) -> String {
    let width = column.item_width;
    let items = cell.split('|').collect::<Vec<_>>();
    assert_eq!(items.len(), column.items, "items of column {}", column.name);
    items
        .iter()
        .map(|item| {
            assert!(item.len() <= width, "'{item}' is wider than {width} bytes");
            if column.quoted {
                format!("\"{item:<width$}\"")
            } else {
                format!("{item:>width$}")
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// A delimited (CSV-like) table. Every column is one field.
#[derive(Debug, Clone, Default)]
pub struct DelimitedTable {
    delimiter: char,
    columns: Vec<(String, String)>,
    rows: Vec<String>,
}

impl DelimitedTable {
    pub fn new(delimiter: char) -> DelimitedTable {
        DelimitedTable {
            delimiter,
            ..Default::default()
        }
    }

    pub fn column(mut self, name: &str, type_tag: &str) -> Self {
        self.columns.push((name.to_string(), type_tag.to_string()));
        self
    }

    /// Appends a raw record (without line terminator).
    pub fn record(mut self, record: &str) -> Self {
        self.rows.push(record.to_string());
        self
    }

    pub fn render(&self) -> Vec<u8> {
        self.rows
            .iter()
            .map(|row| format!("{row}\r\n"))
            .collect::<String>()
            .into_bytes()
    }

    pub fn descriptor(&self, label_path: &Path, table_file: &str) -> TableDescriptor {
        let columns = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, (name, type_tag))| ColumnDescriptor {
                name: name.clone(),
                data_type: type_tag.clone(),
                start_byte: None,
                bytes: None,
                items: None,
                item_bytes: None,
                item_offset: None,
                field_number: Some(i + 1),
                invalid_constants: Vec::new(),
                valid_range: None,
            })
            .collect();
        TableDescriptor {
            label_path: Some(label_path.to_path_buf()),
            record_type: "DELIMITED".to_string(),
            interchange_format: "ASCII".to_string(),
            rows: self.rows.len(),
            row_bytes: None,
            field_delimiter: Some(self.delimiter.to_string()),
            table_files: vec![table_file.to_string()],
            columns,
        }
    }

    pub fn write(&self, dir: &Path, name: &str) -> anyhow::Result<TableDescriptor> {
        write_table(dir, name, &self.render())?;
        Ok(self.descriptor(&label_path(dir, name), name))
    }
}

/// Writes `data` as `dir/name`.
pub fn write_table(dir: &Path, name: &str, data: &[u8]) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, data)?;
    Ok(path)
}

fn label_path(dir: &Path, table_file: &str) -> PathBuf {
    dir.join(Path::new(table_file).with_extension("LBL"))
}

#[cfg(test)]
mod tests {
    use super::FixedWidthTable;

    #[test]
    fn test_fixed_width_layout() {
        let table = FixedWidthTable::new()
            .string_column("VOLUME_ID", 4)
            .column("N", "ASCII_INTEGER", 4)
            .vector_column("V", "ASCII_REAL", 2, 3)
            .row(&["VG1", "12", "1.5|2.5"]);
        assert_eq!(table.row_bytes(), 22);
        assert_eq!(table.render(), b"\"VG1 \",  12,1.5,2.5\r\n");

        let descriptor = table.descriptor(std::path::Path::new("/t/INDEX.LBL"), "INDEX.TAB");
        let starts = descriptor
            .columns
            .iter()
            .map(|c| (c.start_byte, c.bytes))
            .collect::<Vec<_>>();
        assert_eq!(starts, [(Some(2), Some(4)), (Some(8), Some(4)), (Some(13), Some(7))]);
        assert_eq!(descriptor.columns[2].item_offset, Some(4));
    }
}
