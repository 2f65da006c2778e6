//! Synthetic index tables.
//!
//! The generated tables mimic the layout of PDS3 volume indexes: a quoted volume ID, a
//! quoted file specification, a start time and an integer column with occasional
//! invalid values.

use tempfile::TempDir;

use pdstable_format::TableDescriptor;

use crate::fixtures::FixedWidthTable;

/// Invalid constant of the `N` column.
pub const MISSING_N: i64 = -999;

/// Parameters of a generated index table.
#[derive(Debug, Clone)]
pub struct IndexTableSpec {
    pub rows: usize,
    pub volumes: usize,
    /// Every `missing_every`-th row carries [`MISSING_N`]; zero disables it.
    pub missing_every: usize,
    /// Directory prefix of the file specifications, e.g. `DATA/`.
    pub directory: String,
}

impl Default for IndexTableSpec {
    fn default() -> Self {
        IndexTableSpec {
            rows: 100,
            volumes: 2,
            missing_every: 7,
            directory: "DATA/".to_string(),
        }
    }
}

impl IndexTableSpec {
    pub fn volume_id(&self, row: usize) -> String {
        format!("VOL_{:04}", 1 + row * self.volumes.max(1) / self.rows.max(1))
    }

    pub fn file_specification(&self, row: usize) -> String {
        format!("{}C{:07}_{}.LBL", self.directory, 1_000_000 + row / 2, row % 2)
    }

    pub fn start_time(&self, row: usize) -> String {
        let seconds = row * 37;
        format!(
            "2001-01-01T{:02}:{:02}:{:02}",
            (seconds / 3600) % 24,
            (seconds / 60) % 60,
            seconds % 60
        )
    }

    pub fn n(&self, row: usize) -> i64 {
        if self.missing_every > 0 && row % self.missing_every == self.missing_every - 1 {
            MISSING_N
        } else {
            (row as i64) * 3
        }
    }

    pub fn table(&self) -> FixedWidthTable {
        let spec_width = self.directory.len() + 14;
        let mut table = FixedWidthTable::new()
            .string_column("VOLUME_ID", 8)
            .string_column("FILE_SPECIFICATION_NAME", spec_width)
            .string_column("START_TIME", 19)
            .column("N", "ASCII_INTEGER", 6)
            .invalid(&["-999"]);
        for row in 0..self.rows {
            let volume = self.volume_id(row);
            let filespec = self.file_specification(row);
            let start = self.start_time(row);
            let n = self.n(row).to_string();
            table = table.row(&[&volume, &filespec, &start, &n]);
        }
        table
    }
}

/// Writes a generated index table as `INDEX.TAB` in a temporary directory.
pub fn generate_index_table(spec: &IndexTableSpec) -> anyhow::Result<(TempDir, TableDescriptor)> {
    spec.table().write_temp("INDEX.TAB")
}
