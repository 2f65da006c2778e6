//! Reading the physical records of a table file.

use std::ops::Range;

use pdstable_common::{Result, error::Error, error::ErrorKind, verify_arg};
use pdstable_format::TableSchema;
use pdstable_io::ReadAt;

/// The raw records of a table file, kept in a single buffer.
///
/// Every record keeps its line terminator.
#[derive(Debug, Clone, Default)]
pub struct RawRecords {
    data: Vec<u8>,
    bounds: Vec<Range<usize>>,
}

impl RawRecords {
    /// Splits `data` into lines. Each line ends after a `\n`; a trailing fragment
    /// without a terminator is a record of its own.
    pub fn split_lines(data: Vec<u8>) -> RawRecords {
        let mut bounds = Vec::new();
        let mut start = 0;
        for (i, &b) in data.iter().enumerate() {
            if b == b'\n' {
                bounds.push(start..i + 1);
                start = i + 1;
            }
        }
        if start < data.len() {
            bounds.push(start..data.len());
        }
        RawRecords { data, bounds }
    }

    pub fn from_lines(lines: Vec<Vec<u8>>) -> RawRecords {
        let mut data = Vec::with_capacity(lines.iter().map(Vec::len).sum());
        let mut bounds = Vec::with_capacity(lines.len());
        for line in lines {
            let start = data.len();
            data.extend_from_slice(&line);
            bounds.push(start..data.len());
        }
        RawRecords { data, bounds }
    }

    pub fn into_lines(self) -> Vec<Vec<u8>> {
        self.bounds
            .into_iter()
            .map(|range| self.data[range].to_vec())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn record(&self, index: usize) -> &[u8] {
        &self.data[self.bounds[index].clone()]
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[u8]> {
        self.bounds.iter().map(|range| &self.data[range.clone()])
    }

    pub fn truncate(&mut self, len: usize) {
        self.bounds.truncate(len);
    }
}

/// Reads the records of the table described by `schema`.
///
/// Without a row range the whole file is read and the record count must match the
/// schema row count. With a row range only the corresponding bytes of a fixed-length
/// table are read, and the number of complete records must match the length of the
/// range.
pub fn read_records(
    reader: &dyn ReadAt,
    schema: &TableSchema,
    row_range: Option<Range<usize>>,
) -> Result<RawRecords> {
    let context = schema.table_file_path().display().to_string();
    let Some(row_range) = row_range else {
        let data = reader.read_all().map_err(|e| Error::io(&context, e))?;
        log::debug!("read {} bytes from '{context}'", data.len());
        let records = RawRecords::split_lines(data);
        check_count(schema.row_count(), records.len())?;
        return Ok(records);
    };

    let row_byte_length = schema
        .layout()
        .fixed_row_byte_length()
        .ok_or(ErrorKind::UnsupportedRowRange)?;
    verify_arg!(row_range, row_range.start <= row_range.end);

    let expected = row_range.len();
    let byte_range = (row_range.start * row_byte_length) as u64..(row_range.end * row_byte_length) as u64;
    log::debug!(
        "reading rows {}..{} (bytes {}..{}) from '{context}'",
        row_range.start,
        row_range.end,
        byte_range.start,
        byte_range.end
    );
    let data = reader.read_at(byte_range).map_err(|e| Error::io(&context, e))?;
    let mut records = RawRecords::split_lines(data);
    records.truncate(expected);
    check_count(expected, records.len())?;
    Ok(records)
}

fn check_count(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(ErrorKind::RowCountMismatch { expected, actual }.into());
    }
    Ok(())
}
