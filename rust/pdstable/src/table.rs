use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use ahash::AHashMap;
use pdstable_common::{Result, error::Error, error::ErrorKind};
use pdstable_format::{KeyColumnNames, TableSchema};
use pdstable_io::{FileReader, ReadAt};
use rayon::prelude::*;

use crate::{
    column::{Column, ColumnMask, ColumnValues},
    decoder::{ColumnDecodeWarning, ColumnDecoder, DecodedColumn},
    options::TableOptions,
    records::{RawRecords, read_records},
    row_dict::{LowercaseOptions, RowDict, build_row_dicts},
    row_index::{FilenameIndex, KeyColumns},
    slicer::RecordSlicer,
};

/// A decoded PDS ASCII table.
///
/// A table is fully decoded on construction. Only the selected columns are kept.
/// Row dictionaries, the key-column positions and the filename index are built on first
/// use and cached for the lifetime of the table.
pub struct Table {
    schema: Arc<TableSchema>,
    first_row: usize,
    row_count: usize,
    columns: Vec<Column>,
    column_lookup: AHashMap<String, usize>,
    warnings: Vec<ColumnDecodeWarning>,
    filename_keylen: usize,
    key_column_names: KeyColumnNames,
    row_dicts: [OnceLock<Arc<Vec<RowDict>>>; 4],
    key_columns: OnceLock<KeyColumns>,
    filename_index: OnceLock<FilenameIndex>,
}

impl Table {
    /// Reads and decodes the table file named by the schema.
    pub fn open(schema: impl Into<Arc<TableSchema>>, options: &TableOptions) -> Result<Table> {
        let schema = schema.into();
        let path = schema.table_file_path();
        let reader =
            FileReader::open(path).map_err(|e| Error::io(path.display().to_string(), e))?;
        Self::from_reader(schema, &reader, options)
    }

    /// Decodes a table whose records are already in memory.
    pub fn from_bytes(
        schema: impl Into<Arc<TableSchema>>,
        data: impl Into<Arc<[u8]>>,
        options: &TableOptions,
    ) -> Result<Table> {
        let data: Arc<[u8]> = data.into();
        Self::from_reader(schema, &data, options)
    }

    /// Reads and decodes the table records from `reader`.
    pub fn from_reader(
        schema: impl Into<Arc<TableSchema>>,
        reader: &dyn ReadAt,
        options: &TableOptions,
    ) -> Result<Table> {
        let mut schema = schema.into();
        if !options.validity.is_empty() {
            schema = Arc::new(schema.with_validity_overrides(&options.validity));
        }

        let selected = select_columns(&schema, options)?;
        let decoders = selected
            .iter()
            .map(|name| {
                let column = schema
                    .column(name)
                    .ok_or_else(|| Error::unknown_column(name.as_str()))?;
                ColumnDecoder::new(column, options)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut records = read_records(reader, &schema, options.row_range.clone())?;
        let row_count = records.len();
        if let Some(callback) = &options.records_callback {
            records = RawRecords::from_lines(callback(records.into_lines()));
            if records.len() != row_count {
                return Err(ErrorKind::RowCountMismatch {
                    expected: row_count,
                    actual: records.len(),
                }
                .into());
            }
        }

        let slicer = RecordSlicer::new(&records, schema.layout());
        let decoded = decode_columns(&decoders, &slicer, options.max_parallelism)?;
        log::debug!(
            "decoded {} column(s) of {} row(s) from '{}'",
            decoded.len(),
            row_count,
            schema.table_file_path().display()
        );

        let mut columns = Vec::with_capacity(decoded.len());
        let mut warnings = Vec::new();
        for DecodedColumn { column, warning } in decoded {
            columns.push(column);
            warnings.extend(warning);
        }
        let column_lookup = columns
            .iter()
            .enumerate()
            .map(|(i, column)| (column.name().to_string(), i))
            .collect();

        Ok(Table {
            first_row: options.row_range.as_ref().map_or(0, |range| range.start),
            row_count,
            schema,
            columns,
            column_lookup,
            warnings,
            filename_keylen: options.filename_keylen,
            key_column_names: options.key_columns.clone(),
            row_dicts: Default::default(),
            key_columns: OnceLock::new(),
            filename_index: OnceLock::new(),
        })
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Index within the table file of the first decoded row.
    pub fn first_row_offset(&self) -> usize {
        self.first_row
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Names of the decoded columns, in selection order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.column_lookup
            .get(name)
            .map(|&i| &self.columns[i])
            .ok_or_else(|| Error::unknown_column(name))
    }

    pub fn column_values(&self, name: &str) -> Result<&ColumnValues> {
        Ok(self.column(name)?.values())
    }

    pub fn column_mask(&self, name: &str) -> Result<&ColumnMask> {
        Ok(self.column(name)?.mask())
    }

    /// Conversion diagnostics collected while decoding, one per affected column.
    pub fn warnings(&self) -> &[ColumnDecodeWarning] {
        &self.warnings
    }

    /// Dictionaries of all rows, built on first use for each combination of
    /// lower-casing options.
    pub fn row_dicts(&self, lowercase: LowercaseOptions) -> Arc<Vec<RowDict>> {
        self.row_dicts[lowercase.slot()]
            .get_or_init(|| {
                log::trace!("building row dictionaries with {lowercase:?}");
                Arc::new(build_row_dicts(&self.columns, self.row_count, lowercase))
            })
            .clone()
    }

    pub fn row_dict(&self, row: usize, lowercase: LowercaseOptions) -> Result<RowDict> {
        if row >= self.row_count {
            return Err(Error::invalid_arg(
                "row",
                format!("row {row} is out of range for a table of {} rows", self.row_count),
            ));
        }
        Ok(self.row_dicts(lowercase)[row].clone())
    }

    pub(crate) fn key_columns(&self) -> KeyColumns {
        *self
            .key_columns
            .get_or_init(|| KeyColumns::locate(&self.columns, &self.key_column_names))
    }

    pub(crate) fn filename_index(&self) -> Result<&FilenameIndex> {
        let filespec = self
            .key_columns()
            .filespec
            .ok_or_else(|| Error::schema("file specification column not found"))?;
        Ok(self.filename_index.get_or_init(|| {
            FilenameIndex::build(&self.columns[filespec], self.filename_keylen)
        }))
    }
}

fn select_columns(schema: &TableSchema, options: &TableOptions) -> Result<Vec<String>> {
    if options.columns.is_empty() {
        return Ok(schema.column_names().map(str::to_string).collect());
    }
    let mut selected = Vec::with_capacity(options.columns.len());
    for name in &options.columns {
        if schema.column(name).is_none() {
            return Err(Error::unknown_column(name.as_str()));
        }
        if !selected.contains(name) {
            selected.push(name.clone());
        }
    }
    Ok(selected)
}

/// Decodes every column, on the rayon pool unless `max_parallelism` is one.
fn decode_columns(
    decoders: &[ColumnDecoder],
    slicer: &RecordSlicer,
    max_parallelism: Option<usize>,
) -> Result<Vec<DecodedColumn>> {
    let decode = || {
        decoders
            .par_iter()
            .map(|decoder| decoder.decode(slicer))
            .collect::<Result<Vec<_>>>()
    };
    match max_parallelism {
        Some(n) if n <= 1 => decoders.iter().map(|decoder| decoder.decode(slicer)).collect(),
        Some(n) => decode_pool(n)?.install(decode),
        None => decode(),
    }
}

/// Returns the shared decode pool with `threads` threads, starting it on first use.
fn decode_pool(threads: usize) -> Result<Arc<rayon::ThreadPool>> {
    static POOLS: OnceLock<Mutex<AHashMap<usize, Arc<rayon::ThreadPool>>>> = OnceLock::new();
    let mut pools = POOLS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(pool) = pools.get(&threads) {
        return Ok(pool.clone());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("pdstable_decode_{threads}_{i}"))
        .build()
        .map_err(|e| Error::invalid_arg("max_parallelism", e.to_string()))?;
    let pool = Arc::new(pool);
    pools.insert(threads, pool.clone());
    Ok(pool)
}
