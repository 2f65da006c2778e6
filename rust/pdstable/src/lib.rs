//! Decoding and indexing of PDS ASCII tables.
//!
//! A [`Table`] is built from a resolved [`pdstable_format::TableSchema`] in one decode
//! pass: records are read from the table file, sliced into fields, converted to typed
//! column values and masked according to the column validity rules. After
//! construction a table is immutable apart from its lazily built lookup caches (row
//! dictionaries and the filename-key index).

pub mod arrow;
pub mod column;
pub mod decoder;
pub mod options;
pub mod query;
pub mod records;
pub mod row_dict;
pub mod row_index;
pub mod slicer;
pub mod table;
pub mod time;

pub use column::{CellMask, CellValue, Column, ColumnMask, ColumnValues};
pub use decoder::ColumnDecodeWarning;
pub use options::{FieldCallback, RecordsCallback, Replacements, TableOptions};
pub use query::RowQuery;
pub use row_dict::{LowercaseOptions, RowDict, RowField};
pub use row_index::{FilespecQuery, filename_key, normalize_filespec};
pub use table::Table;
pub use time::TimeConverter;

pub use pdstable_common::{Result, error::Error, error::ErrorKind};
pub use pdstable_format as format;
