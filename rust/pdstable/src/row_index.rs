//! Lookups of index-table rows by filename key and by volume ID and file specification.

use ahash::AHashMap;
use pdstable_common::{Result, error::Error};
use pdstable_format::{KeyColumnNames, Value};

use crate::{
    column::Column,
    query::RowQuery,
    row_dict::{LowercaseOptions, RowDict},
    table::Table,
};

/// Positions of the volume-ID and file-specification columns among the decoded columns.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct KeyColumns {
    pub filespec: Option<usize>,
    pub volume: Option<usize>,
}

impl KeyColumns {
    pub(crate) fn locate(columns: &[Column], names: &KeyColumnNames) -> KeyColumns {
        let column_names = columns.iter().map(|c| c.name());
        KeyColumns {
            filespec: names.locate_file_specification(column_names.clone()),
            volume: names.locate_volume_id(column_names),
        }
    }
}

/// Row indices grouped by the lower-cased filename key of their file specification.
#[derive(Debug, Default)]
pub(crate) struct FilenameIndex {
    rows_by_key: AHashMap<String, Vec<usize>>,
    keys: Vec<String>,
}

impl FilenameIndex {
    pub(crate) fn build(filespecs: &Column, keylen: usize) -> FilenameIndex {
        let mut index = FilenameIndex::default();
        for row in 0..filespecs.row_count() {
            if filespecs.is_masked(row) {
                continue;
            }
            let Some(filespec) = filespecs.value(row, 0) else {
                continue;
            };
            let key = filename_key(&value_text(&filespec), keylen);
            index
                .rows_by_key
                .entry(key.to_lowercase())
                .or_insert_with(|| {
                    index.keys.push(key);
                    Vec::new()
                })
                .push(row);
        }
        log::trace!(
            "filename index of column '{}': {} keys",
            filespecs.name(),
            index.keys.len()
        );
        index
    }
}

/// Parameters of a lookup by volume ID and file specification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilespecQuery {
    pub volume_id: String,
    pub filespec: String,
    /// Maximum number of rows returned; zero or `None` means no limit.
    pub limit: Option<usize>,
    /// Match rows whose file specification contains the given one.
    pub substring: bool,
}

impl FilespecQuery {
    /// A query by file specification alone.
    pub fn new(filespec: impl Into<String>) -> FilespecQuery {
        FilespecQuery {
            filespec: filespec.into(),
            ..Default::default()
        }
    }

    /// A query from a volume ID and an optional file specification. A single argument
    /// is taken as the file specification.
    pub fn from_args(volume_id: &str, filespec: Option<&str>) -> FilespecQuery {
        match filespec {
            Some(filespec) => FilespecQuery::new(filespec).with_volume_id(volume_id),
            None => FilespecQuery::new(volume_id),
        }
    }

    pub fn with_volume_id(mut self, volume_id: impl Into<String>) -> Self {
        self.volume_id = volume_id.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_substring(mut self, substring: bool) -> Self {
        self.substring = substring;
        self
    }
}

impl Table {
    /// Name of the file-specification column, if one was located.
    pub fn filespec_column(&self) -> Option<&str> {
        self.key_columns()
            .filespec
            .map(|index| self.columns()[index].name())
    }

    /// Name of the volume-ID column, if one was located.
    pub fn volume_column(&self) -> Option<&str> {
        self.key_columns()
            .volume
            .map(|index| self.columns()[index].name())
    }

    /// Distinct filename keys in first-seen order, in their original case.
    pub fn filename_keys(&self) -> Result<&[String]> {
        Ok(&self.filename_index()?.keys)
    }

    /// Indices of the rows whose filename key equals `key`, ignoring case.
    pub fn row_indices_by_filename_key(&self, key: &str) -> Result<&[usize]> {
        self.filename_index()?
            .rows_by_key
            .get(&key.to_lowercase())
            .map(Vec::as_slice)
            .ok_or_else(|| Error::unknown_key(key))
    }

    pub fn rows_by_filename_key(&self, key: &str) -> Result<Vec<RowDict>> {
        let rows = self.row_indices_by_filename_key(key)?;
        let dicts = self.row_dicts(LowercaseOptions::NONE);
        Ok(rows.iter().map(|&row| dicts[row].clone()).collect())
    }

    /// Indices of the rows matching a volume ID and file specification.
    ///
    /// The search is case-insensitive. The file specification is first normalized to
    /// the form of the table's first file specification (see [`normalize_filespec`]).
    /// The volume ID is ignored when it is empty or when the table has no volume-ID
    /// column.
    pub fn find_row_indices_by_volume_filespec(&self, query: &FilespecQuery) -> Result<Vec<usize>> {
        let key_columns = self.key_columns();
        let filespec_index = key_columns
            .filespec
            .ok_or_else(|| Error::schema("file specification column not found"))?;
        if self.row_count() == 0 {
            return Ok(Vec::new());
        }

        let filespec_column = &self.columns()[filespec_index];
        let example = filespec_column
            .value(0, 0)
            .map(|value| value_text(&value))
            .unwrap_or_default();
        let filespec = normalize_filespec(&query.filespec, &example, query.substring);
        let filespec_key = format!("{}_lower", filespec_column.name().to_lowercase());

        let mut row_query = RowQuery::new().with_lowercase(LowercaseOptions::ALL);
        row_query = if query.substring {
            row_query.with_substring(filespec_key, filespec)
        } else {
            row_query.with_value(filespec_key, filespec)
        };
        if let Some(volume_index) = key_columns.volume {
            if !query.volume_id.is_empty() {
                let volume_key = format!("{}_lower", self.columns()[volume_index].name().to_lowercase());
                row_query = row_query.with_value(volume_key, query.volume_id.to_lowercase());
            }
        }
        if let Some(limit) = query.limit {
            row_query = row_query.with_limit(limit);
        }
        self.find_row_indices(&row_query)
    }

    /// Index of the first row matching a volume ID and file specification, or
    /// `RowNotFound`.
    pub fn find_row_index_by_volume_filespec(&self, query: &FilespecQuery) -> Result<usize> {
        let rows = self.find_row_indices_by_volume_filespec(&query.clone().with_limit(1))?;
        rows.first().copied().ok_or_else(|| {
            Error::row_not_found(format!(
                "volume_id={:?}, filespec={:?}",
                query.volume_id, query.filespec
            ))
        })
    }

    pub fn find_rows_by_volume_filespec(&self, query: &FilespecQuery) -> Result<Vec<RowDict>> {
        let rows = self.find_row_indices_by_volume_filespec(query)?;
        let dicts = self.row_dicts(LowercaseOptions::NONE);
        Ok(rows.into_iter().map(|row| dicts[row].clone()).collect())
    }

    pub fn find_row_by_volume_filespec(&self, query: &FilespecQuery) -> Result<RowDict> {
        let row = self.find_row_index_by_volume_filespec(query)?;
        Ok(self.row_dicts(LowercaseOptions::NONE)[row].clone())
    }
}

/// The key of a file in the filename index: its basename without extension, truncated
/// to `keylen` characters when `keylen` is non-zero.
pub fn filename_key(filename: &str, keylen: usize) -> String {
    let (stem, _) = split_extension(basename(filename));
    match stem.char_indices().nth(keylen) {
        Some((end, _)) if keylen > 0 => stem[..end].to_string(),
        _ => stem.to_string(),
    }
}

/// Rewrites `filespec` into the lower-cased form of `example`, a file specification
/// taken from the table.
///
/// Bracketed (VMS) directories in the example turn `a/b/c.x` into `[a.b]c.x`; an
/// example without directories reduces `filespec` to its basename. Unless `substring`
/// is set, the extension of `filespec` is replaced by the example's.
pub fn normalize_filespec(filespec: &str, example: &str, substring: bool) -> String {
    let mut spec = if example.contains('[') {
        let (dirs, name) = filespec.rsplit_once('/').unwrap_or(("", filespec));
        format!("[{}]{name}", dirs.replace('/', "."))
    } else if !example.contains('/') {
        basename(filespec).to_string()
    } else {
        filespec.to_string()
    };

    let stem_len = split_extension(&spec).0.len();
    spec.truncate(stem_len);
    if !substring {
        spec.push_str(split_extension(example).1);
    }
    spec.to_lowercase()
}

fn basename(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// Splits `path` into the part before the extension and the extension (dot included).
/// Leading dots of the file name do not start an extension.
fn split_extension(path: &str) -> (&str, &str) {
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    match path.rfind('.') {
        Some(dot) if dot > name_start && path[name_start..dot].bytes().any(|b| b != b'.') => {
            path.split_at(dot)
        }
        _ => (path, ""),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
