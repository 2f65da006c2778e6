//! Dictionary views of table rows.

use ahash::AHashMap;
use rayon::prelude::*;

use crate::column::{CellMask, CellValue, Column};

/// Lower-casing applied when building row dictionaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LowercaseOptions {
    /// Also insert every key in lower case.
    pub keys: bool,
    /// Also insert `<key>_lower` entries holding lower-cased string values.
    pub values: bool,
}

impl LowercaseOptions {
    pub const NONE: LowercaseOptions = LowercaseOptions {
        keys: false,
        values: false,
    };

    pub const ALL: LowercaseOptions = LowercaseOptions {
        keys: true,
        values: true,
    };

    pub fn new(keys: bool, values: bool) -> LowercaseOptions {
        LowercaseOptions { keys, values }
    }

    /// Index of this combination among the four possible ones.
    pub(crate) fn slot(&self) -> usize {
        (self.keys as usize) | ((self.values as usize) << 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowField {
    Value(CellValue),
    Mask(CellMask),
}

/// The values and masks of one row, keyed by column name.
///
/// Every column appears under its name and, if the name contains spaces, under the name
/// with spaces replaced by underscores. Each of these keys has a `<key>_mask` companion.
/// Depending on the [`LowercaseOptions`], lower-cased keys and `<key>_lower` entries with
/// lower-cased values are present as well.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowDict {
    fields: AHashMap<String, RowField>,
}

impl RowDict {
    pub fn get(&self, key: &str) -> Option<&RowField> {
        self.fields.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&CellValue> {
        match self.fields.get(key)? {
            RowField::Value(value) => Some(value),
            RowField::Mask(_) => None,
        }
    }

    /// Mask of the column stored under `key`. For a `<key>_lower` entry, the mask of
    /// `<key>` is returned.
    pub fn mask(&self, key: &str) -> Option<&CellMask> {
        let key = key.strip_suffix("_lower").unwrap_or(key);
        match self.fields.get(&format!("{key}_mask"))? {
            RowField::Mask(mask) => Some(mask),
            RowField::Value(_) => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A key under which the value of a column appears in a row dictionary.
pub(crate) struct ValueKey {
    pub key: String,
    /// Key of the companion mask entry, absent for `_lower` keys.
    pub mask_key: Option<String>,
    /// The entry holds lower-cased values.
    pub lowercase: bool,
}

/// Keys of column `name` in row dictionaries built with `options`.
pub(crate) fn value_keys(name: &str, options: LowercaseOptions) -> Vec<ValueKey> {
    let mut bases = vec![name.to_string()];
    let underscored = name.replace(' ', "_");
    if underscored != name {
        bases.push(underscored);
    }

    let mut keys = Vec::new();
    for base in bases {
        let mut plain = vec![base.clone()];
        let lower = base.to_lowercase();
        if options.keys && lower != base {
            plain.push(lower);
        }
        for key in plain {
            if options.values {
                keys.push(ValueKey {
                    key: format!("{key}_lower"),
                    mask_key: None,
                    lowercase: true,
                });
            }
            keys.push(ValueKey {
                mask_key: Some(format!("{key}_mask")),
                key,
                lowercase: false,
            });
        }
    }
    keys
}

/// Maps every value key of `columns` to the column index and the lower-casing flag.
pub(crate) fn key_lookup(columns: &[Column], options: LowercaseOptions) -> AHashMap<String, (usize, bool)> {
    let mut lookup = AHashMap::new();
    for (index, column) in columns.iter().enumerate() {
        for key in value_keys(column.name(), options) {
            lookup.insert(key.key, (index, key.lowercase));
        }
    }
    lookup
}

pub(crate) fn build_row_dicts(
    columns: &[Column],
    row_count: usize,
    options: LowercaseOptions,
) -> Vec<RowDict> {
    let keyed = columns
        .iter()
        .map(|column| (column, value_keys(column.name(), options)))
        .collect::<Vec<_>>();

    (0..row_count)
        .into_par_iter()
        .map(|row| {
            let mut fields = AHashMap::new();
            for (column, keys) in &keyed {
                let (Some(value), Some(mask)) = (column.cell(row), column.cell_mask(row)) else {
                    continue;
                };
                let lowered = options.values.then(|| value.to_lowercase());
                for key in keys {
                    let entry = match (&lowered, key.lowercase) {
                        (Some(lowered), true) => lowered.clone(),
                        _ => value.clone(),
                    };
                    fields.insert(key.key.clone(), RowField::Value(entry));
                    if let Some(mask_key) = &key.mask_key {
                        fields.insert(mask_key.clone(), RowField::Mask(mask.clone()));
                    }
                }
            }
            RowDict { fields }
        })
        .collect()
}
