//! Synonym lists used to recognize the file-specification and volume-ID columns of
//! index tables.

/// Known names of the column holding the file specification of each row.
pub const FILE_SPECIFICATION_COLUMN_NAMES: &[&str] = &[
    "FILE_SPECIFICATION_NAME",
    "FILE SPECIFICATION NAME",
    "FILE SPECIFICATION",
    "FILE_NAME",
    "FILE NAME",
    "FILENAME",
    "PRODUCT_ID",
    "PRODUCT ID",
    "STSCI_GROUP_ID",
];

/// Known names of the column holding the volume (or bundle) identifier of each row.
pub const VOLUME_ID_COLUMN_NAMES: &[&str] = &[
    "VOLUME_ID",
    "VOLUME ID",
    "VOLUME_NAME",
    "VOLUME NAME",
    "BUNDLE NAME",
];

/// Ordered synonym lists for the key columns of an index table. Earlier entries take
/// precedence; matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumnNames {
    pub file_specification: Vec<String>,
    pub volume_id: Vec<String>,
}

impl Default for KeyColumnNames {
    fn default() -> Self {
        KeyColumnNames {
            file_specification: FILE_SPECIFICATION_COLUMN_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            volume_id: VOLUME_ID_COLUMN_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl KeyColumnNames {
    /// Returns the index within `names` of the file-specification column.
    pub fn locate_file_specification<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str> + Clone,
    ) -> Option<usize> {
        locate(&self.file_specification, names)
    }

    /// Returns the index within `names` of the volume-ID column.
    pub fn locate_volume_id<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str> + Clone,
    ) -> Option<usize> {
        locate(&self.volume_id, names)
    }
}

/// The first synonym (in list order) that names one of the columns wins.
fn locate<'a>(synonyms: &[String], names: impl IntoIterator<Item = &'a str> + Clone) -> Option<usize> {
    synonyms.iter().find_map(|synonym| {
        names
            .clone()
            .into_iter()
            .position(|name| name.eq_ignore_ascii_case(synonym))
    })
}
