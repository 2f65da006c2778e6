use std::fmt;

use pdstable_common::{Result, error::Error};

use crate::value::ValueKind;

/// Logical type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    Integer,
    Float,
    String,
    Time,
    Boolean,
}

/// Result of mapping a declared type tag: the logical type and, for integers,
/// the radix of the textual representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedType {
    pub logical_type: LogicalType,
    pub numeric_base: u32,
}

impl ResolvedType {
    fn new(logical_type: LogicalType) -> ResolvedType {
        ResolvedType {
            logical_type,
            numeric_base: 10,
        }
    }

    fn integer(numeric_base: u32) -> ResolvedType {
        ResolvedType {
            logical_type: LogicalType::Integer,
            numeric_base,
        }
    }
}

impl LogicalType {
    /// Determines the logical type of a column from its declared type tag and name.
    ///
    /// Exact tags of the XML label dialect are matched first, then the keyword
    /// dialect is matched by substring. Columns whose name ends in `_TIME` or
    /// `_DATE` are treated as `Time` unless the tag is numeric or boolean.
    ///
    /// # Errors
    ///
    /// Returns a schema error for tags that map to no supported type.
    pub fn from_type_tag(tag: &str, column_name: &str) -> Result<ResolvedType> {
        let tag = tag.trim();
        if let Some(resolved) = Self::from_xml_tag(tag) {
            return Ok(resolved);
        }

        let upper = tag.to_ascii_uppercase();
        let time_by_name = column_name.ends_with("_TIME") || column_name.ends_with("_DATE");
        let resolved = if upper.contains("INTEGER") {
            ResolvedType::integer(10)
        } else if upper.contains("REAL") {
            ResolvedType::new(LogicalType::Float)
        } else if upper.contains("BOOLEAN") {
            ResolvedType::new(LogicalType::Boolean)
        } else if upper.contains("TIME") || upper.contains("DATE") || time_by_name {
            ResolvedType::new(LogicalType::Time)
        } else if upper.contains("CHAR") {
            ResolvedType::new(LogicalType::String)
        } else {
            return Err(Error::schema(format!(
                "unsupported data type '{tag}' in column '{column_name}'"
            )));
        };
        Ok(resolved)
    }

    fn from_xml_tag(tag: &str) -> Option<ResolvedType> {
        let resolved = match tag {
            "ASCII_Integer" | "ASCII_NonNegative_Integer" => ResolvedType::integer(10),
            "ASCII_Numeric_Base2" => ResolvedType::integer(2),
            "ASCII_Numeric_Base8" => ResolvedType::integer(8),
            "ASCII_Numeric_Base16" => ResolvedType::integer(16),
            "ASCII_Real" => ResolvedType::new(LogicalType::Float),
            "ASCII_Boolean" => ResolvedType::new(LogicalType::Boolean),
            "ASCII_Date_DOY"
            | "ASCII_Date_Time_DOY"
            | "ASCII_Date_Time_DOY_UTC"
            | "ASCII_Date_Time_YMD"
            | "ASCII_Date_Time_YMD_UTC"
            | "ASCII_Date_YMD"
            | "ASCII_Time" => ResolvedType::new(LogicalType::Time),
            "ASCII_AnyURI"
            | "ASCII_Directory_Path_Name"
            | "ASCII_DOI"
            | "ASCII_File_Name"
            | "ASCII_File_Specification_Name"
            | "ASCII_LID"
            | "ASCII_LIDVID"
            | "ASCII_LIDVID_LID"
            | "ASCII_MD5_Checksum"
            | "ASCII_String"
            | "ASCII_VID"
            | "UTF8_String" => ResolvedType::new(LogicalType::String),
            _ => return None,
        };
        Some(resolved)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, LogicalType::Integer | LogicalType::Float)
    }

    /// Storage kind of decoded values. Time columns are stored as float seconds when
    /// converted and as text otherwise.
    pub fn value_kind(&self, convert_time: bool) -> ValueKind {
        match self {
            LogicalType::Integer => ValueKind::Integer,
            LogicalType::Float => ValueKind::Float,
            LogicalType::String => ValueKind::String,
            LogicalType::Time if convert_time => ValueKind::Float,
            LogicalType::Time => ValueKind::String,
            LogicalType::Boolean => ValueKind::Boolean,
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogicalType::Integer => "int",
            LogicalType::Float => "float",
            LogicalType::String => "string",
            LogicalType::Time => "time",
            LogicalType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}
