//! Dialect-independent description of PDS ASCII tables: typed values, logical types,
//! column and table schemas, validity configuration and the descriptors a label
//! parser hands over to the decoding engine.

pub mod column;
pub mod descriptor;
pub mod key_columns;
pub mod logical_type;
pub mod table;
pub mod table_file;
pub mod validity;
pub mod value;

pub use column::{ColumnSchema, ColumnSchemaBuilder};
pub use descriptor::{ColumnDescriptor, TableDescriptor};
pub use key_columns::KeyColumnNames;
pub use logical_type::LogicalType;
pub use table::{RECORD_TERMINATOR_LEN, RecordLayout, TableSchema, TableSchemaBuilder};
pub use table_file::resolve_table_file;
pub use validity::{ValidRange, ValidityOverrides};
pub use value::{Value, ValueKind};

#[cfg(test)]
mod tests;
