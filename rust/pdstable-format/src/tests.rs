use std::path::Path;

use pdstable_common::error::ErrorKind;

use crate::{
    ColumnSchemaBuilder, LogicalType, RecordLayout, TableDescriptor, TableSchemaBuilder,
    ValidRange, ValidityOverrides, Value,
};

const INDEX_DESCRIPTOR: &str = r#"{
    "label_path": "/volumes/COISS_2001/INDEX/INDEX.LBL",
    "record_type": "FIXED_LENGTH",
    "interchange_format": "ASCII",
    "rows": 4,
    "row_bytes": 48,
    "table_files": ["INDEX.TAB"],
    "columns": [
        {"name": "VOLUME_ID", "data_type": "CHARACTER", "start_byte": 2, "bytes": 11},
        {"name": "FILE_SPECIFICATION_NAME", "data_type": "CHARACTER", "start_byte": 16, "bytes": 14},
        {"name": "IMAGE_TIME", "data_type": "CHARACTER", "start_byte": 32, "bytes": 4},
        {"name": "N", "data_type": "ASCII_INTEGER", "start_byte": 37, "bytes": 4,
         "invalid_constants": ["-999"], "valid_range": {"min": -1000.0, "max": 1000.0}},
        {"name": "V", "data_type": "ASCII_REAL", "start_byte": 42, "bytes": 4,
         "items": 2, "item_bytes": 2, "item_offset": 2}
    ]
}"#;

#[test]
fn test_resolve_fixed_descriptor() {
    let descriptor = TableDescriptor::from_json(INDEX_DESCRIPTOR).unwrap();
    let schema = descriptor
        .resolve(&ValidityOverrides::new().with_default_invalid(["UNK"]), None)
        .unwrap();

    assert_eq!(schema.len(), 5);
    assert_eq!(schema.row_count(), 4);
    assert_eq!(schema.layout(), RecordLayout::Fixed { row_byte_length: 48 });
    assert_eq!(
        schema.table_file_path(),
        Path::new("/volumes/COISS_2001/INDEX/INDEX.TAB")
    );

    let time = schema.column("IMAGE_TIME").unwrap();
    assert_eq!(time.logical_type(), LogicalType::Time);
    assert_eq!(time.column_number(), 2);

    let n = schema.column("N").unwrap();
    assert!(n.is_invalid_value(&Value::Integer(-999)));
    assert!(n.is_invalid_value(&Value::from("UNK")));
    assert_eq!(n.valid_range(), Some(ValidRange::new(-1000.0, 1000.0)));

    let v = schema.column("V").unwrap();
    assert_eq!(v.item_count(), 2);
    assert_eq!(v.item_range(1), Some(43..45));
}

#[test]
fn test_descriptor_json_roundtrip() {
    let descriptor = TableDescriptor::from_json(INDEX_DESCRIPTOR).unwrap();
    let json = descriptor.to_json().unwrap();
    assert_eq!(TableDescriptor::from_json(&json).unwrap(), descriptor);
}

#[test]
fn test_delimited_descriptor() {
    let json = r#"{
        "record_type": "DELIMITED",
        "rows": 3,
        "field_delimiter": "Comma",
        "table_files": ["stars.csv", "events.tab"],
        "columns": [
            {"name": "Star Name", "data_type": "ASCII_String", "field_number": 1},
            {"name": "Star Number", "data_type": "ASCII_Integer", "field_number": 2}
        ]
    }"#;
    let descriptor = TableDescriptor::from_json(json).unwrap();
    let err = descriptor.resolve(&ValidityOverrides::new(), None).unwrap_err();
    assert!(err.to_string().contains("['stars.csv', 'events.tab']"));

    let schema = descriptor
        .resolve(&ValidityOverrides::new(), Some("stars.csv"))
        .unwrap();
    assert!(!schema.is_fixed_length());
    assert_eq!(schema.layout().field_delimiter(), Some(b','));
    assert_eq!(schema.column("Star Number").unwrap().field_number(), 1);
}

#[test]
fn test_schema_errors() {
    let mut descriptor = TableDescriptor::from_json(INDEX_DESCRIPTOR).unwrap();
    descriptor.interchange_format = "BINARY".into();
    assert!(matches!(
        descriptor.resolve(&ValidityOverrides::new(), None).unwrap_err().kind(),
        ErrorKind::Schema { .. }
    ));

    let mut descriptor = TableDescriptor::from_json(INDEX_DESCRIPTOR).unwrap();
    descriptor.record_type = "STREAM".into();
    assert!(descriptor.resolve(&ValidityOverrides::new(), None).is_err());

    let mut descriptor = TableDescriptor::from_json(INDEX_DESCRIPTOR).unwrap();
    descriptor.columns[1].name = "VOLUME_ID".into();
    let err = descriptor.resolve(&ValidityOverrides::new(), None).unwrap_err();
    assert!(err.to_string().contains("duplicated column name: VOLUME_ID"));

    let mut descriptor = TableDescriptor::from_json(INDEX_DESCRIPTOR).unwrap();
    descriptor.columns[0].data_type = "BIT_STRING".into();
    assert!(descriptor.resolve(&ValidityOverrides::new(), None).is_err());
}

#[test]
fn test_geometry_validation() {
    let overflow = TableSchemaBuilder::fixed(10, 1)
        .with_column(ColumnSchemaBuilder::new("A", LogicalType::String).with_geometry(6, 4))
        .build();
    assert!(overflow.is_err());

    let items = TableSchemaBuilder::fixed(20, 1)
        .with_column(
            ColumnSchemaBuilder::new("A", LogicalType::Integer)
                .with_geometry(1, 6)
                .with_items(3, 2, 3),
        )
        .build();
    assert!(items.is_err());

    let missing = TableSchemaBuilder::fixed(20, 1)
        .with_column(ColumnSchemaBuilder::new("A", LogicalType::Integer))
        .build();
    assert!(missing.is_err());

    let fits = TableSchemaBuilder::fixed(10, 1)
        .with_column(ColumnSchemaBuilder::new("A", LogicalType::String).with_geometry(5, 4))
        .with_column(ColumnSchemaBuilder::new("B", LogicalType::Integer).with_geometry(1, 3))
        .build()
        .unwrap();
    let names = fits.column_names().collect::<Vec<_>>();
    assert_eq!(names, ["A", "B"]);
}

#[test]
fn test_schema_validity_overrides() {
    let schema = TableSchemaBuilder::fixed(10, 1)
        .with_column(ColumnSchemaBuilder::new("N", LogicalType::Float).with_geometry(1, 6))
        .build()
        .unwrap();
    let overridden = schema.with_validity_overrides(
        &ValidityOverrides::new()
            .with_invalid("N", ["1.0E32"])
            .with_valid_range("N", ValidRange::new(0.0, 1.0)),
    );
    let column = overridden.column("N").unwrap();
    assert!(column.is_invalid_value(&Value::Float(1.0e32)));
    assert!(column.is_out_of_range(2.0));
    assert!(schema.column("N").unwrap().invalid_values().is_empty());
}
