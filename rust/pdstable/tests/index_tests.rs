use pdstable::{
    ErrorKind, FilespecQuery, LowercaseOptions, RowQuery, Table, TableOptions,
    format::{KeyColumnNames, TableSchema, ValidityOverrides, Value},
};
use pdstable_testkit::{
    data_gen::{IndexTableSpec, generate_index_table},
    fixtures::FixedWidthTable,
};

fn open(descriptor: &pdstable::format::TableDescriptor, options: &TableOptions) -> Table {
    let schema: TableSchema = descriptor.resolve(&ValidityOverrides::new(), None).unwrap();
    Table::open(schema, options).unwrap()
}

fn index_table(options: &TableOptions) -> Table {
    let spec = IndexTableSpec {
        rows: 10,
        ..Default::default()
    };
    let (_dir, descriptor) = generate_index_table(&spec).unwrap();
    open(&descriptor, options)
}

#[test]
fn test_key_columns_are_located() {
    let table = index_table(&TableOptions::new());
    assert_eq!(table.filespec_column(), Some("FILE_SPECIFICATION_NAME"));
    assert_eq!(table.volume_column(), Some("VOLUME_ID"));

    let table = index_table(&TableOptions::new().with_columns(["N"]));
    assert_eq!(table.filespec_column(), None);
    let err = table.filename_keys().unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Schema { .. }));
    let err = table
        .find_row_indices_by_volume_filespec(&FilespecQuery::new("C1000000_0.LBL"))
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Schema { .. }));
}

#[test]
fn test_custom_key_column_names() {
    let (_dir, descriptor) = FixedWidthTable::new()
        .string_column("PRODUCT", 8)
        .row(&["A.IMG"])
        .row(&["B.IMG"])
        .write_temp("CUSTOM.TAB")
        .unwrap();
    let names = KeyColumnNames {
        file_specification: vec!["product".to_string()],
        volume_id: Vec::new(),
    };
    let table = open(&descriptor, &TableOptions::new().with_key_columns(names));
    assert_eq!(table.filespec_column(), Some("PRODUCT"));
    assert_eq!(table.volume_column(), None);
    assert_eq!(table.filename_keys().unwrap(), ["A", "B"]);
}

#[test]
fn test_filename_index() {
    let table = index_table(&TableOptions::new());
    let keys = table.filename_keys().unwrap();
    assert_eq!(keys.len(), 10);
    assert_eq!(keys[0], "C1000000_0");
    assert_eq!(keys[3], "C1000001_1");
    assert_eq!(table.row_indices_by_filename_key("c1000001_1").unwrap(), [3]);

    let err = table.row_indices_by_filename_key("C9999999_0").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnknownKey { .. }));
    assert!(err.is_lookup_failure());
}

#[test]
fn test_truncated_filename_keys() {
    let table = index_table(&TableOptions::new().with_filename_keylen(8));
    assert_eq!(
        table.filename_keys().unwrap(),
        ["C1000000", "C1000001", "C1000002", "C1000003", "C1000004"]
    );
    assert_eq!(table.row_indices_by_filename_key("C1000002").unwrap(), [4, 5]);

    let rows = table.rows_by_filename_key("c1000004").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[1].value("FILE_SPECIFICATION_NAME").unwrap().as_scalar(),
        Some(&Value::from("DATA/C1000004_1.LBL"))
    );
}

#[test]
fn test_volume_filespec_lookup() {
    let table = index_table(&TableOptions::new());

    let query = FilespecQuery::from_args("vol_0001", Some("data/c1000001_1.img"));
    assert_eq!(table.find_row_index_by_volume_filespec(&query).unwrap(), 3);
    let row = table.find_row_by_volume_filespec(&query).unwrap();
    assert_eq!(row.value("N").unwrap().as_scalar(), Some(&Value::Integer(9)));

    let query = FilespecQuery::from_args("VOL_0002", Some("DATA/C1000001_1.LBL"));
    let err = table.find_row_index_by_volume_filespec(&query).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::RowNotFound { .. }));

    // Without a volume ID every volume is searched.
    let query = FilespecQuery::new("DATA/C1000004_0.LBL");
    assert_eq!(table.find_row_indices_by_volume_filespec(&query).unwrap(), [8]);
}

#[test]
fn test_substring_filespec_lookup() {
    let table = index_table(&TableOptions::new());
    let query = FilespecQuery::new("C1000002").with_substring(true);
    assert_eq!(table.find_row_indices_by_volume_filespec(&query).unwrap(), [4, 5]);

    let rows = table
        .find_rows_by_volume_filespec(&query.clone().with_limit(1))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].value("VOLUME_ID").unwrap().as_scalar(),
        Some(&Value::from("VOL_0001"))
    );
}

#[test]
fn test_filespec_takes_extension_of_table() {
    let (_dir, descriptor) = FixedWidthTable::new()
        .string_column("FILE_SPECIFICATION_NAME", 8)
        .row(&["bar.txt"])
        .row(&["foo.txt"])
        .write_temp("FILES.TAB")
        .unwrap();
    let table = open(&descriptor, &TableOptions::new());
    let query = FilespecQuery::new("some/dir/FOO.TAB");
    assert_eq!(table.find_row_index_by_volume_filespec(&query).unwrap(), 1);
}

#[test]
fn test_queries_on_lowered_values() {
    let table = index_table(&TableOptions::new());
    let query = RowQuery::new()
        .with_value("volume_id_lower", "vol_0002")
        .with_substring("FILE_SPECIFICATION_NAME_lower", "_1.lbl")
        .with_lowercase(LowercaseOptions::ALL);
    assert_eq!(table.find_row_indices(&query).unwrap(), [5, 7, 9]);

    let rows = table.find_rows(&query.clone().with_limit(2)).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].contains_key("volume_id_lower"));

    let masked = RowQuery::new().with_value("N", -999);
    assert!(table.find_row_indices(&masked).unwrap().is_empty());
}
