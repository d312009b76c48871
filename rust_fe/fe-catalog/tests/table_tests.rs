// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Tests for FsTable construction, partition lookup and maintenance

use fe_catalog::{Column, FsTable, Partition, PartitionKeyValue, PartitionValue, Table};
use fe_common::{AccessLevel, DataType, FeError, FileFormat, PartitionId};

fn sales_table() -> FsTable {
    let mut table = FsTable::new(
        "db",
        "sales",
        vec![
            Column::new("year", DataType::Int, 0),
            Column::new("region", DataType::String, 1),
            Column::new("amount", DataType::Double, 2),
        ],
        2,
        "/warehouse/sales",
    )
    .unwrap();
    for (year, region) in [
        (PartitionValue::Integer(2023), PartitionValue::from("eu")),
        (PartitionValue::Integer(2024), PartitionValue::from("eu")),
        (PartitionValue::Integer(2024), PartitionValue::Null),
    ] {
        table
            .create_partition(vec![year, region], "/warehouse/sales/p", FileFormat::Parquet, Vec::new())
            .unwrap();
    }
    table
}

#[test]
fn test_table_creation() {
    let table = sales_table();
    assert_eq!(table.full_name(), "db.sales");
    assert_eq!(table.num_clustering_cols(), 2);
    assert_eq!(table.num_partitions(), 3);
    assert!(table.default_partition().is_default());
    assert_eq!(table.num_rows(), -1);
    assert!(table.column("REGION").is_some());
}

#[test]
fn test_unsupported_partition_column_type() {
    let result = FsTable::new(
        "db",
        "bad",
        vec![Column::new("ts", DataType::Timestamp, 0)],
        1,
        "/warehouse/bad",
    );
    assert!(matches!(result, Err(FeError::TableLoadingError(_))));

    let result = FsTable::new("db", "bad", vec![Column::new("a", DataType::Int, 0)], 2, "/w");
    assert!(matches!(result, Err(FeError::TableLoadingError(_))));
}

#[test]
fn test_lookup_exact_match() {
    let table = sales_table();
    let spec = vec![
        PartitionKeyValue::new("Region", "eu"),
        PartitionKeyValue::new("YEAR", 2024),
    ];
    let partition = table.get_partition_by_spec(&spec).unwrap();
    assert_eq!(partition.values[0], PartitionValue::Integer(2024));
    assert_eq!(partition.values[1], PartitionValue::from("eu"));
}

#[test]
fn test_lookup_duplicate_key_not_found() {
    let table = sales_table();
    let spec = vec![
        PartitionKeyValue::new("year", 2024),
        PartitionKeyValue::new("region", "eu"),
        PartitionKeyValue::new("year", 2024),
    ];
    assert!(table.get_partition_by_spec(&spec).is_none());
}

#[test]
fn test_lookup_value_mismatch_not_found() {
    let table = sales_table();
    let spec = vec![
        PartitionKeyValue::new("year", 2022),
        PartitionKeyValue::new("region", "eu"),
    ];
    assert!(table.get_partition_by_spec(&spec).is_none());
}

#[test]
fn test_lookup_column_count_mismatch_not_found() {
    let table = sales_table();
    assert!(table
        .get_partition_by_spec(&[PartitionKeyValue::new("year", 2023)])
        .is_none());
    assert!(table.get_partition_by_spec(&[]).is_none());
}

#[test]
fn test_lookup_null_and_empty_string() {
    let table = sales_table();
    let by_null = table
        .get_partition_by_spec(&[
            PartitionKeyValue::new("year", 2024),
            PartitionKeyValue {
                name: "region".to_string(),
                value: PartitionValue::Null,
            },
        ])
        .unwrap();
    let by_empty = table
        .get_partition_by_spec(&[
            PartitionKeyValue::new("year", 2024),
            PartitionKeyValue::new("region", ""),
        ])
        .unwrap();
    let by_sentinel = table
        .get_partition_by_spec(&[
            PartitionKeyValue::new("year", 2024),
            PartitionKeyValue::new("region", "__HIVE_DEFAULT_PARTITION__"),
        ])
        .unwrap();
    assert_eq!(by_null.id, by_empty.id);
    assert_eq!(by_null.id, by_sentinel.id);
    assert!(by_null.values[1].is_null());
}

#[test]
fn test_duplicate_partition_rejected() {
    let mut table = sales_table();
    let existing = table.sorted_partitions()[0].clone();
    assert!(matches!(
        table.add_partition(existing),
        Err(FeError::AlreadyExists(_))
    ));

    let id = table.next_partition_id();
    let short = Partition::new(id, vec![PartitionValue::Integer(1)], "/w", FileFormat::Text);
    assert!(matches!(
        table.add_partition(short),
        Err(FeError::InvalidArgument(_))
    ));
}

#[test]
fn test_drop_by_spec_and_reload() {
    let mut table = sales_table();
    let spec = vec![
        PartitionKeyValue::new("year", 2023),
        PartitionKeyValue::new("region", "eu"),
    ];
    let dropped = table.drop_partition_by_spec(&spec).unwrap();
    assert_eq!(table.num_partitions(), 2);
    assert!(table.get_partition_by_name("year=2023/region=eu").is_none());

    let target = table.sorted_partitions()[0].id;
    let new_id = table.next_partition_id();
    let reloaded = Partition::new(new_id, dropped.values.clone(), "/warehouse/sales/new", FileFormat::Text);
    table.reload_partition(target, reloaded).unwrap();
    assert!(table.get_partition(target).is_none());
    assert_eq!(table.get_partition(new_id).unwrap().location, "/warehouse/sales/new");

    let missing = Partition::new(table.next_partition_id(), dropped.values, "/w", FileFormat::Text);
    assert!(matches!(
        table.reload_partition(PartitionId::new(999), missing),
        Err(FeError::NotFound(_))
    ));
}

#[test]
fn test_drop_partitions_skips_missing() {
    let mut table = sales_table();
    let ids: Vec<PartitionId> = table.sorted_partitions().iter().map(|p| p.id).collect();
    let dropped = table.drop_partitions(&[ids[0], PartitionId::new(999), ids[2]]);
    assert_eq!(dropped.len(), 2);
    assert_eq!(table.num_partitions(), 1);
}

#[test]
fn test_default_partition_replaced() {
    let mut table = sales_table();
    table.add_default_partition("/warehouse/sales_v2", FileFormat::Avro);
    assert_eq!(table.default_partition().location, "/warehouse/sales_v2");
    assert_eq!(table.default_partition().file_format, FileFormat::Avro);
    assert!(table.default_partition().is_default());
    assert!(!table.partition_ids().contains(&table.default_partition().id));
}

#[test]
fn test_majority_format_and_access() {
    let mut table = sales_table();
    assert_eq!(table.majority_format(), FileFormat::Parquet);
    assert!(table.has_write_access());

    let id = table.next_partition_id();
    table
        .add_partition(
            Partition::new(
                id,
                vec![PartitionValue::Integer(2025), PartitionValue::from("us")],
                "/readonly/sales/2025",
                FileFormat::Text,
            )
            .with_access_level(AccessLevel::ReadOnly),
        )
        .unwrap();
    assert!(!table.has_write_access());
    assert_eq!(
        table.first_location_without_write_access(),
        Some("/readonly/sales/2025")
    );
}

#[test]
fn test_sorted_partitions_by_value() {
    let table = sales_table();
    let names: Vec<String> = table
        .sorted_partitions()
        .iter()
        .map(|p| p.partition_name(table.clustering_columns(), table.null_partition_key_value()))
        .collect();
    assert_eq!(
        names,
        vec![
            "year=2023/region=eu",
            "year=2024/region=__HIVE_DEFAULT_PARTITION__",
            "year=2024/region=eu",
        ]
    );
}
