// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Partition key types and literal tests

use fe_catalog::{BlockReplica, Column, FileBlock, FsTable, Partition, PartitionValue};
use fe_common::{DataType, FeError, FileFormat};
use serde_json::json;

const NULL_KEY: &str = "__HIVE_DEFAULT_PARTITION__";

#[test]
fn test_primitive_types_partitionable() {
    for ty in [
        DataType::Boolean,
        DataType::Int,
        DataType::BigInt,
        DataType::Double,
        DataType::String,
        DataType::Varchar { len: 10 },
        DataType::Decimal { precision: 12, scale: 2 },
    ] {
        assert!(ty.supports_table_partitioning(), "{}", ty);
    }
}

#[test]
fn test_unpartitionable_types() {
    let unsupported = [
        DataType::Timestamp,
        DataType::Binary,
        DataType::Array(Box::new(DataType::Int)),
        DataType::Map {
            key: Box::new(DataType::String),
            value: Box::new(DataType::Int),
        },
    ];
    for ty in unsupported {
        assert!(!ty.supports_table_partitioning(), "{}", ty);
        let columns = vec![
            Column::new("k", ty.clone(), 0),
            Column::new("v", DataType::Int, 1),
        ];
        let err = FsTable::new("db", "t", columns, 1, "/warehouse/t").unwrap_err();
        assert!(matches!(err, FeError::TableLoadingError(_)));
    }
}

#[test]
fn test_complex_column_allowed_outside_clustering() {
    let columns = vec![
        Column::new("k", DataType::Int, 0),
        Column::new("tags", DataType::Array(Box::new(DataType::String)), 1),
    ];
    assert!(FsTable::new("db", "t", columns, 1, "/warehouse/t").is_ok());
}

#[test]
fn test_type_display() {
    assert_eq!(DataType::Decimal { precision: 12, scale: 2 }.to_string(), "DECIMAL(12,2)");
    assert_eq!(DataType::Array(Box::new(DataType::Int)).to_string(), "ARRAY<INT>");
    assert_eq!(DataType::Varchar { len: 100 }.to_string(), "VARCHAR(100)");
}

#[test]
fn test_decimal_values() {
    let ty = DataType::Decimal { precision: 10, scale: 2 };
    let v = PartitionValue::parse("12.5", &ty, NULL_KEY).unwrap();
    assert_eq!(v.string_value(), "12.50");
    let negative = PartitionValue::parse("-0.05", &ty, NULL_KEY).unwrap();
    assert_eq!(negative.string_value(), "-0.05");
    assert!(negative < v);
    // Too many fractional digits for the scale
    assert!(PartitionValue::parse("1.234", &ty, NULL_KEY).is_err());
}

#[test]
fn test_decimal_order_across_scales() {
    let a = PartitionValue::Decimal { unscaled: 150, scale: 2 };
    let b = PartitionValue::Decimal { unscaled: 15, scale: 1 };
    let c = PartitionValue::Decimal { unscaled: 2, scale: 0 };
    assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
    assert!(b < c);
    assert_eq!(a.string_value(), "1.50");
    assert_eq!(b.string_value(), "1.5");
    assert_eq!(a.with_scale(1).unwrap().string_value(), "1.5");
    assert!(a.with_scale(0).is_none());
}

fn price_table() -> FsTable {
    FsTable::new(
        "db",
        "prices",
        vec![
            Column::new("price", DataType::Decimal { precision: 6, scale: 1 }, 0),
            Column::new("item", DataType::String, 1),
        ],
        1,
        "/warehouse/prices",
    )
    .unwrap()
}

#[test]
fn test_decimal_keys_stored_at_column_scale() {
    let mut table = price_table();
    let id = table
        .create_partition(
            vec![PartitionValue::Decimal { unscaled: 1, scale: 0 }],
            "/warehouse/prices/price=1.0",
            FileFormat::Text,
            Vec::new(),
        )
        .unwrap();
    let stored = &table.get_partition(id).unwrap().values[0];
    assert_eq!(stored.string_value(), "1.0");
    assert!(table.get_partition_by_name("price=1.0").is_some());
    assert!(table.get_partition_by_name("price=1").is_none());

    let same_key = table.next_partition_id();
    table
        .add_partition(Partition::new(
            same_key,
            vec![PartitionValue::Decimal { unscaled: 100, scale: 2 }],
            "/warehouse/prices/price=1.00",
            FileFormat::Text,
        ))
        .unwrap();
    let bucket = &table.partition_value_map(0).unwrap()[&PartitionValue::Decimal { unscaled: 10, scale: 1 }];
    assert_eq!(bucket.len(), 2);
    assert_eq!(table.get_partition(same_key).unwrap().values[0].string_value(), "1.0");
}

#[test]
fn test_decimal_key_finer_than_column_rejected() {
    let mut table = price_table();
    let err = table
        .create_partition(
            vec![PartitionValue::Decimal { unscaled: 125, scale: 2 }],
            "/warehouse/prices/price=1.25",
            FileFormat::Text,
            Vec::new(),
        )
        .unwrap_err();
    assert!(matches!(err, FeError::InvalidArgument(_)));
    assert_eq!(table.num_partitions(), 0);
}

#[test]
fn test_values_json_form() {
    let values = vec![
        PartitionValue::Null,
        PartitionValue::Integer(2024),
        PartitionValue::from("us-east"),
        PartitionValue::Decimal { unscaled: -350, scale: 2 },
    ];
    let encoded = serde_json::to_value(&values).unwrap();
    assert_eq!(
        encoded,
        json!(["Null", {"Integer": 2024}, {"String": "us-east"}, {"Decimal": {"unscaled": -350, "scale": 2}}])
    );
    let decoded: Vec<PartitionValue> = serde_json::from_value(encoded).unwrap();
    assert_eq!(decoded, values);
    assert_eq!(decoded[3].string_value(), "-3.50");
}

#[test]
fn test_file_block_json_form() {
    let block: FileBlock = serde_json::from_value(json!({
        "offset": 0,
        "length": 1024,
        "replicas": [{"host_idx": 2, "is_cached": true}, {"host_idx": 0, "is_cached": false}]
    }))
    .unwrap();
    assert_eq!(
        block,
        FileBlock::new(0, 1024, vec![BlockReplica::new(2, true), BlockReplica::new(0, false)])
    );
    assert!(block.is_cached());
    assert_eq!(serde_json::to_value(&block).unwrap()["replicas"][0]["host_idx"], 2);
    assert!(serde_json::from_value::<FileBlock>(json!({"offset": 0})).is_err());
}

#[test]
fn test_string_and_null_keys() {
    let ty = DataType::String;
    assert_eq!(
        PartitionValue::parse("us-east", &ty, NULL_KEY).unwrap(),
        PartitionValue::String("us-east".to_string())
    );
    let null = PartitionValue::parse(NULL_KEY, &ty, NULL_KEY).unwrap();
    assert!(null.is_null());
    assert_eq!(null.to_partition_key_string(NULL_KEY), NULL_KEY);
    assert_eq!(null.string_value(), "NULL");
}

#[test]
fn test_unsupported_key_type() {
    let err = PartitionValue::parse("2024-01-01", &DataType::Timestamp, NULL_KEY).unwrap_err();
    assert!(matches!(err, FeError::NotSupported(_)));
}
