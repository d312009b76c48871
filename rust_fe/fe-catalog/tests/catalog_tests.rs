// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Integration tests for the copy-on-write catalog

use fe_catalog::{Catalog, Column, FsTable, PartitionValue, Table};
use fe_common::{DataType, FeError, FileFormat};
use std::sync::Arc;
use std::thread;

fn events_table(db: &str) -> FsTable {
    FsTable::new(
        db,
        "events",
        vec![
            Column::new("day", DataType::Int, 0),
            Column::new("payload", DataType::String, 1),
        ],
        1,
        "/warehouse/events",
    )
    .unwrap()
}

#[test]
fn test_create_drop_database() {
    let catalog = Catalog::new();
    catalog.create_database("test_db").unwrap();
    assert!(catalog.get_database("test_db").is_ok());
    assert!(matches!(
        catalog.create_database("test_db"),
        Err(FeError::AlreadyExists(_))
    ));
    catalog.drop_database("test_db").unwrap();
    assert!(catalog.get_database("test_db").is_err());
}

#[test]
fn test_drop_non_empty_database() {
    let catalog = Catalog::new();
    catalog.create_database("db").unwrap();
    catalog.add_table(events_table("db")).unwrap();
    assert!(matches!(
        catalog.drop_database("db"),
        Err(FeError::InvalidArgument(_))
    ));
    catalog.drop_table("db", "events").unwrap();
    catalog.drop_database("db").unwrap();
}

#[test]
fn test_table_in_missing_database() {
    let catalog = Catalog::new();
    assert!(matches!(
        catalog.add_table(events_table("nope")),
        Err(FeError::NotFound(_))
    ));
}

#[test]
fn test_update_publishes_new_snapshot() {
    let catalog = Catalog::new();
    catalog.create_database("db").unwrap();
    catalog.add_table(events_table("db")).unwrap();

    let before = catalog.get_table("db", "events").unwrap();
    let id = catalog
        .update_table("db", "events", |table| {
            table.create_partition(
                vec![PartitionValue::Integer(1)],
                "/warehouse/events/day=1",
                FileFormat::Text,
                Vec::new(),
            )
        })
        .unwrap();

    let after = catalog.get_table("db", "events").unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before.num_partitions(), 0);
    assert_eq!(after.num_partitions(), 1);
    assert!(after.get_partition(id).is_some());
}

#[test]
fn test_failed_update_publishes_nothing() {
    let catalog = Catalog::new();
    catalog.create_database("db").unwrap();
    catalog.add_table(events_table("db")).unwrap();
    let before = catalog.get_table("db", "events").unwrap();

    let result = catalog.update_table("db", "events", |table| {
        table.create_partition(
            vec![PartitionValue::Integer(1)],
            "/warehouse/events/day=1",
            FileFormat::Text,
            Vec::new(),
        )?;
        Err::<(), _>(FeError::TableLoadingError("listing failed".to_string()))
    });
    assert!(result.is_err());
    let after = catalog.get_table("db", "events").unwrap();
    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
fn test_concurrent_updates_are_serialised() {
    let catalog = Arc::new(Catalog::new());
    catalog.create_database("db").unwrap();
    catalog.add_table(events_table("db")).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let catalog = catalog.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    catalog
                        .update_table("db", "events", |table| {
                            table.create_partition(
                                vec![PartitionValue::Integer(t * 100 + i)],
                                format!("/warehouse/events/day={}", t * 100 + i),
                                FileFormat::Text,
                                Vec::new(),
                            )
                        })
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let table = catalog.get_table("db", "events").unwrap();
    assert_eq!(table.num_partitions(), 80);
    assert_eq!(table.columns()[0].stats.num_distinct_values, 80);
}
