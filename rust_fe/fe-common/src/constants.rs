// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Constants used throughout the frontend

/// Directory-name value of a NULL partition key
pub const DEFAULT_NULL_PARTITION_KEY_VALUE: &str = "__HIVE_DEFAULT_PARTITION__";

/// Text-file value of a NULL column
pub const DEFAULT_NULL_COLUMN_VALUE: &str = "\\N";

/// Id of the per-table default partition (schema and format only)
pub const DEFAULT_PARTITION_ID: i64 = 0;

/// Invalid ID
pub const INVALID_ID: i64 = -1;

/// Size of one I/O manager read buffer
pub const IO_MGR_BUFFER_SIZE: i64 = 8 * 1024 * 1024;

/// Upper bound of I/O buffers a single scanner thread keeps in flight
pub const MAX_IO_BUFFERS_PER_THREAD: i64 = 10;

/// Scanner threads started per core
pub const THREADS_PER_CORE: i64 = 3;

/// Fudge factor for uneven scan range distribution across hosts
pub const SCAN_RANGE_SKEW_FACTOR: f64 = 1.2;

/// Partition count assumed by table sinks when unknown
pub const DEFAULT_NUM_PARTITIONS: i64 = 10;

/// Per-partition write buffer of a Parquet table sink
pub const PARQUET_SINK_MEM_PER_PARTITION: i64 = 1024 * 1024 * 1024;

/// Per-partition write buffer of a text table sink
pub const TEXT_SINK_MEM_PER_PARTITION: i64 = 100 * 1024;
