// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Common type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Integer-backed identifier with an invalid sentinel.
pub trait Id: Copy + Eq + Ord + fmt::Debug {
    fn from_int(value: i64) -> Self;
    fn as_int(&self) -> i64;

    fn invalid() -> Self {
        Self::from_int(crate::constants::INVALID_ID)
    }

    fn is_valid(&self) -> bool {
        self.as_int() >= 0
    }
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub fn as_usize(&self) -> usize {
                self.0 as usize
            }
        }

        impl Id for $name {
            fn from_int(value: i64) -> Self {
                Self(value)
            }

            fn as_int(&self) -> i64 {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                <Self as Id>::invalid()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:02}", self.0)
            }
        }
    };
}

define_id!(
    /// Partition ID, unique within one table instance
    PartitionId
);
define_id!(
    /// Plan node ID, unique within one planning session
    PlanNodeId
);
define_id!(
    /// Plan fragment ID, unique within one planning session
    FragmentId
);
define_id!(
    /// ID of an independently executable plan (a tree of fragments)
    PlanId
);
define_id!(
    /// ID of the group of plans feeding join builds into one recipient plan
    CohortId
);
define_id!(
    /// Slot of a join build side in the runtime join-table registry
    JoinTableId
);

/// Monotonically increasing allocator of typed ids.
///
/// Owned by whoever scopes the ids (a table, a planning session); not shared
/// across threads.
#[derive(Debug, Clone)]
pub struct IdGenerator<T: Id> {
    next_id: i64,
    _marker: PhantomData<T>,
}

impl<T: Id> IdGenerator<T> {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(first_id: i64) -> Self {
        Self {
            next_id: first_id,
            _marker: PhantomData,
        }
    }

    pub fn get_next_id(&mut self) -> T {
        let id = T::from_int(self.next_id);
        self.next_id += 1;
        id
    }

    /// Id that the next call to `get_next_id` will return
    pub fn peek_next_id(&self) -> T {
        T::from_int(self.next_id)
    }
}

impl<T: Id> Default for IdGenerator<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Column data type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal { precision: u8, scale: u8 },
    Timestamp,
    String,
    Varchar { len: u32 },
    Char { len: u32 },
    Binary,
    Array(Box<DataType>),
    Map { key: Box<DataType>, value: Box<DataType> },
    Struct { fields: Vec<(String, DataType)> },
}

impl DataType {
    pub fn is_complex(&self) -> bool {
        matches!(self, DataType::Array(_) | DataType::Map { .. } | DataType::Struct { .. })
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::TinyInt | DataType::SmallInt | DataType::Int | DataType::BigInt
        )
    }

    /// Whether a table may be partitioned by a column of this type
    pub fn supports_table_partitioning(&self) -> bool {
        !self.is_complex() && !matches!(self, DataType::Timestamp | DataType::Binary)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::TinyInt => write!(f, "TINYINT"),
            DataType::SmallInt => write!(f, "SMALLINT"),
            DataType::Int => write!(f, "INT"),
            DataType::BigInt => write!(f, "BIGINT"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Double => write!(f, "DOUBLE"),
            DataType::Decimal { precision, scale } => write!(f, "DECIMAL({},{})", precision, scale),
            DataType::Timestamp => write!(f, "TIMESTAMP"),
            DataType::String => write!(f, "STRING"),
            DataType::Varchar { len } => write!(f, "VARCHAR({})", len),
            DataType::Char { len } => write!(f, "CHAR({})", len),
            DataType::Binary => write!(f, "BINARY"),
            DataType::Array(item) => write!(f, "ARRAY<{}>", item),
            DataType::Map { key, value } => write!(f, "MAP<{},{}>", key, value),
            DataType::Struct { fields } => {
                write!(f, "STRUCT<")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", name, ty)?;
                }
                write!(f, ">")
            }
        }
    }
}

/// Storage format of a partition's data files
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FileFormat {
    Text,
    LzoText,
    RcFile,
    SequenceFile,
    Avro,
    Parquet,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileFormat::Text => "TEXT",
            FileFormat::LzoText => "LZO_TEXT",
            FileFormat::RcFile => "RC_FILE",
            FileFormat::SequenceFile => "SEQUENCE_FILE",
            FileFormat::Avro => "AVRO",
            FileFormat::Parquet => "PARQUET",
        };
        write!(f, "{}", name)
    }
}

/// Compression codec of a data file, recognised by file-name suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compression {
    None,
    Deflate,
    Gzip,
    Bzip2,
    Snappy,
    Lzo,
    LzoIndex,
}

impl Compression {
    pub fn from_file_name(file_name: &str) -> Self {
        let suffix = match file_name.rfind('.') {
            Some(pos) => file_name[pos + 1..].to_lowercase(),
            None => return Compression::None,
        };
        match suffix.as_str() {
            "deflate" => Compression::Deflate,
            "gz" => Compression::Gzip,
            "bz2" => Compression::Bzip2,
            "snappy" => Compression::Snappy,
            "lzo" => Compression::Lzo,
            "index" => Compression::LzoIndex,
            _ => Compression::None,
        }
    }
}

/// Read/write capability the frontend has on a storage location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessLevel {
    None,
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessLevel {
    pub fn implies_write_access(&self) -> bool {
        matches!(self, AccessLevel::WriteOnly | AccessLevel::ReadWrite)
    }

    pub fn implies_read_access(&self) -> bool {
        matches!(self, AccessLevel::ReadOnly | AccessLevel::ReadWrite)
    }
}

/// Host and port of a worker or storage node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NetworkAddress {
    pub hostname: String,
    pub port: i32,
}

impl NetworkAddress {
    pub fn new(hostname: impl Into<String>, port: i32) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generator_is_monotonic() {
        let mut gen: IdGenerator<PlanId> = IdGenerator::new();
        assert_eq!(gen.get_next_id(), PlanId::new(0));
        assert_eq!(gen.get_next_id(), PlanId::new(1));
        assert_eq!(gen.peek_next_id(), PlanId::new(2));
        assert_eq!(gen.get_next_id(), PlanId::new(2));
    }

    #[test]
    fn test_independent_generators() {
        let mut plans: IdGenerator<PlanId> = IdGenerator::new();
        let mut cohorts: IdGenerator<CohortId> = IdGenerator::starting_at(5);
        plans.get_next_id();
        plans.get_next_id();
        assert_eq!(cohorts.get_next_id(), CohortId::new(5));
        assert_eq!(plans.get_next_id(), PlanId::new(2));
    }

    #[test]
    fn test_invalid_sentinel() {
        let id = JoinTableId::default();
        assert!(!id.is_valid());
        assert_eq!(id.as_int(), -1);
        assert!(JoinTableId::new(0).is_valid());
        assert_eq!(FragmentId::new(3).to_string(), "03");
    }

    #[test]
    fn test_compression_from_file_name() {
        assert_eq!(Compression::from_file_name("part-0001.gz"), Compression::Gzip);
        assert_eq!(Compression::from_file_name("data.SNAPPY"), Compression::Snappy);
        assert_eq!(Compression::from_file_name("data.lzo.index"), Compression::LzoIndex);
        assert_eq!(Compression::from_file_name("000000_0"), Compression::None);
        assert_eq!(Compression::from_file_name("data.parq"), Compression::None);
    }

    #[test]
    fn test_partitioning_support() {
        assert!(DataType::Int.supports_table_partitioning());
        assert!(DataType::String.supports_table_partitioning());
        assert!(!DataType::Timestamp.supports_table_partitioning());
        assert!(!DataType::Array(Box::new(DataType::Int)).supports_table_partitioning());
    }
}
