// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Common utilities and foundational types for the planning frontend
//!
//! This module provides:
//! - Error types and result handling
//! - Configuration management
//! - Typed identifiers and their generators
//! - Utility functions
//! - Constants

pub mod error;
pub mod config;
pub mod types;
pub mod utils;
pub mod constants;

pub use error::{FeError, Result};
pub use config::Config;
pub use types::{
    Id, IdGenerator, PartitionId, PlanNodeId, FragmentId, PlanId, CohortId,
    JoinTableId, DataType, FileFormat, Compression, AccessLevel, NetworkAddress,
};
