// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Error types for the planning frontend

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeError {
    /// Planning invariant violated. Indicates a bug upstream of the failing
    /// component, never a user error.
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Analysis error: {0}")]
    AnalysisError(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Table loading error: {0}")]
    TableLoadingError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl FeError {
    /// True for errors that signal a planner bug rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, FeError::InternalError(_))
    }
}

pub type Result<T> = std::result::Result<T, FeError>;

/// Returns `FeError::InternalError` from the enclosing function when the
/// condition does not hold.
#[macro_export]
macro_rules! check_state {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::FeError::InternalError(format!($($arg)+)));
        }
    };
}
