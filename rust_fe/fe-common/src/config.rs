// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Configuration management for the planning frontend

use crate::constants::{DEFAULT_NULL_COLUMN_VALUE, DEFAULT_NULL_PARTITION_KEY_VALUE};
use crate::error::FeError;
use crate::utils::parse_size;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upper bound of a single scan range ("128MB", "0" = unlimited)
    pub max_scan_range_length: String,

    /// Directory-name value standing for a NULL partition key
    pub null_partition_key_value: String,

    /// Text-file value standing for a NULL column value
    pub null_column_value: String,

    /// Number of nodes a query may use (0 = all cluster nodes)
    pub num_nodes: usize,

    /// Scanner threads per scan node (0 = derive from cores)
    pub num_scanner_threads: usize,

    /// Cores per worker host
    pub num_cores: usize,

    /// Hostnames of the cluster's worker nodes
    pub cluster_hostnames: Vec<String>,

    /// IP addresses of the cluster's worker nodes
    pub cluster_ip_addresses: Vec<String>,

    /// Explain verbosity (minimal, standard, extended, verbose)
    pub explain_level: String,

    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_scan_range_length: "0".to_string(),
            null_partition_key_value: DEFAULT_NULL_PARTITION_KEY_VALUE.to_string(),
            null_column_value: DEFAULT_NULL_COLUMN_VALUE.to_string(),
            num_nodes: 0,
            num_scanner_threads: 0,
            num_cores: num_cpus::get(),
            cluster_hostnames: Vec::new(),
            cluster_ip_addresses: Vec::new(),
            explain_level: "standard".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| FeError::ConfigError(e.to_string()))?;
        Ok(config)
    }

    /// Override selected settings from `FE_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Ok(len) = std::env::var("FE_MAX_SCAN_RANGE_LENGTH") {
            self.max_scan_range_length = len;
        }

        if let Ok(level) = std::env::var("FE_LOG_LEVEL") {
            self.log_level = level;
        }

        if let Ok(nodes) = std::env::var("FE_NUM_NODES") {
            if let Ok(num_nodes) = nodes.parse::<usize>() {
                self.num_nodes = num_nodes;
            }
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.max_scan_range_length_bytes()?;
        if self.null_partition_key_value.is_empty() {
            return Err(FeError::ConfigError(
                "null_partition_key_value cannot be empty".to_string(),
            ));
        }
        if self.num_cores == 0 {
            return Err(FeError::ConfigError("num_cores cannot be 0".to_string()));
        }
        Ok(())
    }

    pub fn max_scan_range_length_bytes(&self) -> crate::Result<u64> {
        parse_size(&self.max_scan_range_length).map_err(|e| {
            FeError::ConfigError(format!(
                "invalid max_scan_range_length '{}': {}",
                self.max_scan_range_length, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.null_partition_key_value, "__HIVE_DEFAULT_PARTITION__");
        assert_eq!(config.max_scan_range_length_bytes().unwrap(), 0);
        assert!(config.num_cores > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            max_scan_range_length = "128MB"
            cluster_hostnames = ["host1", "host2"]
            explain_level = "verbose"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_scan_range_length_bytes().unwrap(), 128 * 1024 * 1024);
        assert_eq!(config.cluster_hostnames.len(), 2);
        assert_eq!(config.explain_level, "verbose");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_invalid_scan_range_length() {
        let config = Config {
            max_scan_range_length: "12XB".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(FeError::ConfigError(_))));
    }
}
