// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Cluster membership seen by the planner
//!
//! A snapshot is immutable once built. Updates atomically swap in a new
//! snapshot; readers take no lock and a planner holding an `Arc` to the old
//! one keeps a consistent view.

use arc_swap::ArcSwap;
use fe_common::{Config, NetworkAddress};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Worker hosts of the cluster, by hostname and by IP address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipSnapshot {
    hostnames: HashSet<String>,
    ip_addresses: HashSet<String>,

    /// Usually the number of hostnames; larger when several workers share a host
    num_nodes: usize,
}

impl Default for MembershipSnapshot {
    /// Before the first update, assume a single local node
    fn default() -> Self {
        Self {
            hostnames: HashSet::new(),
            ip_addresses: HashSet::new(),
            num_nodes: 1,
        }
    }
}

impl MembershipSnapshot {
    pub fn from_update(update: MembershipUpdate) -> Self {
        Self {
            hostnames: update.hostnames.into_iter().collect(),
            ip_addresses: update.ip_addresses.into_iter().collect(),
            num_nodes: update.num_nodes,
        }
    }

    /// Whether the address host, by name or IP, is a cluster member
    pub fn contains(&self, address: &NetworkAddress) -> bool {
        self.ip_addresses.contains(&address.hostname) || self.hostnames.contains(&address.hostname)
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn hostnames(&self) -> &HashSet<String> {
        &self.hostnames
    }

    pub fn ip_addresses(&self) -> &HashSet<String> {
        &self.ip_addresses
    }
}

/// New membership as published by the cluster state service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MembershipUpdate {
    #[serde(default)]
    pub hostnames: Vec<String>,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    pub num_nodes: usize,
}

impl MembershipUpdate {
    /// Membership listed in the configuration; `None` if it names no hosts
    pub fn from_config(config: &Config) -> Option<Self> {
        if config.cluster_hostnames.is_empty() && config.cluster_ip_addresses.is_empty() {
            return None;
        }
        let num_nodes = if config.num_nodes > 0 {
            config.num_nodes
        } else {
            config
                .cluster_hostnames
                .len()
                .max(config.cluster_ip_addresses.len())
        };
        Some(Self {
            hostnames: config.cluster_hostnames.clone(),
            ip_addresses: config.cluster_ip_addresses.clone(),
            num_nodes,
        })
    }
}

/// Holder of the current membership snapshot, shared by planners
#[derive(Debug)]
pub struct ClusterMembership {
    current: ArcSwap<MembershipSnapshot>,
}

impl Default for ClusterMembership {
    fn default() -> Self {
        Self {
            current: ArcSwap::from_pointee(MembershipSnapshot::default()),
        }
    }
}

impl ClusterMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot; later calls to `current` observe the new one
    pub fn update(&self, update: MembershipUpdate) {
        let snapshot = Arc::new(MembershipSnapshot::from_update(update));
        info!(
            num_nodes = snapshot.num_nodes(),
            num_hostnames = snapshot.hostnames().len(),
            "cluster membership updated"
        );
        self.current.store(snapshot);
    }

    /// Lock-free; never waits on a concurrent `update`
    pub fn current(&self) -> Arc<MembershipSnapshot> {
        self.current.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot() {
        let membership = ClusterMembership::new();
        let snapshot = membership.current();
        assert_eq!(snapshot.num_nodes(), 1);
        assert!(!snapshot.contains(&NetworkAddress::new("localhost", 22000)));
    }

    #[test]
    fn test_contains_by_name_or_ip() {
        let membership = ClusterMembership::new();
        membership.update(MembershipUpdate {
            hostnames: vec!["worker-1".to_string()],
            ip_addresses: vec!["10.0.0.2".to_string()],
            num_nodes: 2,
        });
        let snapshot = membership.current();
        assert!(snapshot.contains(&NetworkAddress::new("worker-1", 50010)));
        assert!(snapshot.contains(&NetworkAddress::new("10.0.0.2", 50010)));
        assert!(!snapshot.contains(&NetworkAddress::new("worker-3", 50010)));
        assert_eq!(snapshot.num_nodes(), 2);
    }

    #[test]
    fn test_held_snapshot_unaffected_by_update() {
        let membership = ClusterMembership::new();
        let before = membership.current();
        membership.update(MembershipUpdate {
            hostnames: vec!["a".to_string()],
            ip_addresses: Vec::new(),
            num_nodes: 1,
        });
        assert!(!before.contains(&NetworkAddress::new("a", 1)));
        assert!(membership.current().contains(&NetworkAddress::new("a", 1)));
    }

    #[test]
    fn test_update_from_config() {
        let config = Config {
            cluster_hostnames: vec!["h1".to_string(), "h2".to_string()],
            ..Default::default()
        };
        let update = MembershipUpdate::from_config(&config).unwrap();
        assert_eq!(update.num_nodes, 2);
        assert!(MembershipUpdate::from_config(&Config::default()).is_none());
    }
}
