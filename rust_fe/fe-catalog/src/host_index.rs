// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Dense numbering of network addresses

use fe_common::NetworkAddress;
use std::collections::HashMap;

/// Bijection between network addresses and dense indices.
///
/// Block replicas store host indices instead of addresses; one index exists
/// per table and another per query for scan range locations.
#[derive(Debug, Clone, Default)]
pub struct HostIndex {
    addresses: Vec<NetworkAddress>,
    indices: HashMap<NetworkAddress, usize>,
}

impl HostIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the address, assigning the next free index on first sight
    pub fn index_of(&mut self, address: &NetworkAddress) -> usize {
        if let Some(idx) = self.indices.get(address) {
            return *idx;
        }
        let idx = self.addresses.len();
        self.addresses.push(address.clone());
        self.indices.insert(address.clone(), idx);
        idx
    }

    /// Index of the address without inserting
    pub fn get(&self, address: &NetworkAddress) -> Option<usize> {
        self.indices.get(address).copied()
    }

    pub fn entry(&self, idx: usize) -> Option<&NetworkAddress> {
        self.addresses.get(idx)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn addresses(&self) -> &[NetworkAddress] {
        &self.addresses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_stable() {
        let mut index = HostIndex::new();
        let a = NetworkAddress::new("h1", 9000);
        let b = NetworkAddress::new("h2", 9000);
        assert_eq!(index.index_of(&a), 0);
        assert_eq!(index.index_of(&b), 1);
        assert_eq!(index.index_of(&a), 0);
        assert_eq!(index.len(), 2);
        assert_eq!(index.entry(1), Some(&b));
        assert_eq!(index.entry(2), None);
        assert_eq!(index.get(&NetworkAddress::new("h3", 9000)), None);
    }
}
