//! Static Genesis Source
//!
//! Implements `GenesisSource` over a fixed network table.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::AdapterError;
use crate::ports::{GenesisConfig, GenesisSource};

/// Genesis configurations keyed by network id.
#[derive(Debug, Default)]
pub struct StaticGenesisSource {
    networks: HashMap<u32, GenesisConfig>,
    calls: AtomicUsize,
}

impl StaticGenesisSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_network(mut self, network_id: u32, config: GenesisConfig) -> Self {
        self.networks.insert(network_id, config);
        self
    }

    /// Number of `genesis` lookups served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenesisSource for StaticGenesisSource {
    async fn genesis(&self, network_id: u32) -> Result<GenesisConfig, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.networks
            .get(&network_id)
            .cloned()
            .ok_or_else(|| AdapterError::client(format!("no genesis for network {}", network_id)))
    }
}
