//! # Adapter Configuration
//!
//! Configuration for the platform-chain adapter service.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Adapter configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Upper bound on dependency fetches in flight at once.
    pub max_concurrent_fetches: usize,

    /// Alias the node registers the exchange chain under.
    pub x_chain_alias: String,

    /// Alias the node registers the contract chain under.
    pub c_chain_alias: String,

    /// Deadline for one dependency fetch, in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 16,
            x_chain_alias: "X".to_string(),
            c_chain_alias: "C".to_string(),
            fetch_timeout_secs: 30,
        }
    }
}

impl AdapterConfig {
    /// Create a config for testing (small fan-out, short deadline).
    pub fn for_testing() -> Self {
        Self {
            max_concurrent_fetches: 4,
            fetch_timeout_secs: 5,
            ..Self::default()
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
