//! # Outbound Ports
//!
//! What the adapter needs from the outside: one trusted platform-chain node
//! and a source of genesis bytes.

use async_trait::async_trait;
use pchain_types::{AssetId, BlockId, ChainId, TxId};

use crate::domain::AdapterError;

/// Node connection - outbound port.
///
/// Every method is a single remote call. Failures surface as
/// [`AdapterError::Client`]; the adapter never retries.
#[async_trait]
pub trait PChainClient: Send + Sync {
    /// Raw container (block bytes, possibly wrapped) at `height`.
    async fn get_container_by_index(&self, height: u64) -> Result<Vec<u8>, AdapterError>;

    /// Raw container with id `block_id`.
    async fn get_container_by_id(&self, block_id: &BlockId) -> Result<Vec<u8>, AdapterError>;

    /// Height of the last accepted block.
    async fn get_height(&self) -> Result<u64, AdapterError>;

    /// Signed transaction bytes of `tx_id`.
    async fn get_tx(&self, tx_id: &TxId) -> Result<Vec<u8>, AdapterError>;

    /// Encoded reward UTXOs produced when the staking period of `tx_id` ended.
    async fn get_reward_utxos(&self, tx_id: &TxId) -> Result<Vec<Vec<u8>>, AdapterError>;

    async fn get_network_id(&self) -> Result<u32, AdapterError>;

    /// Chain id registered under `alias` (`X`, `C`, ...).
    async fn get_blockchain_id(&self, alias: &str) -> Result<ChainId, AdapterError>;
}

/// Genesis bytes for one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisConfig {
    /// Encoded platform genesis record.
    pub bytes: Vec<u8>,
    /// Native asset, fixed per network.
    pub asset_id: AssetId,
}

/// Genesis source - outbound port.
#[async_trait]
pub trait GenesisSource: Send + Sync {
    async fn genesis(&self, network_id: u32) -> Result<GenesisConfig, AdapterError>;
}
