//! # Inbound Ports
//!
//! API trait defining what the adapter offers to the API layer above it.

use async_trait::async_trait;
use pchain_types::{BlockId, SealedTx, Tx};

use crate::domain::{
    AdapterError, BuiltTransaction, ConstructionMetadata, ConstructionOptions, GenesisBlock,
    MatchedOperations, Operation, ParsedBlock, ParsedTransaction, SignerAccount,
};

/// Platform-chain adapter API - inbound port.
#[async_trait]
pub trait PChainAdapterApi: Send + Sync {
    /// Load genesis and the chain alias table. Idempotent; later calls return
    /// the cached genesis.
    async fn initialize(&self) -> Result<GenesisBlock, AdapterError>;

    /// Block at `height`; height 0 is the genesis block.
    async fn parse_block_at_index(&self, height: u64) -> Result<ParsedBlock, AdapterError>;

    async fn parse_block_with_hash(&self, block_id: &BlockId) -> Result<ParsedBlock, AdapterError>;

    async fn parse_latest_block(&self) -> Result<ParsedBlock, AdapterError>;

    /// Operations of one confirmed transaction, with input accounts resolved.
    async fn parse(&self, tx: &Tx) -> Result<Vec<Operation>, AdapterError>;

    /// Full read path for a batch sharing one dependency fetch.
    async fn parse_transactions(
        &self,
        txs: &[SealedTx],
    ) -> Result<Vec<ParsedTransaction>, AdapterError>;

    /// Operations of an unsigned transaction this adapter built.
    async fn parse_construction(
        &self,
        unsigned_bytes: &[u8],
        signers: &[SignerAccount],
    ) -> Result<Vec<Operation>, AdapterError>;

    fn match_operations(&self, operations: &[Operation])
        -> Result<MatchedOperations, AdapterError>;

    /// Side-channel metadata consulted from the node for `build_tx`.
    async fn construction_metadata(
        &self,
        options: &ConstructionOptions,
    ) -> Result<ConstructionMetadata, AdapterError>;

    /// Unsigned native transaction plus the accounts that must sign it.
    fn build_tx(
        &self,
        op_type: &str,
        matched: &MatchedOperations,
        metadata: &ConstructionMetadata,
    ) -> Result<BuiltTransaction, AdapterError>;

    /// Attach signatures, returning signed transaction bytes.
    fn combine(&self, unsigned_bytes: &[u8], signatures: &[Vec<u8>])
        -> Result<Vec<u8>, AdapterError>;

    /// Committed chain time (unix seconds).
    fn chain_time(&self) -> Result<u64, AdapterError>;
}
