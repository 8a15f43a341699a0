//! # Domain Entities
//!
//! Decoded blocks, the operation model and the construction records that
//! cross the adapter's inbound port.

use std::collections::HashMap;

use pchain_types::{
    AssetId, BlockId, BlockKind, ChainId, NodeId, OutputOwners, SealedTx, TxId, UnsignedTx,
    Utxo, UtxoId,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::value_objects::OperationType;

/// Free-form operation or transaction metadata.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Dependencies of a batch, keyed by tx id.
pub type DependencyMap = HashMap<TxId, DependencyTx>;

// =============================================================================
// BLOCKS
// =============================================================================

/// Consensus-envelope fields recovered while unwrapping a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeInfo {
    pub parent_id: BlockId,
    /// Unix seconds; option envelopes carry none.
    pub timestamp: Option<u64>,
    pub proposer: Option<NodeId>,
}

/// A fully decoded payload block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBlock {
    /// SHA-256 of the payload bytes.
    pub block_id: BlockId,
    pub parent_id: BlockId,
    pub height: u64,
    /// Resolved time, unix seconds.
    pub timestamp: u64,
    pub kind: BlockKind,
    pub txs: Vec<SealedTx>,
    pub envelope: Option<EnvelopeInfo>,
}

impl ParsedBlock {
    pub fn proposer(&self) -> Option<NodeId> {
        self.envelope.as_ref().and_then(|e| e.proposer)
    }
}

/// Synthetic block zero built from the genesis configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisBlock {
    /// Parent of block 1 as reported by the node.
    pub block_id: BlockId,
    pub network_id: u32,
    /// Native asset of the network.
    pub asset_id: AssetId,
    /// Unix seconds.
    pub timestamp: u64,
    pub initial_supply: u64,
    /// Validators followed by chains.
    pub txs: Vec<SealedTx>,
}

impl GenesisBlock {
    /// Block zero as returned by height lookups.
    pub fn to_parsed_block(&self) -> ParsedBlock {
        ParsedBlock {
            block_id: self.block_id,
            parent_id: BlockId::EMPTY,
            height: 0,
            timestamp: self.timestamp,
            kind: BlockKind::ApricotCommit,
            txs: self.txs.clone(),
            envelope: None,
        }
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinAction {
    CoinSpent,
    CoinCreated,
}

/// A UTXO consumed or produced by an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoinChange {
    /// `<tx id>:<output index>`.
    pub coin_identifier: String,
    pub coin_action: CoinAction,
}

impl CoinChange {
    pub fn spent(utxo_id: &UtxoId) -> Self {
        Self {
            coin_identifier: utxo_id.to_string(),
            coin_action: CoinAction::CoinSpent,
        }
    }

    pub fn created(utxo_id: &UtxoId) -> Self {
        Self {
            coin_identifier: utxo_id.to_string(),
            coin_action: CoinAction::CoinCreated,
        }
    }
}

/// One unit of value movement in the standardized representation.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Position within the transaction's run, from 0.
    pub index: usize,
    /// Transaction type tag (see [`OperationType`]).
    #[serde(rename = "type")]
    pub op_type: String,
    /// Negative when spent, positive when created, absent for synthetic operations.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i128>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin_change: Option<CoinChange>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Operation {
    pub fn new(index: usize, op_type: OperationType) -> Self {
        Self {
            index,
            op_type: op_type.as_str().to_string(),
            amount: None,
            account: None,
            coin_change: None,
            metadata: Metadata::new(),
        }
    }
}

/// One transaction in operation form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub tx_id: TxId,
    pub operations: Vec<Operation>,
    /// Validator parameters, chain ids, memo.
    pub metadata: Metadata,
}

/// A previously issued transaction and any reward UTXOs it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTx {
    pub tx: SealedTx,
    pub reward_utxos: Vec<Utxo>,
}

impl DependencyTx {
    /// Owner set of one of this transaction's outputs.
    ///
    /// Produced UTXOs are numbered base outputs first, then stake outputs;
    /// reward UTXOs carry their own ids.
    pub fn utxo_owners(&self, utxo_id: &UtxoId) -> Option<&OutputOwners> {
        if let Some(utxo) = self.reward_utxos.iter().find(|u| u.utxo_id == *utxo_id) {
            return Some(utxo.output.owners());
        }
        if utxo_id.tx_id != self.tx.id {
            return None;
        }
        let unsigned = self.tx.unsigned();
        let base = unsigned.base()?;
        let stake: &[_] = match unsigned {
            UnsignedTx::AddValidator(tx) => &tx.stake,
            UnsignedTx::AddDelegator(tx) => &tx.stake,
            _ => &[],
        };
        base.outputs
            .iter()
            .chain(stake.iter())
            .nth(utxo_id.output_index as usize)
            .map(|output| output.output.owners())
    }
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

/// Operations split by sign, as required by the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedOperations {
    pub op_type: OperationType,
    /// Negative-amount operations, in request order.
    pub spends: Vec<Operation>,
    /// Positive-amount operations, in request order.
    pub creates: Vec<Operation>,
}

/// Account expected to sign one input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignerAccount {
    pub coin_identifier: String,
    pub address: String,
}

/// Staking parameters for validator and delegator transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingMetadata {
    pub node_id: NodeId,
    pub start_time: u64,
    pub end_time: u64,
    /// Delegation fee in millionths; validators only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<u32>,
    pub reward_addresses: Vec<String>,
    #[serde(default = "default_threshold")]
    pub reward_threshold: u32,
    #[serde(default)]
    pub reward_locktime: u64,
}

fn default_threshold() -> u32 {
    1
}

/// What a client asks for before building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionOptions {
    pub op_type: OperationType,
    /// Chain alias the import pulls from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_chain: Option<String>,
    /// Chain alias the export sends to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_chain: Option<String>,
    /// Hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staking: Option<StakingMetadata>,
}

impl ConstructionOptions {
    pub fn new(op_type: OperationType) -> Self {
        Self {
            op_type,
            source_chain: None,
            destination_chain: None,
            memo: None,
            staking: None,
        }
    }
}

/// Side-channel values the builder needs, resolved against the live node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionMetadata {
    pub network_id: u32,
    pub blockchain_id: ChainId,
    pub asset_id: AssetId,
    /// Hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_chain_id: Option<ChainId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_chain_id: Option<ChainId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staking: Option<StakingMetadata>,
}

/// Output of the build direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTransaction {
    pub tx: UnsignedTx,
    /// One per signed input, in credential order.
    pub signers: Vec<SignerAccount>,
}

impl BuiltTransaction {
    pub fn unsigned_bytes(&self) -> Result<Vec<u8>, pchain_types::CodecError> {
        self.tx.to_bytes()
    }
}
