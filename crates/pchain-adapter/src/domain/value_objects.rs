//! # Domain Value Objects
//!
//! Operation type tags, sub-roles and the metadata keys shared by the parse
//! and build directions.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use pchain_types::{format_address, hrp_for_network, AddressId, ChainId, TxKind, P_CHAIN_ALIAS};
use serde::{Deserialize, Serialize};

use super::errors::AdapterError;

/// Operation type tag. Every operation of one transaction carries the
/// transaction's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Base,
    ImportAvax,
    ExportAvax,
    AddValidator,
    AddDelegator,
    AddSubnetValidator,
    CreateChain,
    CreateSubnet,
    AdvanceTime,
    RewardValidator,
}

impl OperationType {
    pub const ALL: [OperationType; 10] = [
        Self::Base,
        Self::ImportAvax,
        Self::ExportAvax,
        Self::AddValidator,
        Self::AddDelegator,
        Self::AddSubnetValidator,
        Self::CreateChain,
        Self::CreateSubnet,
        Self::AdvanceTime,
        Self::RewardValidator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "BASE",
            Self::ImportAvax => "IMPORT_AVAX",
            Self::ExportAvax => "EXPORT_AVAX",
            Self::AddValidator => "ADD_VALIDATOR",
            Self::AddDelegator => "ADD_DELEGATOR",
            Self::AddSubnetValidator => "ADD_SUBNET_VALIDATOR",
            Self::CreateChain => "CREATE_CHAIN",
            Self::CreateSubnet => "CREATE_SUBNET",
            Self::AdvanceTime => "ADVANCE_TIME",
            Self::RewardValidator => "REWARD_VALIDATOR",
        }
    }

    pub fn tx_kind(&self) -> TxKind {
        match self {
            Self::Base => TxKind::Base,
            Self::ImportAvax => TxKind::Import,
            Self::ExportAvax => TxKind::Export,
            Self::AddValidator => TxKind::AddValidator,
            Self::AddDelegator => TxKind::AddDelegator,
            Self::AddSubnetValidator => TxKind::AddSubnetValidator,
            Self::CreateChain => TxKind::CreateChain,
            Self::CreateSubnet => TxKind::CreateSubnet,
            Self::AdvanceTime => TxKind::AdvanceTime,
            Self::RewardValidator => TxKind::RewardValidator,
        }
    }

    pub fn from_tx_kind(kind: TxKind) -> Self {
        match kind {
            TxKind::Base => Self::Base,
            TxKind::Import => Self::ImportAvax,
            TxKind::Export => Self::ExportAvax,
            TxKind::AddValidator => Self::AddValidator,
            TxKind::AddDelegator => Self::AddDelegator,
            TxKind::AddSubnetValidator => Self::AddSubnetValidator,
            TxKind::CreateChain => Self::CreateChain,
            TxKind::CreateSubnet => Self::CreateSubnet,
            TxKind::AdvanceTime => Self::AdvanceTime,
            TxKind::RewardValidator => Self::RewardValidator,
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AdapterError::UnsupportedOperation(s.to_string()))
    }
}

/// Role of one operation within its transaction, carried in metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubRole {
    Input,
    Output,
    Stake,
    Import,
    Export,
}

impl SubRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "INPUT",
            Self::Output => "OUTPUT",
            Self::Stake => "STAKE",
            Self::Import => "IMPORT",
            Self::Export => "EXPORT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INPUT" => Some(Self::Input),
            "OUTPUT" => Some(Self::Output),
            "STAKE" => Some(Self::Stake),
            "IMPORT" => Some(Self::Import),
            "EXPORT" => Some(Self::Export),
            _ => None,
        }
    }
}

impl fmt::Display for SubRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chain id to alias table used when rendering addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainAliases {
    by_id: HashMap<ChainId, String>,
}

impl ChainAliases {
    /// Only the platform chain (empty id, alias `P`).
    pub fn platform_only() -> Self {
        let mut by_id = HashMap::new();
        by_id.insert(ChainId::EMPTY, P_CHAIN_ALIAS.to_string());
        Self { by_id }
    }

    pub fn with_chain(mut self, chain_id: ChainId, alias: impl Into<String>) -> Self {
        self.by_id.insert(chain_id, alias.into());
        self
    }

    /// Alias of `chain_id`, or its CB58 text when unknown.
    pub fn alias_for(&self, chain_id: &ChainId) -> String {
        self.by_id
            .get(chain_id)
            .cloned()
            .unwrap_or_else(|| chain_id.to_string())
    }
}

/// Network prefix plus alias table: everything needed to render addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatProfile {
    pub network_id: u32,
    pub hrp: String,
    pub aliases: ChainAliases,
}

impl FormatProfile {
    pub fn new(network_id: u32, aliases: ChainAliases) -> Self {
        Self {
            network_id,
            hrp: hrp_for_network(network_id).to_string(),
            aliases,
        }
    }

    /// Render `address` as seen from `chain_id`.
    pub fn address(&self, chain_id: &ChainId, address: &AddressId) -> Result<String, AdapterError> {
        Ok(format_address(
            &self.aliases.alias_for(chain_id),
            &self.hrp,
            address,
        )?)
    }
}

/// Operation and transaction metadata keys.
pub mod keys {
    pub const TYPE: &str = "type";
    pub const SIG_INDICES: &str = "sig_indices";
    pub const THRESHOLD: &str = "threshold";
    pub const LOCKTIME: &str = "locktime";
    pub const ADDRESSES: &str = "addresses";
    pub const STAKEABLE_LOCKTIME: &str = "stakeable_locktime";

    pub const STAKING_TX_ID: &str = "staking_tx_id";
    pub const REWARD_OUTPUTS: &str = "reward_outputs";
    pub const TIMESTAMP: &str = "timestamp";
    pub const SUBNET_ID: &str = "subnet_id";
    pub const CHAIN_NAME: &str = "chain_name";
    pub const VM_ID: &str = "vm_id";
    pub const FX_IDS: &str = "fx_ids";
    pub const OWNER: &str = "owner";

    pub const NODE_ID: &str = "node_id";
    pub const START_TIME: &str = "start_time";
    pub const END_TIME: &str = "end_time";
    pub const WEIGHT: &str = "weight";
    pub const SHARES: &str = "shares";
    pub const REWARD_ADDRESSES: &str = "reward_addresses";
    pub const REWARD_THRESHOLD: &str = "reward_threshold";
    pub const REWARD_LOCKTIME: &str = "reward_locktime";

    pub const NETWORK_ID: &str = "network_id";
    pub const BLOCKCHAIN_ID: &str = "blockchain_id";
    pub const SOURCE_CHAIN_ID: &str = "source_chain_id";
    pub const DESTINATION_CHAIN_ID: &str = "destination_chain_id";
    pub const MEMO: &str = "memo";

    pub const COIN_IDENTIFIER: &str = "coin_identifier";
    pub const AMOUNT: &str = "amount";
    pub const ACCOUNT: &str = "account";
}
