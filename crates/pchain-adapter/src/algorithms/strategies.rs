//! # Variant Strategy Table
//!
//! One registration per transaction variant: which operation tag it maps to,
//! which earlier transactions it references, which operation group follows
//! the base inputs/outputs, which transaction-level metadata it exposes, and
//! how (if at all) it is built from operations.

use pchain_types::{TxKind, UnsignedTx};

use super::dependencies::{
    base_input_dependencies, no_dependencies, reward_dependencies, DependencySet,
};
use super::tx_builder;
use super::tx_parser::{self, OperationWriter};
use crate::domain::{
    AdapterError, BuiltTransaction, ConstructionMetadata, FormatProfile, MatchedOperations,
    Metadata, OperationType,
};

pub type DependencyFn = fn(&UnsignedTx, &mut DependencySet);
pub type ParseGroupFn = fn(&UnsignedTx, &mut OperationWriter<'_>) -> Result<(), AdapterError>;
pub type TxMetadataFn = fn(&UnsignedTx, &FormatProfile, &mut Metadata) -> Result<(), AdapterError>;
pub type BuildFn =
    fn(&MatchedOperations, &ConstructionMetadata) -> Result<BuiltTransaction, AdapterError>;

/// Per-variant rules.
pub struct TxStrategy {
    pub kind: TxKind,
    pub op_type: OperationType,
    pub dependencies: DependencyFn,
    pub parse_group: ParseGroupFn,
    pub tx_metadata: TxMetadataFn,
    /// `None` for variants that cannot be constructed.
    pub build: Option<BuildFn>,
}

pub static STRATEGIES: [TxStrategy; 10] = [
    TxStrategy {
        kind: TxKind::Base,
        op_type: OperationType::Base,
        dependencies: base_input_dependencies,
        parse_group: tx_parser::no_group,
        tx_metadata: tx_parser::no_tx_metadata,
        build: Some(tx_builder::build_base),
    },
    TxStrategy {
        kind: TxKind::Import,
        op_type: OperationType::ImportAvax,
        dependencies: base_input_dependencies,
        parse_group: tx_parser::imported_inputs,
        tx_metadata: tx_parser::import_metadata,
        build: Some(tx_builder::build_import),
    },
    TxStrategy {
        kind: TxKind::Export,
        op_type: OperationType::ExportAvax,
        dependencies: base_input_dependencies,
        parse_group: tx_parser::exported_outputs,
        tx_metadata: tx_parser::export_metadata,
        build: Some(tx_builder::build_export),
    },
    TxStrategy {
        kind: TxKind::AddValidator,
        op_type: OperationType::AddValidator,
        dependencies: base_input_dependencies,
        parse_group: tx_parser::stake_outputs,
        tx_metadata: tx_parser::staking_metadata,
        build: Some(tx_builder::build_add_validator),
    },
    TxStrategy {
        kind: TxKind::AddDelegator,
        op_type: OperationType::AddDelegator,
        dependencies: base_input_dependencies,
        parse_group: tx_parser::stake_outputs,
        tx_metadata: tx_parser::staking_metadata,
        build: Some(tx_builder::build_add_delegator),
    },
    TxStrategy {
        kind: TxKind::AddSubnetValidator,
        op_type: OperationType::AddSubnetValidator,
        dependencies: base_input_dependencies,
        parse_group: tx_parser::subnet_validator_summary,
        tx_metadata: tx_parser::no_tx_metadata,
        build: None,
    },
    TxStrategy {
        kind: TxKind::CreateChain,
        op_type: OperationType::CreateChain,
        dependencies: base_input_dependencies,
        parse_group: tx_parser::create_chain_summary,
        tx_metadata: tx_parser::no_tx_metadata,
        build: None,
    },
    TxStrategy {
        kind: TxKind::CreateSubnet,
        op_type: OperationType::CreateSubnet,
        dependencies: base_input_dependencies,
        parse_group: tx_parser::create_subnet_summary,
        tx_metadata: tx_parser::no_tx_metadata,
        build: None,
    },
    TxStrategy {
        kind: TxKind::AdvanceTime,
        op_type: OperationType::AdvanceTime,
        dependencies: no_dependencies,
        parse_group: tx_parser::advance_time_summary,
        tx_metadata: tx_parser::no_tx_metadata,
        build: None,
    },
    TxStrategy {
        kind: TxKind::RewardValidator,
        op_type: OperationType::RewardValidator,
        dependencies: reward_dependencies,
        parse_group: tx_parser::reward_summary,
        tx_metadata: tx_parser::no_tx_metadata,
        build: None,
    },
];

/// Table slot of `kind`; exhaustive so a new variant needs a registration.
const fn slot(kind: TxKind) -> usize {
    match kind {
        TxKind::Base => 0,
        TxKind::Import => 1,
        TxKind::Export => 2,
        TxKind::AddValidator => 3,
        TxKind::AddDelegator => 4,
        TxKind::AddSubnetValidator => 5,
        TxKind::CreateChain => 6,
        TxKind::CreateSubnet => 7,
        TxKind::AdvanceTime => 8,
        TxKind::RewardValidator => 9,
    }
}

pub fn strategy_for_kind(kind: TxKind) -> &'static TxStrategy {
    &STRATEGIES[slot(kind)]
}

pub fn strategy_for_type(op_type: OperationType) -> &'static TxStrategy {
    strategy_for_kind(op_type.tx_kind())
}
