//! Shared fixtures for the adapter integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use pchain_adapter::{
    AdapterConfig, CoinChange, ConstructionMetadata, GenesisConfig, InMemoryNode, Operation,
    OperationType, PChainAdapterApi, PChainAdapterService, StaticGenesisSource, SubRole,
};
use pchain_types::{
    format_address, AddressId, AssetId, BaseTx, Block, BlockId, ChainId, CommonBlock, Input,
    Output, OutputOwners, PlatformGenesis, TransferInput, TransferOutput, TransferableInput,
    TransferableOutput, Tx, TxId, UnsignedTx, UtxoId,
};
use serde_json::json;

pub const NETWORK_ID: u32 = 5;
pub const GENESIS_TIME: u64 = 1_600_000_000;
pub const ASSET: AssetId = AssetId::new([0x11; 32]);
pub const X_CHAIN: ChainId = ChainId::new([0x22; 32]);
pub const C_CHAIN: ChainId = ChainId::new([0x33; 32]);
pub const GENESIS_ID: BlockId = BlockId::new([0x77; 32]);

pub type TestService = PChainAdapterService<InMemoryNode, StaticGenesisSource>;

/// Test subscriber; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("pchain_adapter=debug")
        .with_test_writer()
        .try_init();
}

pub fn address(byte: u8) -> AddressId {
    AddressId::new([byte; 20])
}

/// `P-fuji1...` text of `address(byte)`.
pub fn p_address(byte: u8) -> String {
    format_address("P", "fuji", &address(byte)).expect("valid address")
}

pub fn transfer_output(amount: u64, owner: u8) -> TransferableOutput {
    TransferableOutput {
        asset_id: ASSET,
        output: Output::Transfer(TransferOutput {
            amount,
            owners: OutputOwners::single(address(owner)),
        }),
    }
}

pub fn transfer_input(tx_id: TxId, index: u32, amount: u64) -> TransferableInput {
    TransferableInput {
        utxo_id: UtxoId::new(tx_id, index),
        asset_id: ASSET,
        input: Input::Transfer(TransferInput {
            amount,
            sig_indices: vec![0],
        }),
    }
}

pub fn base_body(outputs: Vec<TransferableOutput>, inputs: Vec<TransferableInput>) -> BaseTx {
    BaseTx {
        network_id: NETWORK_ID,
        blockchain_id: ChainId::EMPTY,
        outputs,
        inputs,
        memo: Vec::new(),
    }
}

/// A confirmed base tx paying `amount` to `owner` at output 0.
pub fn funding_tx(amount: u64, owner: u8) -> Tx {
    Tx::new(UnsignedTx::Base(base_body(
        vec![transfer_output(amount, owner)],
        vec![transfer_input(TxId::new([0xf0; 32]), 0, amount + 1)],
    )))
}

pub fn genesis_bytes() -> Vec<u8> {
    PlatformGenesis {
        utxos: Vec::new(),
        validators: vec![funding_tx(1, 9)],
        chains: Vec::new(),
        timestamp: GENESIS_TIME,
        initial_supply: 720_000_000,
        message: "genesis".into(),
    }
    .to_bytes()
    .expect("genesis encodes")
}

pub fn block_bytes(height: u64, parent_id: BlockId, txs: Vec<Tx>) -> Vec<u8> {
    Block::ApricotStandard {
        common: CommonBlock { parent_id, height },
        txs,
    }
    .to_bytes()
    .expect("block encodes")
}

/// Node with X/C chains and block 1 pointing at `GENESIS_ID`.
pub fn node() -> InMemoryNode {
    let node = InMemoryNode::new(NETWORK_ID)
        .with_chain("X", X_CHAIN)
        .with_chain("C", C_CHAIN);
    node.insert_container(1, block_bytes(1, GENESIS_ID, Vec::new()));
    node
}

pub fn genesis_source() -> StaticGenesisSource {
    StaticGenesisSource::new().with_network(
        NETWORK_ID,
        GenesisConfig {
            bytes: genesis_bytes(),
            asset_id: ASSET,
        },
    )
}

pub fn service_with(node: Arc<InMemoryNode>) -> TestService {
    PChainAdapterService::new(AdapterConfig::for_testing(), node, genesis_source())
}

pub async fn initialized_service(node: Arc<InMemoryNode>) -> TestService {
    init_tracing();
    let service = service_with(node);
    service.initialize().await.expect("initialize");
    service
}

pub fn metadata() -> ConstructionMetadata {
    ConstructionMetadata {
        network_id: NETWORK_ID,
        blockchain_id: ChainId::EMPTY,
        asset_id: ASSET,
        memo: None,
        source_chain_id: None,
        destination_chain_id: None,
        staking: None,
    }
}

// =============================================================================
// OPERATION BUILDERS
// =============================================================================

pub fn spend_op(
    index: usize,
    op_type: OperationType,
    utxo_id: UtxoId,
    amount: u64,
    owner: u8,
) -> Operation {
    let mut op = Operation::new(index, op_type);
    op.amount = Some(-i128::from(amount));
    op.account = Some(p_address(owner));
    op.coin_change = Some(CoinChange::spent(&utxo_id));
    op
}

pub fn create_op(
    index: usize,
    op_type: OperationType,
    role: SubRole,
    amount: u64,
    owner: u8,
) -> Operation {
    let mut op = Operation::new(index, op_type);
    op.amount = Some(i128::from(amount));
    op.account = Some(p_address(owner));
    op.metadata.insert("type".into(), json!(role.as_str()));
    op
}

pub fn with_role(mut op: Operation, role: SubRole) -> Operation {
    op.metadata.insert("type".into(), json!(role.as_str()));
    op
}
