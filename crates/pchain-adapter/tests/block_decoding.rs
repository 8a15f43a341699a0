//! Block decode, genesis bootstrap and chain-time threading through the service.

mod common;

use std::sync::Arc;

use common::*;
use pchain_adapter::algorithms::{decode_block, decode_payload, proposer_node_id};
use pchain_adapter::{AdapterError, PChainAdapterApi, ProposerEnvelope};
use pchain_types::{AdvanceTimeTx, BlockId, BlockKind, Tx, UnsignedTx};

fn payload() -> Vec<u8> {
    block_bytes(
        5,
        BlockId::new([4; 32]),
        vec![funding_tx(10, 1), funding_tx(20, 2)],
    )
}

#[test]
fn test_wrapped_and_bare_payload_agree() {
    let inner = payload();
    let certificate = vec![0x30, 0x82, 0x01, 0x0a];
    let signed = ProposerEnvelope::Signed {
        parent_id: BlockId::new([8; 32]),
        timestamp: GENESIS_TIME + 100,
        pchain_height: 3,
        certificate: certificate.clone(),
        inner: inner.clone(),
        signature: vec![9; 64],
    }
    .to_bytes()
    .unwrap();

    let bare = decode_block(&inner, GENESIS_TIME).unwrap();
    let wrapped = decode_block(&signed, GENESIS_TIME).unwrap();

    assert_eq!(bare.block_id, wrapped.block_id);
    assert_eq!(bare.block_id, BlockId::from_content(&inner));
    assert_eq!(bare.txs, wrapped.txs);
    assert_eq!(bare.parent_id, BlockId::new([4; 32]));
    assert_eq!(bare.height, 5);
    assert_eq!(bare.kind, BlockKind::ApricotStandard);

    assert_eq!(bare.timestamp, GENESIS_TIME);
    assert_eq!(wrapped.timestamp, GENESIS_TIME + 100);
    assert_eq!(bare.proposer(), None);
    assert_eq!(wrapped.proposer(), Some(proposer_node_id(&certificate)));
    assert_eq!(
        wrapped.envelope.as_ref().map(|e| e.parent_id),
        Some(BlockId::new([8; 32]))
    );
}

#[test]
fn test_option_envelope_has_no_time_or_proposer() {
    let inner = payload();
    let option = ProposerEnvelope::Option {
        parent_id: BlockId::new([8; 32]),
        inner: inner.clone(),
    }
    .to_bytes()
    .unwrap();
    let block = decode_block(&option, GENESIS_TIME).unwrap();
    assert_eq!(block.block_id, BlockId::from_content(&inner));
    assert_eq!(block.timestamp, GENESIS_TIME);
    assert_eq!(block.proposer(), None);
    assert!(block.envelope.is_some());
}

#[test]
fn test_unsigned_signed_envelope_has_no_proposer() {
    let signed = ProposerEnvelope::Signed {
        parent_id: BlockId::new([8; 32]),
        timestamp: GENESIS_TIME + 1,
        pchain_height: 0,
        certificate: Vec::new(),
        inner: payload(),
        signature: Vec::new(),
    }
    .to_bytes()
    .unwrap();
    let decoded = decode_payload(&signed).unwrap();
    assert_eq!(decoded.envelope.and_then(|e| e.proposer), None);
}

#[test]
fn test_truncated_payload_is_decode_error() {
    let mut bytes = payload();
    bytes.truncate(bytes.len() - 3);
    assert!(matches!(
        decode_block(&bytes, GENESIS_TIME),
        Err(AdapterError::Decode(_))
    ));
}

#[tokio::test]
async fn test_initialize_is_idempotent() {
    init_tracing();
    let node = Arc::new(node());
    let service = service_with(Arc::clone(&node));

    let (first, second) = tokio::join!(service.initialize(), service.initialize());
    let first = first.unwrap();
    assert_eq!(first, second.unwrap());
    assert_eq!(first, service.initialize().await.unwrap());
    // Block 1 is fetched once, by whichever initializer ran.
    assert_eq!(node.container_calls(), 1);

    assert_eq!(first.block_id, GENESIS_ID);
    assert_eq!(first.network_id, NETWORK_ID);
    assert_eq!(first.asset_id, ASSET);
    assert_eq!(first.timestamp, GENESIS_TIME);
    assert_eq!(first.txs.len(), 1);
    assert_eq!(service.chain_time().unwrap(), GENESIS_TIME);
}

#[tokio::test]
async fn test_height_zero_is_genesis() {
    let node = Arc::new(node());
    let service = initialized_service(Arc::clone(&node)).await;
    let calls = node.container_calls();

    let block = service.parse_block_at_index(0).await.unwrap();
    assert_eq!(block.block_id, GENESIS_ID);
    assert_eq!(block.height, 0);
    assert_eq!(block.timestamp, GENESIS_TIME);
    assert_eq!(block.txs.len(), 1);
    assert_eq!(node.container_calls(), calls);

    let by_hash = service.parse_block_with_hash(&GENESIS_ID).await.unwrap();
    assert_eq!(by_hash, block);
}

#[tokio::test]
async fn test_block_time_committed_after_decode() {
    let node = Arc::new(node());
    let advance = GENESIS_TIME + 500;
    let bytes = block_bytes(
        2,
        BlockId::new([1; 32]),
        vec![Tx::new(UnsignedTx::AdvanceTime(AdvanceTimeTx { time: advance }))],
    );
    node.insert_container(2, bytes.clone());
    node.insert_container(3, vec![0, 0, 0, 0, 0, 3, 1]);
    let service = initialized_service(Arc::clone(&node)).await;

    let block = service.parse_block_at_index(2).await.unwrap();
    assert_eq!(block.timestamp, advance);
    assert_eq!(service.chain_time().unwrap(), advance);

    let by_hash = service
        .parse_block_with_hash(&BlockId::from_content(&bytes))
        .await
        .unwrap();
    assert_eq!(by_hash, block);

    let err = service.parse_block_at_index(3).await.unwrap_err();
    assert!(matches!(err, AdapterError::Decode(_)));
    assert_eq!(service.chain_time().unwrap(), advance);
}

#[tokio::test]
async fn test_latest_block_follows_node_height() {
    let node = Arc::new(node());
    node.insert_container(2, block_bytes(2, BlockId::new([1; 32]), vec![funding_tx(5, 3)]));
    let service = initialized_service(Arc::clone(&node)).await;
    let latest = service.parse_latest_block().await.unwrap();
    assert_eq!(latest.height, 2);
    assert_eq!(latest.txs.len(), 1);
}

#[tokio::test]
async fn test_missing_block_is_client_error() {
    let service = initialized_service(Arc::new(node())).await;
    let err = service.parse_block_at_index(99).await.unwrap_err();
    assert!(matches!(err, AdapterError::Client(_)));
}
