//! # Block Decoder
//!
//! Raw container bytes to [`ParsedBlock`].
//!
//! ## Steps
//!
//! 1. Try the bytes as a proposer envelope whose inner bytes decode as a
//!    block. Anything else is treated as a bare payload block.
//! 2. Block id = SHA-256 of the payload bytes, so wrapped and bare forms of
//!    one block share an id.
//! 3. Resolve the timestamp (see [`resolve_timestamp`]).
//! 4. Seal every contained transaction; one failure fails the whole block.

use pchain_types::{Block, BlockId, UnsignedTx};
use tracing::debug;

use super::unwrapper::ProposerEnvelope;
use crate::domain::{AdapterError, EnvelopeInfo, ParsedBlock};

/// A payload block with its envelope, before timestamp resolution.
#[derive(Debug, Clone)]
pub struct DecodedBlock {
    pub block_id: BlockId,
    pub block: Block,
    pub envelope: Option<EnvelopeInfo>,
}

impl DecodedBlock {
    /// Seal the contained transactions and finish the block.
    pub fn seal(self, timestamp: u64) -> Result<ParsedBlock, AdapterError> {
        let parent_id = self.block.parent_id();
        let height = self.block.height();
        let kind = self.block.kind();
        let txs = self
            .block
            .into_txs()
            .into_iter()
            .map(|tx| tx.seal())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ParsedBlock {
            block_id: self.block_id,
            parent_id,
            height,
            timestamp,
            kind,
            txs,
            envelope: self.envelope,
        })
    }
}

/// Unwrap and decode, without timestamp resolution.
pub fn decode_payload(bytes: &[u8]) -> Result<DecodedBlock, AdapterError> {
    if let Ok(envelope) = ProposerEnvelope::from_bytes(bytes) {
        match Block::from_bytes(envelope.inner()) {
            Ok(block) => {
                return Ok(DecodedBlock {
                    block_id: BlockId::from_content(envelope.inner()),
                    block,
                    envelope: Some(EnvelopeInfo::from(&envelope)),
                })
            }
            Err(err) => debug!("[pchain] envelope inner bytes are not a block: {}", err),
        }
    }
    let block = Block::from_bytes(bytes)?;
    Ok(DecodedBlock {
        block_id: BlockId::from_content(bytes),
        block,
        envelope: None,
    })
}

/// Effective block time, unix seconds.
///
/// Envelope time if later than genesis, else genesis. The Banff block's own
/// time field is not consulted. An advance-time transaction overrides both;
/// with several, the last one scanned wins.
pub fn resolve_timestamp(decoded: &DecodedBlock, genesis_timestamp: u64) -> u64 {
    let mut timestamp = match decoded.envelope.as_ref().and_then(|e| e.timestamp) {
        Some(t) if t > genesis_timestamp => t,
        _ => genesis_timestamp,
    };
    for tx in decoded.block.txs() {
        if let UnsignedTx::AdvanceTime(advance) = &tx.unsigned {
            timestamp = advance.time;
        }
    }
    timestamp
}

/// Full decode of container bytes.
pub fn decode_block(bytes: &[u8], genesis_timestamp: u64) -> Result<ParsedBlock, AdapterError> {
    let decoded = decode_payload(bytes)?;
    let timestamp = resolve_timestamp(&decoded, genesis_timestamp);
    decoded.seal(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pchain_types::{AdvanceTimeTx, BlockKind, CodecError, CommonBlock, Tx};

    const GENESIS_TIME: u64 = 1_600_000_000;

    fn common() -> CommonBlock {
        CommonBlock {
            parent_id: BlockId::new([8; 32]),
            height: 3,
        }
    }

    fn advance(time: u64) -> Tx {
        Tx::new(UnsignedTx::AdvanceTime(AdvanceTimeTx { time }))
    }

    fn wrap(inner: Vec<u8>, timestamp: u64) -> Vec<u8> {
        ProposerEnvelope::Signed {
            parent_id: BlockId::new([1; 32]),
            timestamp,
            pchain_height: 0,
            certificate: b"cert".to_vec(),
            inner,
            signature: vec![0; 4],
        }
        .to_bytes()
        .unwrap()
    }

    #[test]
    fn test_bare_block_decodes() {
        let block = Block::ApricotCommit { common: common() };
        let bytes = block.to_bytes().unwrap();
        let parsed = decode_block(&bytes, GENESIS_TIME).unwrap();
        assert_eq!(parsed.block_id, BlockId::from_content(&bytes));
        assert_eq!(parsed.kind, BlockKind::ApricotCommit);
        assert_eq!(parsed.timestamp, GENESIS_TIME);
        assert!(parsed.envelope.is_none());
    }

    #[test]
    fn test_envelope_time_used_when_after_genesis() {
        let inner = Block::BanffStandard {
            time: GENESIS_TIME + 5,
            common: common(),
            txs: Vec::new(),
        }
        .to_bytes()
        .unwrap();
        let parsed = decode_block(&wrap(inner.clone(), GENESIS_TIME + 10), GENESIS_TIME).unwrap();
        assert_eq!(parsed.timestamp, GENESIS_TIME + 10);
        assert_eq!(parsed.block_id, BlockId::from_content(&inner));
        assert!(parsed.proposer().is_some());

        let parsed = decode_block(&wrap(inner, 0), GENESIS_TIME).unwrap();
        assert_eq!(parsed.timestamp, GENESIS_TIME);
    }

    #[test]
    fn test_bare_banff_block_falls_back_to_genesis() {
        let bytes = Block::BanffStandard {
            time: GENESIS_TIME + 5,
            common: common(),
            txs: Vec::new(),
        }
        .to_bytes()
        .unwrap();
        let parsed = decode_block(&bytes, GENESIS_TIME).unwrap();
        assert_eq!(parsed.kind, BlockKind::BanffStandard);
        assert_eq!(parsed.timestamp, GENESIS_TIME);
    }

    #[test]
    fn test_last_advance_time_wins() {
        let block = Block::ApricotStandard {
            common: common(),
            txs: vec![advance(GENESIS_TIME + 1), advance(GENESIS_TIME + 2)],
        };
        let bytes = wrap(block.to_bytes().unwrap(), GENESIS_TIME + 100);
        let parsed = decode_block(&bytes, GENESIS_TIME).unwrap();
        assert_eq!(parsed.timestamp, GENESIS_TIME + 2);
        assert_eq!(parsed.txs.len(), 2);
    }

    #[test]
    fn test_envelope_with_non_block_inner_falls_back() {
        // Not an envelope around a block, and not a block either.
        let bytes = wrap(vec![0xde, 0xad], GENESIS_TIME + 1);
        assert!(matches!(
            decode_block(&bytes, GENESIS_TIME),
            Err(AdapterError::Decode(_))
        ));
    }

    #[test]
    fn test_unknown_block_type_is_decode_error() {
        let bytes = hex_bytes("0000000000ff");
        assert_eq!(
            decode_block(&bytes, GENESIS_TIME).unwrap_err(),
            AdapterError::Decode(CodecError::UnknownTypeId {
                context: "block",
                type_id: 0xff
            })
        );
    }

    fn hex_bytes(text: &str) -> Vec<u8> {
        hex::decode(text).unwrap()
    }
}
