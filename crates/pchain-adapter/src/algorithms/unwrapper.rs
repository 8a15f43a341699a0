//! # Proposer Envelope
//!
//! Consensus wrapper that may surround a payload block. Two forms exist:
//!
//! - **Signed** (type 0): parent, timestamp, P-chain height, proposer
//!   certificate, inner block bytes, signature. An empty certificate means
//!   the envelope is unsigned and has no proposer.
//! - **Option** (type 1): parent and inner block bytes only.
//!
//! The proposer's node id is `RIPEMD-160(SHA-256(certificate))`.

use pchain_types::codec::{marshal, unmarshal, Decode, Encode, Packer, Unpacker, CODEC_VERSION};
use pchain_types::{BlockId, CodecError, NodeId};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::domain::EnvelopeInfo;

const SIGNED_ENVELOPE: u32 = 0;
const OPTION_ENVELOPE: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposerEnvelope {
    Signed {
        parent_id: BlockId,
        /// Unix seconds.
        timestamp: u64,
        pchain_height: u64,
        certificate: Vec<u8>,
        inner: Vec<u8>,
        signature: Vec<u8>,
    },
    Option {
        parent_id: BlockId,
        inner: Vec<u8>,
    },
}

impl ProposerEnvelope {
    /// Parse `bytes` as an envelope. All input must be consumed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        unmarshal(bytes).map(|(_, envelope)| envelope)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        marshal(CODEC_VERSION, self)
    }

    pub fn parent_id(&self) -> BlockId {
        match self {
            Self::Signed { parent_id, .. } | Self::Option { parent_id, .. } => *parent_id,
        }
    }

    pub fn timestamp(&self) -> Option<u64> {
        match self {
            Self::Signed { timestamp, .. } => Some(*timestamp),
            Self::Option { .. } => None,
        }
    }

    /// Payload block bytes.
    pub fn inner(&self) -> &[u8] {
        match self {
            Self::Signed { inner, .. } | Self::Option { inner, .. } => inner,
        }
    }

    pub fn proposer(&self) -> Option<NodeId> {
        match self {
            Self::Signed { certificate, .. } if !certificate.is_empty() => {
                Some(proposer_node_id(certificate))
            }
            _ => None,
        }
    }
}

/// Node id derived from a proposer certificate.
pub fn proposer_node_id(certificate: &[u8]) -> NodeId {
    let digest = Ripemd160::digest(Sha256::digest(certificate));
    NodeId::new(digest.into())
}

impl Encode for ProposerEnvelope {
    fn encode(&self, packer: &mut Packer) {
        match self {
            Self::Signed {
                parent_id,
                timestamp,
                pchain_height,
                certificate,
                inner,
                signature,
            } => {
                packer.pack_u32(SIGNED_ENVELOPE);
                parent_id.encode(packer);
                packer.pack_u64(*timestamp);
                packer.pack_u64(*pchain_height);
                packer.pack_bytes(certificate);
                packer.pack_bytes(inner);
                packer.pack_bytes(signature);
            }
            Self::Option { parent_id, inner } => {
                packer.pack_u32(OPTION_ENVELOPE);
                parent_id.encode(packer);
                packer.pack_bytes(inner);
            }
        }
    }
}

impl Decode for ProposerEnvelope {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        match unpacker.unpack_u32()? {
            SIGNED_ENVELOPE => Ok(Self::Signed {
                parent_id: BlockId::decode(unpacker)?,
                timestamp: unpacker.unpack_u64()?,
                pchain_height: unpacker.unpack_u64()?,
                certificate: unpacker.unpack_bytes()?,
                inner: unpacker.unpack_bytes()?,
                signature: unpacker.unpack_bytes()?,
            }),
            OPTION_ENVELOPE => Ok(Self::Option {
                parent_id: BlockId::decode(unpacker)?,
                inner: unpacker.unpack_bytes()?,
            }),
            type_id => Err(CodecError::UnknownTypeId {
                context: "envelope",
                type_id,
            }),
        }
    }
}

impl From<&ProposerEnvelope> for EnvelopeInfo {
    fn from(envelope: &ProposerEnvelope) -> Self {
        Self {
            parent_id: envelope.parent_id(),
            timestamp: envelope.timestamp(),
            proposer: envelope.proposer(),
        }
    }
}
