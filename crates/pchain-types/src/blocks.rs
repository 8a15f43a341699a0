//! # Platform Blocks
//!
//! Payload blocks in both historical encodings. Apricot blocks carry no time
//! of their own; Banff blocks prefix a `u64` timestamp.

use crate::codec::{marshal, type_ids, unmarshal, Decode, Encode, Packer, Unpacker, CODEC_VERSION};
use crate::errors::CodecError;
use crate::ids::BlockId;
use crate::txs::Tx;

/// Parent linkage shared by every block variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommonBlock {
    pub parent_id: BlockId,
    pub height: u64,
}

impl Encode for CommonBlock {
    fn encode(&self, packer: &mut Packer) {
        self.parent_id.encode(packer);
        packer.pack_u64(self.height);
    }
}

impl Decode for CommonBlock {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            parent_id: BlockId::decode(unpacker)?,
            height: unpacker.unpack_u64()?,
        })
    }
}

/// Discriminant of [`Block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    ApricotProposal,
    ApricotAbort,
    ApricotCommit,
    ApricotStandard,
    ApricotAtomic,
    BanffProposal,
    BanffAbort,
    BanffCommit,
    BanffStandard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    ApricotProposal { common: CommonBlock, tx: Tx },
    ApricotAbort { common: CommonBlock },
    ApricotCommit { common: CommonBlock },
    ApricotStandard { common: CommonBlock, txs: Vec<Tx> },
    ApricotAtomic { common: CommonBlock, tx: Tx },
    BanffProposal {
        time: u64,
        /// Decision transactions executed before the proposal.
        decision_txs: Vec<Tx>,
        common: CommonBlock,
        tx: Tx,
    },
    BanffAbort { time: u64, common: CommonBlock },
    BanffCommit { time: u64, common: CommonBlock },
    BanffStandard { time: u64, common: CommonBlock, txs: Vec<Tx> },
}

impl Block {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        unmarshal(bytes).map(|(_, block)| block)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        marshal(CODEC_VERSION, self)
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Self::ApricotProposal { .. } => BlockKind::ApricotProposal,
            Self::ApricotAbort { .. } => BlockKind::ApricotAbort,
            Self::ApricotCommit { .. } => BlockKind::ApricotCommit,
            Self::ApricotStandard { .. } => BlockKind::ApricotStandard,
            Self::ApricotAtomic { .. } => BlockKind::ApricotAtomic,
            Self::BanffProposal { .. } => BlockKind::BanffProposal,
            Self::BanffAbort { .. } => BlockKind::BanffAbort,
            Self::BanffCommit { .. } => BlockKind::BanffCommit,
            Self::BanffStandard { .. } => BlockKind::BanffStandard,
        }
    }

    fn common(&self) -> &CommonBlock {
        match self {
            Self::ApricotProposal { common, .. }
            | Self::ApricotAbort { common }
            | Self::ApricotCommit { common }
            | Self::ApricotStandard { common, .. }
            | Self::ApricotAtomic { common, .. }
            | Self::BanffProposal { common, .. }
            | Self::BanffAbort { common, .. }
            | Self::BanffCommit { common, .. }
            | Self::BanffStandard { common, .. } => common,
        }
    }

    pub fn parent_id(&self) -> BlockId {
        self.common().parent_id
    }

    pub fn height(&self) -> u64 {
        self.common().height
    }

    /// Block-declared time (unix seconds); Apricot blocks have none.
    pub fn banff_time(&self) -> Option<u64> {
        match self {
            Self::BanffProposal { time, .. }
            | Self::BanffAbort { time, .. }
            | Self::BanffCommit { time, .. }
            | Self::BanffStandard { time, .. } => Some(*time),
            _ => None,
        }
    }

    /// Contained transactions in execution order.
    pub fn txs(&self) -> Vec<&Tx> {
        match self {
            Self::ApricotProposal { tx, .. } | Self::ApricotAtomic { tx, .. } => vec![tx],
            Self::ApricotStandard { txs, .. } | Self::BanffStandard { txs, .. } => {
                txs.iter().collect()
            }
            Self::BanffProposal {
                decision_txs, tx, ..
            } => decision_txs.iter().chain(std::iter::once(tx)).collect(),
            Self::ApricotAbort { .. }
            | Self::ApricotCommit { .. }
            | Self::BanffAbort { .. }
            | Self::BanffCommit { .. } => Vec::new(),
        }
    }

    /// Consume the block, yielding its transactions in execution order.
    pub fn into_txs(self) -> Vec<Tx> {
        match self {
            Self::ApricotProposal { tx, .. } | Self::ApricotAtomic { tx, .. } => vec![tx],
            Self::ApricotStandard { txs, .. } | Self::BanffStandard { txs, .. } => txs,
            Self::BanffProposal {
                mut decision_txs,
                tx,
                ..
            } => {
                decision_txs.push(tx);
                decision_txs
            }
            Self::ApricotAbort { .. }
            | Self::ApricotCommit { .. }
            | Self::BanffAbort { .. }
            | Self::BanffCommit { .. } => Vec::new(),
        }
    }
}

impl Encode for Block {
    fn encode(&self, packer: &mut Packer) {
        match self {
            Self::ApricotProposal { common, tx } => {
                packer.pack_u32(type_ids::APRICOT_PROPOSAL_BLOCK);
                common.encode(packer);
                tx.encode(packer);
            }
            Self::ApricotAbort { common } => {
                packer.pack_u32(type_ids::APRICOT_ABORT_BLOCK);
                common.encode(packer);
            }
            Self::ApricotCommit { common } => {
                packer.pack_u32(type_ids::APRICOT_COMMIT_BLOCK);
                common.encode(packer);
            }
            Self::ApricotStandard { common, txs } => {
                packer.pack_u32(type_ids::APRICOT_STANDARD_BLOCK);
                common.encode(packer);
                packer.pack_slice(txs);
            }
            Self::ApricotAtomic { common, tx } => {
                packer.pack_u32(type_ids::APRICOT_ATOMIC_BLOCK);
                common.encode(packer);
                tx.encode(packer);
            }
            Self::BanffProposal {
                time,
                decision_txs,
                common,
                tx,
            } => {
                packer.pack_u32(type_ids::BANFF_PROPOSAL_BLOCK);
                packer.pack_u64(*time);
                packer.pack_slice(decision_txs);
                common.encode(packer);
                tx.encode(packer);
            }
            Self::BanffAbort { time, common } => {
                packer.pack_u32(type_ids::BANFF_ABORT_BLOCK);
                packer.pack_u64(*time);
                common.encode(packer);
            }
            Self::BanffCommit { time, common } => {
                packer.pack_u32(type_ids::BANFF_COMMIT_BLOCK);
                packer.pack_u64(*time);
                common.encode(packer);
            }
            Self::BanffStandard { time, common, txs } => {
                packer.pack_u32(type_ids::BANFF_STANDARD_BLOCK);
                packer.pack_u64(*time);
                common.encode(packer);
                packer.pack_slice(txs);
            }
        }
    }
}

impl Decode for Block {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let block = match unpacker.unpack_u32()? {
            type_ids::APRICOT_PROPOSAL_BLOCK => Self::ApricotProposal {
                common: CommonBlock::decode(unpacker)?,
                tx: Tx::decode(unpacker)?,
            },
            type_ids::APRICOT_ABORT_BLOCK => Self::ApricotAbort {
                common: CommonBlock::decode(unpacker)?,
            },
            type_ids::APRICOT_COMMIT_BLOCK => Self::ApricotCommit {
                common: CommonBlock::decode(unpacker)?,
            },
            type_ids::APRICOT_STANDARD_BLOCK => Self::ApricotStandard {
                common: CommonBlock::decode(unpacker)?,
                txs: unpacker.unpack_slice()?,
            },
            type_ids::APRICOT_ATOMIC_BLOCK => Self::ApricotAtomic {
                common: CommonBlock::decode(unpacker)?,
                tx: Tx::decode(unpacker)?,
            },
            type_ids::BANFF_PROPOSAL_BLOCK => Self::BanffProposal {
                time: unpacker.unpack_u64()?,
                decision_txs: unpacker.unpack_slice()?,
                common: CommonBlock::decode(unpacker)?,
                tx: Tx::decode(unpacker)?,
            },
            type_ids::BANFF_ABORT_BLOCK => Self::BanffAbort {
                time: unpacker.unpack_u64()?,
                common: CommonBlock::decode(unpacker)?,
            },
            type_ids::BANFF_COMMIT_BLOCK => Self::BanffCommit {
                time: unpacker.unpack_u64()?,
                common: CommonBlock::decode(unpacker)?,
            },
            type_ids::BANFF_STANDARD_BLOCK => Self::BanffStandard {
                time: unpacker.unpack_u64()?,
                common: CommonBlock::decode(unpacker)?,
                txs: unpacker.unpack_slice()?,
            },
            type_id => {
                return Err(CodecError::UnknownTypeId {
                    context: "block",
                    type_id,
                })
            }
        };
        Ok(block)
    }
}
