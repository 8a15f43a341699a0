//! # Platform Transactions
//!
//! The typed union of platform-chain transactions and its signed wrapper.
//!
//! ## Identity
//!
//! - Tx id: SHA-256 of the versioned *signed* encoding (what the node indexes).
//! - Signing hash: SHA-256 of the versioned *unsigned* encoding (what keys sign).

use sha2::{Digest, Sha256};

use crate::codec::{marshal, type_ids, unmarshal, Decode, Encode, Packer, Unpacker, CODEC_VERSION};
use crate::components::{
    Credential, OutputOwners, SubnetAuth, TransferableInput, TransferableOutput,
};
use crate::errors::CodecError;
use crate::ids::{ChainId, Id, NodeId, SubnetId, TxId};

// =============================================================================
// SHARED BODIES
// =============================================================================

/// Fields common to every value-moving transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseTx {
    pub network_id: u32,
    pub blockchain_id: ChainId,
    pub outputs: Vec<TransferableOutput>,
    pub inputs: Vec<TransferableInput>,
    pub memo: Vec<u8>,
}

impl Encode for BaseTx {
    fn encode(&self, packer: &mut Packer) {
        packer.pack_u32(self.network_id);
        self.blockchain_id.encode(packer);
        packer.pack_slice(&self.outputs);
        packer.pack_slice(&self.inputs);
        packer.pack_bytes(&self.memo);
    }
}

impl Decode for BaseTx {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            network_id: unpacker.unpack_u32()?,
            blockchain_id: ChainId::decode(unpacker)?,
            outputs: unpacker.unpack_slice()?,
            inputs: unpacker.unpack_slice()?,
            memo: unpacker.unpack_bytes()?,
        })
    }
}

/// Staking window and weight of a validator or delegator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Validator {
    pub node_id: NodeId,
    pub start_time: u64,
    pub end_time: u64,
    pub weight: u64,
}

impl Encode for Validator {
    fn encode(&self, packer: &mut Packer) {
        self.node_id.encode(packer);
        packer.pack_u64(self.start_time);
        packer.pack_u64(self.end_time);
        packer.pack_u64(self.weight);
    }
}

impl Decode for Validator {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            node_id: NodeId::decode(unpacker)?,
            start_time: unpacker.unpack_u64()?,
            end_time: unpacker.unpack_u64()?,
            weight: unpacker.unpack_u64()?,
        })
    }
}

// =============================================================================
// VARIANTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddValidatorTx {
    pub base: BaseTx,
    pub validator: Validator,
    pub stake: Vec<TransferableOutput>,
    pub rewards_owner: OutputOwners,
    /// Delegation fee in millionths.
    pub shares: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddDelegatorTx {
    pub base: BaseTx,
    pub validator: Validator,
    pub stake: Vec<TransferableOutput>,
    pub rewards_owner: OutputOwners,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddSubnetValidatorTx {
    pub base: BaseTx,
    pub validator: Validator,
    pub subnet_id: SubnetId,
    pub subnet_auth: SubnetAuth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChainTx {
    pub base: BaseTx,
    pub subnet_id: SubnetId,
    pub chain_name: String,
    pub vm_id: Id,
    pub fx_ids: Vec<Id>,
    pub genesis_data: Vec<u8>,
    pub subnet_auth: SubnetAuth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubnetTx {
    pub base: BaseTx,
    pub owner: OutputOwners,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTx {
    pub base: BaseTx,
    pub source_chain: ChainId,
    pub imported_inputs: Vec<TransferableInput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTx {
    pub base: BaseTx,
    pub destination_chain: ChainId,
    pub exported_outputs: Vec<TransferableOutput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceTimeTx {
    /// Unix seconds.
    pub time: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardValidatorTx {
    /// The staking transaction whose period ended.
    pub tx_id: TxId,
}

/// Discriminant of [`UnsignedTx`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TxKind {
    Base,
    AddValidator,
    AddDelegator,
    AddSubnetValidator,
    CreateChain,
    CreateSubnet,
    Import,
    Export,
    AdvanceTime,
    RewardValidator,
}

/// Every platform transaction variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsignedTx {
    Base(BaseTx),
    AddValidator(AddValidatorTx),
    AddDelegator(AddDelegatorTx),
    AddSubnetValidator(AddSubnetValidatorTx),
    CreateChain(CreateChainTx),
    CreateSubnet(CreateSubnetTx),
    Import(ImportTx),
    Export(ExportTx),
    AdvanceTime(AdvanceTimeTx),
    RewardValidator(RewardValidatorTx),
}

impl UnsignedTx {
    pub fn kind(&self) -> TxKind {
        match self {
            Self::Base(_) => TxKind::Base,
            Self::AddValidator(_) => TxKind::AddValidator,
            Self::AddDelegator(_) => TxKind::AddDelegator,
            Self::AddSubnetValidator(_) => TxKind::AddSubnetValidator,
            Self::CreateChain(_) => TxKind::CreateChain,
            Self::CreateSubnet(_) => TxKind::CreateSubnet,
            Self::Import(_) => TxKind::Import,
            Self::Export(_) => TxKind::Export,
            Self::AdvanceTime(_) => TxKind::AdvanceTime,
            Self::RewardValidator(_) => TxKind::RewardValidator,
        }
    }

    /// The common body, absent for the two value-less proposal variants.
    pub fn base(&self) -> Option<&BaseTx> {
        match self {
            Self::Base(tx) => Some(tx),
            Self::AddValidator(tx) => Some(&tx.base),
            Self::AddDelegator(tx) => Some(&tx.base),
            Self::AddSubnetValidator(tx) => Some(&tx.base),
            Self::CreateChain(tx) => Some(&tx.base),
            Self::CreateSubnet(tx) => Some(&tx.base),
            Self::Import(tx) => Some(&tx.base),
            Self::Export(tx) => Some(&tx.base),
            Self::AdvanceTime(_) | Self::RewardValidator(_) => None,
        }
    }

    /// Base inputs followed by imported inputs: the order credentials follow.
    pub fn signed_inputs(&self) -> Vec<&TransferableInput> {
        let mut inputs: Vec<&TransferableInput> =
            self.base().map(|b| b.inputs.iter().collect()).unwrap_or_default();
        if let Self::Import(tx) = self {
            inputs.extend(tx.imported_inputs.iter());
        }
        inputs
    }

    fn type_id(&self) -> u32 {
        match self {
            Self::Base(_) => type_ids::BASE_TX,
            Self::AddValidator(_) => type_ids::ADD_VALIDATOR_TX,
            Self::AddDelegator(_) => type_ids::ADD_DELEGATOR_TX,
            Self::AddSubnetValidator(_) => type_ids::ADD_SUBNET_VALIDATOR_TX,
            Self::CreateChain(_) => type_ids::CREATE_CHAIN_TX,
            Self::CreateSubnet(_) => type_ids::CREATE_SUBNET_TX,
            Self::Import(_) => type_ids::IMPORT_TX,
            Self::Export(_) => type_ids::EXPORT_TX,
            Self::AdvanceTime(_) => type_ids::ADVANCE_TIME_TX,
            Self::RewardValidator(_) => type_ids::REWARD_VALIDATOR_TX,
        }
    }

    /// Versioned unsigned encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        marshal(CODEC_VERSION, self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        unmarshal(bytes).map(|(_, tx)| tx)
    }
}

impl Encode for UnsignedTx {
    fn encode(&self, packer: &mut Packer) {
        packer.pack_u32(self.type_id());
        match self {
            Self::Base(tx) => tx.encode(packer),
            Self::AddValidator(tx) => {
                tx.base.encode(packer);
                tx.validator.encode(packer);
                packer.pack_slice(&tx.stake);
                tx.rewards_owner.encode_as_owner(packer);
                packer.pack_u32(tx.shares);
            }
            Self::AddDelegator(tx) => {
                tx.base.encode(packer);
                tx.validator.encode(packer);
                packer.pack_slice(&tx.stake);
                tx.rewards_owner.encode_as_owner(packer);
            }
            Self::AddSubnetValidator(tx) => {
                tx.base.encode(packer);
                tx.validator.encode(packer);
                tx.subnet_id.encode(packer);
                tx.subnet_auth.encode(packer);
            }
            Self::CreateChain(tx) => {
                tx.base.encode(packer);
                tx.subnet_id.encode(packer);
                packer.pack_str(&tx.chain_name);
                tx.vm_id.encode(packer);
                packer.pack_slice(&tx.fx_ids);
                packer.pack_bytes(&tx.genesis_data);
                tx.subnet_auth.encode(packer);
            }
            Self::CreateSubnet(tx) => {
                tx.base.encode(packer);
                tx.owner.encode_as_owner(packer);
            }
            Self::Import(tx) => {
                tx.base.encode(packer);
                tx.source_chain.encode(packer);
                packer.pack_slice(&tx.imported_inputs);
            }
            Self::Export(tx) => {
                tx.base.encode(packer);
                tx.destination_chain.encode(packer);
                packer.pack_slice(&tx.exported_outputs);
            }
            Self::AdvanceTime(tx) => packer.pack_u64(tx.time),
            Self::RewardValidator(tx) => tx.tx_id.encode(packer),
        }
    }
}

impl Decode for UnsignedTx {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let tx = match unpacker.unpack_u32()? {
            type_ids::BASE_TX => Self::Base(BaseTx::decode(unpacker)?),
            type_ids::ADD_VALIDATOR_TX => Self::AddValidator(AddValidatorTx {
                base: BaseTx::decode(unpacker)?,
                validator: Validator::decode(unpacker)?,
                stake: unpacker.unpack_slice()?,
                rewards_owner: OutputOwners::decode_as_owner(unpacker)?,
                shares: unpacker.unpack_u32()?,
            }),
            type_ids::ADD_DELEGATOR_TX => Self::AddDelegator(AddDelegatorTx {
                base: BaseTx::decode(unpacker)?,
                validator: Validator::decode(unpacker)?,
                stake: unpacker.unpack_slice()?,
                rewards_owner: OutputOwners::decode_as_owner(unpacker)?,
            }),
            type_ids::ADD_SUBNET_VALIDATOR_TX => Self::AddSubnetValidator(AddSubnetValidatorTx {
                base: BaseTx::decode(unpacker)?,
                validator: Validator::decode(unpacker)?,
                subnet_id: SubnetId::decode(unpacker)?,
                subnet_auth: SubnetAuth::decode(unpacker)?,
            }),
            type_ids::CREATE_CHAIN_TX => Self::CreateChain(CreateChainTx {
                base: BaseTx::decode(unpacker)?,
                subnet_id: SubnetId::decode(unpacker)?,
                chain_name: unpacker.unpack_str()?,
                vm_id: Id::decode(unpacker)?,
                fx_ids: unpacker.unpack_slice()?,
                genesis_data: unpacker.unpack_bytes()?,
                subnet_auth: SubnetAuth::decode(unpacker)?,
            }),
            type_ids::CREATE_SUBNET_TX => Self::CreateSubnet(CreateSubnetTx {
                base: BaseTx::decode(unpacker)?,
                owner: OutputOwners::decode_as_owner(unpacker)?,
            }),
            type_ids::IMPORT_TX => Self::Import(ImportTx {
                base: BaseTx::decode(unpacker)?,
                source_chain: ChainId::decode(unpacker)?,
                imported_inputs: unpacker.unpack_slice()?,
            }),
            type_ids::EXPORT_TX => Self::Export(ExportTx {
                base: BaseTx::decode(unpacker)?,
                destination_chain: ChainId::decode(unpacker)?,
                exported_outputs: unpacker.unpack_slice()?,
            }),
            type_ids::ADVANCE_TIME_TX => Self::AdvanceTime(AdvanceTimeTx {
                time: unpacker.unpack_u64()?,
            }),
            type_ids::REWARD_VALIDATOR_TX => Self::RewardValidator(RewardValidatorTx {
                tx_id: TxId::decode(unpacker)?,
            }),
            type_id => {
                return Err(CodecError::UnknownTypeId {
                    context: "transaction",
                    type_id,
                })
            }
        };
        Ok(tx)
    }
}

// =============================================================================
// SIGNED TRANSACTION
// =============================================================================

/// An unsigned transaction plus one credential per signed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tx {
    pub unsigned: UnsignedTx,
    pub credentials: Vec<Credential>,
}

impl Tx {
    pub fn new(unsigned: UnsignedTx) -> Self {
        Self {
            unsigned,
            credentials: Vec::new(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        unmarshal(bytes).map(|(_, tx)| tx)
    }

    pub fn signed_bytes(&self) -> Result<Vec<u8>, CodecError> {
        marshal(CODEC_VERSION, self)
    }

    pub fn unsigned_bytes(&self) -> Result<Vec<u8>, CodecError> {
        self.unsigned.to_bytes()
    }

    pub fn id(&self) -> Result<TxId, CodecError> {
        Ok(TxId::from_content(&self.signed_bytes()?))
    }

    /// Digest each signer signs.
    pub fn signing_hash(&self) -> Result<[u8; 32], CodecError> {
        Ok(Sha256::digest(self.unsigned_bytes()?).into())
    }

    /// Fix the canonical encoding and id.
    pub fn seal(self) -> Result<SealedTx, CodecError> {
        let bytes = self.signed_bytes()?;
        Ok(SealedTx {
            id: TxId::from_content(&bytes),
            bytes,
            tx: self,
        })
    }
}

impl Encode for Tx {
    fn encode(&self, packer: &mut Packer) {
        self.unsigned.encode(packer);
        packer.pack_slice(&self.credentials);
    }
}

impl Decode for Tx {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            unsigned: UnsignedTx::decode(unpacker)?,
            credentials: unpacker.unpack_slice()?,
        })
    }
}

/// A transaction whose encoding and id have been computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedTx {
    pub id: TxId,
    pub bytes: Vec<u8>,
    pub tx: Tx,
}

impl SealedTx {
    pub fn unsigned(&self) -> &UnsignedTx {
        &self.tx.unsigned
    }
}
