//! # UTXO Components
//!
//! Owner sets, outputs, inputs, UTXOs and credentials, plus the canonical
//! sort orders required for reproducible transaction hashes.

use std::fmt;
use std::str::FromStr;

use crate::codec::{marshal, type_ids, unmarshal, Decode, Encode, Packer, Unpacker, CODEC_VERSION};
use crate::errors::{CodecError, FormatError};
use crate::ids::{AddressId, AssetId, TxId};

/// Length of a recoverable secp256k1 signature (`r ‖ s ‖ v`).
pub const SIGNATURE_LEN: usize = 65;

/// A recoverable secp256k1 signature.
pub type Signature = [u8; SIGNATURE_LEN];

// =============================================================================
// OWNERS
// =============================================================================

/// Spending condition: `threshold` of `addresses` must sign after `locktime`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputOwners {
    pub locktime: u64,
    pub threshold: u32,
    pub addresses: Vec<AddressId>,
}

impl OutputOwners {
    /// Build an owner set with its addresses in canonical order.
    pub fn new(locktime: u64, threshold: u32, addresses: Vec<AddressId>) -> Self {
        let mut owners = Self {
            locktime,
            threshold,
            addresses,
        };
        owners.sort_addresses();
        owners
    }

    /// A 1-of-1 owner set with no lock.
    pub fn single(address: AddressId) -> Self {
        Self::new(0, 1, vec![address])
    }

    /// The sole address when this is a 1-of-1 owner set.
    pub fn single_address(&self) -> Option<&AddressId> {
        match self.addresses.as_slice() {
            [address] if self.threshold == 1 => Some(address),
            _ => None,
        }
    }

    /// Sort ascending and drop duplicates.
    pub fn sort_addresses(&mut self) {
        self.addresses.sort();
        self.addresses.dedup();
    }

    /// Write as an interface field (type id + body).
    pub fn encode_as_owner(&self, packer: &mut Packer) {
        packer.pack_u32(type_ids::OUTPUT_OWNERS);
        self.encode(packer);
    }

    /// Read an interface field that must hold an owner set.
    pub fn decode_as_owner(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        match unpacker.unpack_u32()? {
            type_ids::OUTPUT_OWNERS => Self::decode(unpacker),
            type_id => Err(CodecError::UnknownTypeId {
                context: "owner",
                type_id,
            }),
        }
    }
}

impl Encode for OutputOwners {
    fn encode(&self, packer: &mut Packer) {
        packer.pack_u64(self.locktime);
        packer.pack_u32(self.threshold);
        packer.pack_slice(&self.addresses);
    }
}

impl Decode for OutputOwners {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            locktime: unpacker.unpack_u64()?,
            threshold: unpacker.unpack_u32()?,
            addresses: unpacker.unpack_slice()?,
        })
    }
}

// =============================================================================
// OUTPUTS
// =============================================================================

/// Spendable amount guarded by an owner set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutput {
    pub amount: u64,
    pub owners: OutputOwners,
}

impl Encode for TransferOutput {
    fn encode(&self, packer: &mut Packer) {
        packer.pack_u64(self.amount);
        self.owners.encode(packer);
    }
}

impl Decode for TransferOutput {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            amount: unpacker.unpack_u64()?,
            owners: OutputOwners::decode(unpacker)?,
        })
    }
}

/// Output interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Transfer(TransferOutput),
    /// Transfer output that may only be staked until `locktime`.
    StakeableLock { locktime: u64, output: TransferOutput },
}

impl Output {
    pub fn transfer(&self) -> &TransferOutput {
        match self {
            Self::Transfer(output) | Self::StakeableLock { output, .. } => output,
        }
    }

    pub fn amount(&self) -> u64 {
        self.transfer().amount
    }

    pub fn owners(&self) -> &OutputOwners {
        &self.transfer().owners
    }

    pub fn stakeable_locktime(&self) -> Option<u64> {
        match self {
            Self::Transfer(_) => None,
            Self::StakeableLock { locktime, .. } => Some(*locktime),
        }
    }
}

impl Encode for Output {
    fn encode(&self, packer: &mut Packer) {
        match self {
            Self::Transfer(output) => {
                packer.pack_u32(type_ids::TRANSFER_OUTPUT);
                output.encode(packer);
            }
            Self::StakeableLock { locktime, output } => {
                packer.pack_u32(type_ids::STAKEABLE_LOCK_OUT);
                packer.pack_u64(*locktime);
                packer.pack_u32(type_ids::TRANSFER_OUTPUT);
                output.encode(packer);
            }
        }
    }
}

impl Decode for Output {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        match unpacker.unpack_u32()? {
            type_ids::TRANSFER_OUTPUT => Ok(Self::Transfer(TransferOutput::decode(unpacker)?)),
            type_ids::STAKEABLE_LOCK_OUT => {
                let locktime = unpacker.unpack_u64()?;
                match unpacker.unpack_u32()? {
                    type_ids::TRANSFER_OUTPUT => Ok(Self::StakeableLock {
                        locktime,
                        output: TransferOutput::decode(unpacker)?,
                    }),
                    type_id => Err(CodecError::UnknownTypeId {
                        context: "locked output",
                        type_id,
                    }),
                }
            }
            type_id => Err(CodecError::UnknownTypeId {
                context: "output",
                type_id,
            }),
        }
    }
}

/// An output tagged with the asset it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferableOutput {
    pub asset_id: AssetId,
    pub output: Output,
}

impl Encode for TransferableOutput {
    fn encode(&self, packer: &mut Packer) {
        self.asset_id.encode(packer);
        self.output.encode(packer);
    }
}

impl Decode for TransferableOutput {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            asset_id: AssetId::decode(unpacker)?,
            output: Output::decode(unpacker)?,
        })
    }
}

// =============================================================================
// INPUTS
// =============================================================================

/// Reference to a spendable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtxoId {
    pub tx_id: TxId,
    pub output_index: u32,
}

impl UtxoId {
    pub fn new(tx_id: TxId, output_index: u32) -> Self {
        Self {
            tx_id,
            output_index,
        }
    }
}

impl fmt::Display for UtxoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.output_index)
    }
}

impl FromStr for UtxoId {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tx_id, index) = s
            .rsplit_once(':')
            .ok_or_else(|| FormatError::InvalidUtxoId(s.to_string()))?;
        let output_index = index
            .parse::<u32>()
            .map_err(|_| FormatError::InvalidUtxoId(s.to_string()))?;
        Ok(Self {
            tx_id: tx_id.parse()?,
            output_index,
        })
    }
}

impl Encode for UtxoId {
    fn encode(&self, packer: &mut Packer) {
        self.tx_id.encode(packer);
        packer.pack_u32(self.output_index);
    }
}

impl Decode for UtxoId {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            tx_id: TxId::decode(unpacker)?,
            output_index: unpacker.unpack_u32()?,
        })
    }
}

/// Amount being spent plus the owner-address positions that will sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferInput {
    pub amount: u64,
    pub sig_indices: Vec<u32>,
}

impl Encode for TransferInput {
    fn encode(&self, packer: &mut Packer) {
        packer.pack_u64(self.amount);
        packer.pack_slice(&self.sig_indices);
    }
}

impl Decode for TransferInput {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            amount: unpacker.unpack_u64()?,
            sig_indices: unpacker.unpack_slice()?,
        })
    }
}

/// Input interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Transfer(TransferInput),
    StakeableLock { locktime: u64, input: TransferInput },
}

impl Input {
    pub fn transfer(&self) -> &TransferInput {
        match self {
            Self::Transfer(input) | Self::StakeableLock { input, .. } => input,
        }
    }

    pub fn amount(&self) -> u64 {
        self.transfer().amount
    }

    pub fn sig_indices(&self) -> &[u32] {
        &self.transfer().sig_indices
    }

    pub fn stakeable_locktime(&self) -> Option<u64> {
        match self {
            Self::Transfer(_) => None,
            Self::StakeableLock { locktime, .. } => Some(*locktime),
        }
    }
}

impl Encode for Input {
    fn encode(&self, packer: &mut Packer) {
        match self {
            Self::Transfer(input) => {
                packer.pack_u32(type_ids::TRANSFER_INPUT);
                input.encode(packer);
            }
            Self::StakeableLock { locktime, input } => {
                packer.pack_u32(type_ids::STAKEABLE_LOCK_IN);
                packer.pack_u64(*locktime);
                packer.pack_u32(type_ids::TRANSFER_INPUT);
                input.encode(packer);
            }
        }
    }
}

impl Decode for Input {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        match unpacker.unpack_u32()? {
            type_ids::TRANSFER_INPUT => Ok(Self::Transfer(TransferInput::decode(unpacker)?)),
            type_ids::STAKEABLE_LOCK_IN => {
                let locktime = unpacker.unpack_u64()?;
                match unpacker.unpack_u32()? {
                    type_ids::TRANSFER_INPUT => Ok(Self::StakeableLock {
                        locktime,
                        input: TransferInput::decode(unpacker)?,
                    }),
                    type_id => Err(CodecError::UnknownTypeId {
                        context: "locked input",
                        type_id,
                    }),
                }
            }
            type_id => Err(CodecError::UnknownTypeId {
                context: "input",
                type_id,
            }),
        }
    }
}

/// An input tagged with the UTXO it spends and that UTXO's asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferableInput {
    pub utxo_id: UtxoId,
    pub asset_id: AssetId,
    pub input: Input,
}

impl Encode for TransferableInput {
    fn encode(&self, packer: &mut Packer) {
        self.utxo_id.encode(packer);
        self.asset_id.encode(packer);
        self.input.encode(packer);
    }
}

impl Decode for TransferableInput {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            utxo_id: UtxoId::decode(unpacker)?,
            asset_id: AssetId::decode(unpacker)?,
            input: Input::decode(unpacker)?,
        })
    }
}

// =============================================================================
// UTXO
// =============================================================================

/// An unspent output as returned by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub utxo_id: UtxoId,
    pub asset_id: AssetId,
    pub output: Output,
}

impl Utxo {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        unmarshal(bytes).map(|(_, utxo)| utxo)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        marshal(CODEC_VERSION, self)
    }
}

impl Encode for Utxo {
    fn encode(&self, packer: &mut Packer) {
        self.utxo_id.encode(packer);
        self.asset_id.encode(packer);
        self.output.encode(packer);
    }
}

impl Decode for Utxo {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            utxo_id: UtxoId::decode(unpacker)?,
            asset_id: AssetId::decode(unpacker)?,
            output: Output::decode(unpacker)?,
        })
    }
}

// =============================================================================
// AUTHORIZATION
// =============================================================================

/// Signatures authorizing one input, in signer-index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub signatures: Vec<Signature>,
}

impl Encode for Credential {
    fn encode(&self, packer: &mut Packer) {
        packer.pack_u32(type_ids::CREDENTIAL);
        packer.pack_count(self.signatures.len());
        for signature in &self.signatures {
            packer.pack_fixed(signature);
        }
    }
}

impl Decode for Credential {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        match unpacker.unpack_u32()? {
            type_ids::CREDENTIAL => {}
            type_id => {
                return Err(CodecError::UnknownTypeId {
                    context: "credential",
                    type_id,
                })
            }
        }
        let count = unpacker.unpack_u32()? as usize;
        if count.saturating_mul(SIGNATURE_LEN) > unpacker.remaining() {
            return Err(CodecError::LengthOverflow {
                len: count,
                remaining: unpacker.remaining(),
            });
        }
        let mut signatures = Vec::with_capacity(count);
        for _ in 0..count {
            signatures.push(unpacker.unpack_fixed::<SIGNATURE_LEN>()?);
        }
        Ok(Self { signatures })
    }
}

/// Subnet-owner signer indices carried by subnet-scoped transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubnetAuth {
    pub sig_indices: Vec<u32>,
}

impl Encode for SubnetAuth {
    fn encode(&self, packer: &mut Packer) {
        packer.pack_u32(type_ids::SUBNET_AUTH_INPUT);
        packer.pack_slice(&self.sig_indices);
    }
}

impl Decode for SubnetAuth {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        match unpacker.unpack_u32()? {
            type_ids::SUBNET_AUTH_INPUT => Ok(Self {
                sig_indices: unpacker.unpack_slice()?,
            }),
            type_id => Err(CodecError::UnknownTypeId {
                context: "subnet auth",
                type_id,
            }),
        }
    }
}

// =============================================================================
// CANONICAL ORDER
// =============================================================================

/// Sort inputs by (tx id, output index).
pub fn sort_transferable_inputs(inputs: &mut [TransferableInput]) {
    inputs.sort_by(|a, b| a.utxo_id.cmp(&b.utxo_id));
}

/// Sort outputs by their encoded bytes.
pub fn sort_transferable_outputs(outputs: &mut [TransferableOutput]) {
    outputs.sort_by_cached_key(|output| {
        let mut packer = Packer::new();
        output.encode(&mut packer);
        packer.bytes().to_vec()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_output(amount: u64, address: u8) -> TransferableOutput {
        TransferableOutput {
            asset_id: AssetId::new([0x11; 32]),
            output: Output::Transfer(TransferOutput {
                amount,
                owners: OutputOwners::single(AddressId::new([address; 20])),
            }),
        }
    }

    #[test]
    fn test_owner_addresses_sorted_and_unique() {
        let owners = OutputOwners::new(
            0,
            1,
            vec![
                AddressId::new([3; 20]),
                AddressId::new([1; 20]),
                AddressId::new([3; 20]),
            ],
        );
        assert_eq!(
            owners.addresses,
            vec![AddressId::new([1; 20]), AddressId::new([3; 20])]
        );
        assert!(owners.single_address().is_none());
    }

    #[test]
    fn test_single_address_requires_threshold_one() {
        let mut owners = OutputOwners::single(AddressId::new([9; 20]));
        assert_eq!(owners.single_address(), Some(&AddressId::new([9; 20])));
        owners.threshold = 2;
        assert!(owners.single_address().is_none());
    }

    #[test]
    fn test_transfer_output_layout() {
        let mut packer = Packer::new();
        transfer_output(1000, 0x44).encode(&mut packer);
        let bytes = packer.finish().unwrap();
        let expected = format!(
            "{}{}{}{}{}{}{}",
            "11".repeat(32),
            "00000007",
            "00000000000003e8",
            "0000000000000000",
            "00000001",
            "00000001",
            "44".repeat(20)
        );
        assert_eq!(hex::encode(bytes), expected);
    }

    #[test]
    fn test_stakeable_lock_output_decodes() {
        let output = Output::StakeableLock {
            locktime: 99,
            output: TransferOutput {
                amount: 5,
                owners: OutputOwners::single(AddressId::new([2; 20])),
            },
        };
        let mut packer = Packer::new();
        output.encode(&mut packer);
        let bytes = packer.finish().unwrap();

        let mut unpacker = Unpacker::new(&bytes);
        let decoded = Output::decode(&mut unpacker).unwrap();
        assert_eq!(decoded.stakeable_locktime(), Some(99));
        assert_eq!(decoded.amount(), 5);
    }

    #[test]
    fn test_unknown_output_type_rejected() {
        let bytes = 8u32.to_be_bytes();
        let mut unpacker = Unpacker::new(&bytes);
        assert_eq!(
            Output::decode(&mut unpacker).unwrap_err(),
            CodecError::UnknownTypeId {
                context: "output",
                type_id: 8
            }
        );
    }

    #[test]
    fn test_utxo_id_text() {
        let utxo_id = UtxoId::new(TxId::new([6; 32]), 3);
        let text = utxo_id.to_string();
        assert!(text.ends_with(":3"));
        assert_eq!(text.parse::<UtxoId>().unwrap(), utxo_id);
        assert!("no-index".parse::<UtxoId>().is_err());
        assert!(format!("{}:x", TxId::new([6; 32])).parse::<UtxoId>().is_err());
    }

    #[test]
    fn test_input_sort_is_content_order() {
        let make = |tx: u8, index: u32| TransferableInput {
            utxo_id: UtxoId::new(TxId::new([tx; 32]), index),
            asset_id: AssetId::new([0x11; 32]),
            input: Input::Transfer(TransferInput {
                amount: 1,
                sig_indices: vec![0],
            }),
        };
        let mut inputs = vec![make(2, 0), make(1, 5), make(1, 2)];
        sort_transferable_inputs(&mut inputs);
        let order: Vec<_> = inputs
            .iter()
            .map(|i| (i.utxo_id.tx_id.as_bytes()[0], i.utxo_id.output_index))
            .collect();
        assert_eq!(order, vec![(1, 2), (1, 5), (2, 0)]);
    }

    #[test]
    fn test_output_sort_is_content_order() {
        let mut a = vec![transfer_output(20, 1), transfer_output(10, 2)];
        let mut b = vec![transfer_output(10, 2), transfer_output(20, 1)];
        sort_transferable_outputs(&mut a);
        sort_transferable_outputs(&mut b);
        assert_eq!(a, b);
        assert_eq!(a[0].output.amount(), 10);
    }

    #[test]
    fn test_credential_rejects_oversized_count() {
        let mut bytes = type_ids::CREDENTIAL.to_be_bytes().to_vec();
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&[0u8; SIGNATURE_LEN]);
        let mut unpacker = Unpacker::new(&bytes);
        assert!(matches!(
            Credential::decode(&mut unpacker),
            Err(CodecError::LengthOverflow { .. })
        ));
    }
}
