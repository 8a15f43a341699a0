//! # Platform Genesis
//!
//! The platform chain's genesis state: initial UTXOs, the validator set and
//! the chains created at launch.

use crate::codec::{marshal, unmarshal, Decode, Encode, Packer, Unpacker, CODEC_VERSION};
use crate::components::Utxo;
use crate::errors::CodecError;
use crate::txs::Tx;

/// An initial allocation and its free-form message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisUtxo {
    pub utxo: Utxo,
    pub message: Vec<u8>,
}

impl Encode for GenesisUtxo {
    fn encode(&self, packer: &mut Packer) {
        self.utxo.encode(packer);
        packer.pack_bytes(&self.message);
    }
}

impl Decode for GenesisUtxo {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            utxo: Utxo::decode(unpacker)?,
            message: unpacker.unpack_bytes()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformGenesis {
    pub utxos: Vec<GenesisUtxo>,
    /// Initial validator registrations.
    pub validators: Vec<Tx>,
    /// Chain-creation records.
    pub chains: Vec<Tx>,
    /// Unix seconds.
    pub timestamp: u64,
    pub initial_supply: u64,
    pub message: String,
}

impl PlatformGenesis {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        unmarshal(bytes).map(|(_, genesis)| genesis)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        marshal(CODEC_VERSION, self)
    }

    /// Validators followed by chains.
    pub fn txs(&self) -> impl Iterator<Item = &Tx> {
        self.validators.iter().chain(self.chains.iter())
    }
}

impl Encode for PlatformGenesis {
    fn encode(&self, packer: &mut Packer) {
        packer.pack_slice(&self.utxos);
        packer.pack_slice(&self.validators);
        packer.pack_slice(&self.chains);
        packer.pack_u64(self.timestamp);
        packer.pack_u64(self.initial_supply);
        packer.pack_str(&self.message);
    }
}

impl Decode for PlatformGenesis {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            utxos: unpacker.unpack_slice()?,
            validators: unpacker.unpack_slice()?,
            chains: unpacker.unpack_slice()?,
            timestamp: unpacker.unpack_u64()?,
            initial_supply: unpacker.unpack_u64()?,
            message: unpacker.unpack_str()?,
        })
    }
}
