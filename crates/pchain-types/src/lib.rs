//! # P-Chain Types Crate
//!
//! Native records of the platform chain and the formats they travel in.
//!
//! ## Design Principles
//!
//! - **Bytes are authoritative**: every record has a hand-written `Encode` and
//!   `Decode` over the linear codec, so ids computed here match the node's.
//! - **Canonical order lives with the data**: owner addresses, inputs and
//!   outputs carry their own sort rules.
//! - **Text forms are checked**: CB58 checksums and bech32 checksums are
//!   verified on every parse.
//!
//! ## Module Structure
//!
//! ```text
//! pchain-types/
//! ├── codec        # Packer/Unpacker, versioning, type ids
//! ├── formatting   # CB58, bech32, network HRPs
//! ├── ids          # Id, ShortId, NodeId
//! ├── address      # <chain>-<bech32> addresses
//! ├── components   # owners, outputs, inputs, UTXOs, credentials
//! ├── txs          # UnsignedTx union, signed Tx
//! ├── blocks       # Apricot and Banff block variants
//! └── genesis      # platform genesis record
//! ```

#![warn(clippy::all)]

pub mod address;
pub mod blocks;
pub mod codec;
pub mod components;
pub mod errors;
pub mod formatting;
pub mod genesis;
pub mod ids;
pub mod txs;

pub use address::{format_address, parse_address, ChainAddress, P_CHAIN_ALIAS};
pub use blocks::{Block, BlockKind, CommonBlock};
pub use codec::{marshal, unmarshal, Decode, Encode, Packer, Unpacker, CODEC_VERSION};
pub use components::{
    sort_transferable_inputs, sort_transferable_outputs, Credential, Input, Output,
    OutputOwners, Signature, SubnetAuth, TransferInput, TransferOutput, TransferableInput,
    TransferableOutput, Utxo, UtxoId, SIGNATURE_LEN,
};
pub use errors::{CodecError, FormatError};
pub use formatting::{hrp_for_network, FUJI_ID, LOCAL_ID, MAINNET_ID};
pub use genesis::{GenesisUtxo, PlatformGenesis};
pub use ids::{
    AddressId, AssetId, BlockId, ChainId, Id, NodeId, ShortId, SubnetId, TxId, NODE_ID_PREFIX,
};
pub use txs::{
    AddDelegatorTx, AddSubnetValidatorTx, AddValidatorTx, AdvanceTimeTx, BaseTx, CreateChainTx,
    CreateSubnetTx, ExportTx, ImportTx, RewardValidatorTx, SealedTx, Tx, TxKind, UnsignedTx,
    Validator,
};
