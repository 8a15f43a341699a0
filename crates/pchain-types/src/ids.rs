//! # Identifiers
//!
//! Content-derived 256-bit ids (blocks, transactions, assets, chains) and
//! 160-bit short ids (addresses, node ids).
//!
//! All ids order lexicographically by their bytes, which is the canonical
//! order used when sorting inputs and owner addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::codec::{Decode, Encode, Packer, Unpacker};
use crate::errors::{CodecError, FormatError};
use crate::formatting::{decode_cb58, encode_cb58};

/// Prefix used when rendering node ids.
pub const NODE_ID_PREFIX: &str = "NodeID-";

// =============================================================================
// 256-BIT IDS
// =============================================================================

/// A 256-bit identifier, the SHA-256 of some canonical encoding.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id([u8; 32]);

/// Block id: SHA-256 of the payload block bytes.
pub type BlockId = Id;
/// Transaction id: SHA-256 of the signed transaction bytes.
pub type TxId = Id;
/// Asset id.
pub type AssetId = Id;
/// Blockchain id.
pub type ChainId = Id;
/// Subnet id.
pub type SubnetId = Id;

impl Id {
    /// The all-zero id. Also the platform chain's own blockchain id.
    pub const EMPTY: Id = Id([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// SHA-256 of `content`.
    pub fn from_content(content: &[u8]) -> Self {
        Self(Sha256::digest(content).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, FormatError> {
        let array: [u8; 32] = bytes.try_into().map_err(|_| FormatError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(array))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_cb58(&self.0))
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self)
    }
}

impl FromStr for Id {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slice(&decode_cb58(s)?)
    }
}

impl Encode for Id {
    fn encode(&self, packer: &mut Packer) {
        packer.pack_fixed(&self.0);
    }
}

impl Decode for Id {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self(unpacker.unpack_fixed::<32>()?))
    }
}

// =============================================================================
// 160-BIT IDS
// =============================================================================

/// A 160-bit identifier, used for address ids.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortId([u8; 20]);

/// Address id: 160-bit hash of a public key.
pub type AddressId = ShortId;

impl ShortId {
    pub const EMPTY: ShortId = ShortId([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, FormatError> {
        let array: [u8; 20] = bytes.try_into().map_err(|_| FormatError::InvalidLength {
            expected: 20,
            actual: bytes.len(),
        })?;
        Ok(Self(array))
    }
}

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_cb58(&self.0))
    }
}

impl fmt::Debug for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShortId({})", self)
    }
}

impl FromStr for ShortId {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slice(&decode_cb58(s)?)
    }
}

impl Encode for ShortId {
    fn encode(&self, packer: &mut Packer) {
        packer.pack_fixed(&self.0);
    }
}

impl Decode for ShortId {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self(unpacker.unpack_fixed::<20>()?))
    }
}

/// Node id: 160-bit id rendered as `NodeID-<cb58>`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(ShortId);

impl NodeId {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(ShortId::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        self.0.as_bytes()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", NODE_ID_PREFIX, self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for NodeId {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix(NODE_ID_PREFIX)
            .ok_or_else(|| FormatError::InvalidNodeId(s.to_string()))?;
        Ok(Self(body.parse()?))
    }
}

impl Encode for NodeId {
    fn encode(&self, packer: &mut Packer) {
        self.0.encode(packer);
    }
}

impl Decode for NodeId {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self(ShortId::decode(unpacker)?))
    }
}

// =============================================================================
// SERDE (text form)
// =============================================================================

macro_rules! impl_text_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_text_serde!(Id);
impl_text_serde!(ShortId);
impl_text_serde!(NodeId);
