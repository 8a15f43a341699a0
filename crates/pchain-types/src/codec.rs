//! # Linear Codec
//!
//! Versioned, order-preserving binary encoding used by the platform chain.
//!
//! ## Layout
//!
//! - Every top-level record starts with a big-endian `u16` codec version.
//! - Integers are big-endian, fixed width.
//! - Interface-typed fields are a `u32` type id followed by the concrete fields.
//! - Slices are a `u32` element count followed by the elements.
//! - Byte slices are a `u32` length followed by the raw bytes.
//! - Strings are a `u16` length followed by UTF-8 bytes.
//! - Fixed-size arrays are written raw.

use crate::errors::CodecError;

/// The only codec version understood by this crate.
pub const CODEC_VERSION: u16 = 0;

/// Registered interface type ids.
pub mod type_ids {
    pub const APRICOT_PROPOSAL_BLOCK: u32 = 0;
    pub const APRICOT_ABORT_BLOCK: u32 = 1;
    pub const APRICOT_COMMIT_BLOCK: u32 = 2;
    pub const APRICOT_STANDARD_BLOCK: u32 = 3;
    pub const APRICOT_ATOMIC_BLOCK: u32 = 4;

    pub const TRANSFER_INPUT: u32 = 5;
    pub const TRANSFER_OUTPUT: u32 = 7;
    pub const CREDENTIAL: u32 = 9;
    pub const SUBNET_AUTH_INPUT: u32 = 10;
    pub const OUTPUT_OWNERS: u32 = 11;

    pub const ADD_VALIDATOR_TX: u32 = 12;
    pub const ADD_SUBNET_VALIDATOR_TX: u32 = 13;
    pub const ADD_DELEGATOR_TX: u32 = 14;
    pub const CREATE_CHAIN_TX: u32 = 15;
    pub const CREATE_SUBNET_TX: u32 = 16;
    pub const IMPORT_TX: u32 = 17;
    pub const EXPORT_TX: u32 = 18;
    pub const ADVANCE_TIME_TX: u32 = 19;
    pub const REWARD_VALIDATOR_TX: u32 = 20;

    pub const STAKEABLE_LOCK_IN: u32 = 21;
    pub const STAKEABLE_LOCK_OUT: u32 = 22;

    pub const BANFF_PROPOSAL_BLOCK: u32 = 29;
    pub const BANFF_ABORT_BLOCK: u32 = 30;
    pub const BANFF_COMMIT_BLOCK: u32 = 31;
    pub const BANFF_STANDARD_BLOCK: u32 = 32;

    pub const BASE_TX: u32 = 34;
}

// =============================================================================
// TRAITS
// =============================================================================

/// A record that can be written by a [`Packer`].
pub trait Encode {
    /// Append this record's fields (no version prefix).
    fn encode(&self, packer: &mut Packer);
}

/// A record that can be read by an [`Unpacker`].
pub trait Decode: Sized {
    /// Read this record's fields (no version prefix).
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError>;
}

/// Encode `value` under `version`.
pub fn marshal<T: Encode + ?Sized>(version: u16, value: &T) -> Result<Vec<u8>, CodecError> {
    if version != CODEC_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let mut packer = Packer::new();
    packer.pack_u16(version);
    value.encode(&mut packer);
    packer.finish()
}

/// Decode a versioned record, rejecting unknown versions and trailing bytes.
pub fn unmarshal<T: Decode>(bytes: &[u8]) -> Result<(u16, T), CodecError> {
    let mut unpacker = Unpacker::new(bytes);
    let version = unpacker.unpack_u16()?;
    if version != CODEC_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let value = T::decode(&mut unpacker)?;
    unpacker.finish()?;
    Ok((version, value))
}

// =============================================================================
// PACKER
// =============================================================================

/// Append-only writer. The first overflow is latched and reported by
/// [`Packer::finish`], so `Encode` impls stay infallible.
#[derive(Debug, Default)]
pub struct Packer {
    bytes: Vec<u8>,
    err: Option<CodecError>,
}

impl Packer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pack_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn pack_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn pack_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn pack_u64(&mut self, value: u64) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Write raw bytes with no length prefix.
    pub fn pack_fixed(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Write a `u32` length followed by `bytes`.
    pub fn pack_bytes(&mut self, bytes: &[u8]) {
        self.pack_len("bytes", bytes.len());
        self.bytes.extend_from_slice(bytes);
    }

    /// Write a `u16` length followed by the UTF-8 bytes of `value`.
    pub fn pack_str(&mut self, value: &str) {
        match u16::try_from(value.len()) {
            Ok(len) => {
                self.pack_u16(len);
                self.bytes.extend_from_slice(value.as_bytes());
            }
            Err(_) => self.latch(CodecError::ValueTooLong {
                field: "string",
                len: value.len(),
            }),
        }
    }

    /// Write a `u32` count followed by each element.
    pub fn pack_slice<T: Encode>(&mut self, items: &[T]) {
        self.pack_len("slice", items.len());
        for item in items {
            item.encode(self);
        }
    }

    /// Write a `u32` element count.
    pub fn pack_count(&mut self, len: usize) {
        self.pack_len("slice", len);
    }

    fn pack_len(&mut self, field: &'static str, len: usize) {
        match u32::try_from(len) {
            Ok(len) => self.pack_u32(len),
            Err(_) => self.latch(CodecError::ValueTooLong { field, len }),
        }
    }

    fn latch(&mut self, err: CodecError) {
        if self.err.is_none() {
            self.err = Some(err);
        }
    }

    /// Bytes written so far.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume the packer, surfacing the first latched error.
    pub fn finish(self) -> Result<Vec<u8>, CodecError> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(self.bytes),
        }
    }
}

// =============================================================================
// UNPACKER
// =============================================================================

/// Cursor over an input buffer.
#[derive(Debug)]
pub struct Unpacker<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Unpacker<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], CodecError> {
        if needed > self.remaining() {
            return Err(CodecError::UnexpectedEof {
                needed,
                offset: self.offset,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + needed];
        self.offset += needed;
        Ok(slice)
    }

    pub fn unpack_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn unpack_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_be_bytes(self.unpack_fixed::<2>()?))
    }

    pub fn unpack_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_be_bytes(self.unpack_fixed::<4>()?))
    }

    pub fn unpack_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_be_bytes(self.unpack_fixed::<8>()?))
    }

    /// Read exactly `N` raw bytes.
    pub fn unpack_fixed<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a `u32`-prefixed byte slice.
    pub fn unpack_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.unpack_u32()? as usize;
        if len > self.remaining() {
            return Err(CodecError::LengthOverflow {
                len,
                remaining: self.remaining(),
            });
        }
        Ok(self.take(len)?.to_vec())
    }

    /// Read a `u16`-prefixed UTF-8 string.
    pub fn unpack_str(&mut self) -> Result<String, CodecError> {
        let len = self.unpack_u16()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidString)
    }

    /// Read a `u32`-counted slice of `T`.
    ///
    /// Every element occupies at least one byte, so a count larger than the
    /// remaining input is rejected before allocating.
    pub fn unpack_slice<T: Decode>(&mut self) -> Result<Vec<T>, CodecError> {
        let count = self.unpack_u32()? as usize;
        if count > self.remaining() {
            return Err(CodecError::LengthOverflow {
                len: count,
                remaining: self.remaining(),
            });
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::decode(self)?);
        }
        Ok(items)
    }

    /// Fail if any input is left unread.
    pub fn finish(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}

impl Encode for u32 {
    fn encode(&self, packer: &mut Packer) {
        packer.pack_u32(*self);
    }
}

impl Decode for u32 {
    fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        unpacker.unpack_u32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Sample {
        a: u32,
        name: String,
        data: Vec<u8>,
        list: Vec<u32>,
    }

    impl Encode for Sample {
        fn encode(&self, packer: &mut Packer) {
            packer.pack_u32(self.a);
            packer.pack_str(&self.name);
            packer.pack_bytes(&self.data);
            packer.pack_slice(&self.list);
        }
    }

    impl Decode for Sample {
        fn decode(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
            Ok(Self {
                a: unpacker.unpack_u32()?,
                name: unpacker.unpack_str()?,
                data: unpacker.unpack_bytes()?,
                list: unpacker.unpack_slice()?,
            })
        }
    }

    fn sample() -> Sample {
        Sample {
            a: 7,
            name: "ab".to_string(),
            data: vec![0xff],
            list: vec![1, 2],
        }
    }

    #[test]
    fn test_marshal_layout_is_big_endian() {
        let bytes = marshal(CODEC_VERSION, &sample()).unwrap();
        assert_eq!(
            hex::encode(&bytes),
            "0000\
             00000007\
             00026162\
             00000001ff\
             000000020000000100000002"
        );
    }

    #[test]
    fn test_unmarshal_reads_back() {
        let bytes = marshal(CODEC_VERSION, &sample()).unwrap();
        let (version, decoded) = unmarshal::<Sample>(&bytes).unwrap();
        assert_eq!(version, CODEC_VERSION);
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_unsupported_version_rejected() {
        assert_eq!(
            marshal(1, &sample()),
            Err(CodecError::UnsupportedVersion(1))
        );

        let mut bytes = marshal(CODEC_VERSION, &sample()).unwrap();
        bytes[1] = 0x01;
        assert!(matches!(
            unmarshal::<Sample>(&bytes),
            Err(CodecError::UnsupportedVersion(1))
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = marshal(CODEC_VERSION, &sample()).unwrap();
        bytes.push(0);
        assert_eq!(
            unmarshal::<Sample>(&bytes).unwrap_err(),
            CodecError::TrailingBytes(1)
        );
    }

    #[test]
    fn test_truncated_input_rejected() {
        let bytes = marshal(CODEC_VERSION, &sample()).unwrap();
        let err = unmarshal::<Sample>(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_oversized_length_prefix_rejected() {
        let mut unpacker = Unpacker::new(&[0xff, 0xff, 0xff, 0xff, 0x00]);
        assert!(matches!(
            unpacker.unpack_bytes(),
            Err(CodecError::LengthOverflow { .. })
        ));
    }
}
