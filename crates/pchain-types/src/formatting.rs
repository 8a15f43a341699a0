//! # Text Formats
//!
//! CB58 for identifiers and bech32 for addresses.
//!
//! Addresses render as `<chain alias>-<bech32(hrp, address bytes)>`, e.g.
//! `P-fuji1...`. The human-readable part depends on the network id.

use sha2::{Digest, Sha256};

use crate::errors::FormatError;

/// Mainnet network id.
pub const MAINNET_ID: u32 = 1;
/// Fuji testnet network id.
pub const FUJI_ID: u32 = 5;
/// Local network id.
pub const LOCAL_ID: u32 = 12345;

/// Bech32 human-readable part for a network.
pub fn hrp_for_network(network_id: u32) -> &'static str {
    match network_id {
        MAINNET_ID => "avax",
        FUJI_ID => "fuji",
        LOCAL_ID => "local",
        _ => "custom",
    }
}

// =============================================================================
// CB58
// =============================================================================

const CHECKSUM_LEN: usize = 4;

/// Base58 of `bytes` followed by the last four bytes of their SHA-256.
pub fn encode_cb58(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut payload = Vec::with_capacity(bytes.len() + CHECKSUM_LEN);
    payload.extend_from_slice(bytes);
    payload.extend_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
    bs58::encode(payload).into_string()
}

/// Inverse of [`encode_cb58`]; verifies the checksum.
pub fn decode_cb58(text: &str) -> Result<Vec<u8>, FormatError> {
    let raw = bs58::decode(text)
        .into_vec()
        .map_err(|e| FormatError::InvalidBase58(e.to_string()))?;
    if raw.len() < CHECKSUM_LEN {
        return Err(FormatError::InvalidLength {
            expected: CHECKSUM_LEN,
            actual: raw.len(),
        });
    }
    let (payload, checksum) = raw.split_at(raw.len() - CHECKSUM_LEN);
    let digest = Sha256::digest(payload);
    if checksum != &digest[digest.len() - CHECKSUM_LEN..] {
        return Err(FormatError::InvalidChecksum);
    }
    Ok(payload.to_vec())
}

// =============================================================================
// BECH32
// =============================================================================

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const GENERATOR: [u32; 5] = [
    0x3b6a_57b2,
    0x2650_8e6d,
    0x1ea1_19fa,
    0x3d42_33dd,
    0x2a14_62b3,
];
const BECH32_CHECKSUM_LEN: usize = 6;

fn polymod(values: &[u8]) -> u32 {
    let mut chk: u32 = 1;
    for value in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ u32::from(*value);
        for (i, generator) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= generator;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let bytes = hrp.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() * 2 + 1);
    out.extend(bytes.iter().map(|b| b >> 5));
    out.push(0);
    out.extend(bytes.iter().map(|b| b & 0x1f));
    out
}

fn checksum(hrp: &str, data: &[u8]) -> [u8; BECH32_CHECKSUM_LEN] {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0u8; BECH32_CHECKSUM_LEN]);
    let pm = polymod(&values) ^ 1;
    let mut out = [0u8; BECH32_CHECKSUM_LEN];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = ((pm >> (5 * (5 - i))) & 0x1f) as u8;
    }
    out
}

/// Regroup a bit stream from `from`-bit to `to`-bit words.
fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Result<Vec<u8>, FormatError> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let max = (1u32 << to) - 1;
    let max_acc = (1u32 << (from + to - 1)) - 1;
    let mut out = Vec::with_capacity(data.len() * from as usize / to as usize + 1);
    for value in data {
        let value = u32::from(*value);
        if value >> from != 0 {
            return Err(FormatError::InvalidBech32("value out of range".to_string()));
        }
        acc = ((acc << from) | value) & max_acc;
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & max) as u8);
        }
    }
    if pad {
        if bits > 0 {
            out.push(((acc << (to - bits)) & max) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & max) != 0 {
        return Err(FormatError::InvalidBech32("invalid padding".to_string()));
    }
    Ok(out)
}

/// Bech32-encode 8-bit `payload` under `hrp`.
pub fn bech32_encode(hrp: &str, payload: &[u8]) -> Result<String, FormatError> {
    let data = convert_bits(payload, 8, 5, true)?;
    let check = checksum(hrp, &data);
    let mut out = String::with_capacity(hrp.len() + 1 + data.len() + BECH32_CHECKSUM_LEN);
    out.push_str(hrp);
    out.push('1');
    for value in data.iter().chain(check.iter()) {
        out.push(CHARSET[*value as usize] as char);
    }
    Ok(out)
}

/// Decode a bech32 string into its hrp and 8-bit payload.
pub fn bech32_decode(text: &str) -> Result<(String, Vec<u8>), FormatError> {
    let has_lower = text.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = text.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(FormatError::InvalidBech32("mixed case".to_string()));
    }
    let text = text.to_ascii_lowercase();
    let separator = text
        .rfind('1')
        .ok_or_else(|| FormatError::InvalidBech32("missing separator".to_string()))?;
    if separator == 0 || separator + 1 + BECH32_CHECKSUM_LEN > text.len() {
        return Err(FormatError::InvalidBech32("invalid separator position".to_string()));
    }
    let (hrp, rest) = text.split_at(separator);
    let mut data = Vec::with_capacity(rest.len() - 1);
    for c in rest[1..].bytes() {
        let value = CHARSET
            .iter()
            .position(|x| *x == c)
            .ok_or_else(|| {
                FormatError::InvalidBech32(format!("invalid character {:?}", c as char))
            })?;
        data.push(value as u8);
    }
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(&data);
    if polymod(&values) != 1 {
        return Err(FormatError::InvalidBech32("checksum mismatch".to_string()));
    }
    data.truncate(data.len() - BECH32_CHECKSUM_LEN);
    let payload = convert_bits(&data, 5, 8, false)?;
    Ok((hrp.to_string(), payload))
}
