//! # Chain Addresses
//!
//! `<chain alias>-<bech32>` rendering of 160-bit address ids.

use crate::errors::FormatError;
use crate::formatting::{bech32_decode, bech32_encode};
use crate::ids::AddressId;

/// Alias of the platform chain.
pub const P_CHAIN_ALIAS: &str = "P";

/// A parsed `<chain>-<hrp>1...` address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainAddress {
    pub chain_alias: String,
    pub hrp: String,
    pub address: AddressId,
}

/// Render `address` for the chain known as `chain_alias`.
pub fn format_address(
    chain_alias: &str,
    hrp: &str,
    address: &AddressId,
) -> Result<String, FormatError> {
    Ok(format!(
        "{}-{}",
        chain_alias,
        bech32_encode(hrp, address.as_bytes())?
    ))
}

/// Parse an address rendered by [`format_address`].
pub fn parse_address(text: &str) -> Result<ChainAddress, FormatError> {
    let (chain_alias, encoded) = text
        .split_once('-')
        .ok_or_else(|| FormatError::MissingChainAlias(text.to_string()))?;
    if chain_alias.is_empty() {
        return Err(FormatError::MissingChainAlias(text.to_string()));
    }
    let (hrp, payload) = bech32_decode(encoded)?;
    Ok(ChainAddress {
        chain_alias: chain_alias.to_string(),
        hrp,
        address: AddressId::from_slice(&payload)?,
    })
}
