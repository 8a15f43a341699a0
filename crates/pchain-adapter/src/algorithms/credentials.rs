//! # Credential Assembler
//!
//! Flat signature list to one credential per signed input.
//!
//! Input `i` consumes exactly `len(sig_indices_i)` signatures from the front
//! of the list. The list must be exhausted when the last input is done.

use pchain_types::{Credential, Signature, TransferableInput, Tx, UnsignedTx, SIGNATURE_LEN};

use crate::domain::AdapterError;

const FIELD: &str = "signatures";

/// Split `signatures` across `inputs` in order.
pub fn assemble_credentials(
    inputs: &[&TransferableInput],
    signatures: &[Vec<u8>],
) -> Result<Vec<Credential>, AdapterError> {
    let required: usize = inputs.iter().map(|i| i.input.sig_indices().len()).sum();
    if signatures.len() != required {
        return Err(AdapterError::invalid(
            FIELD,
            format!("expected {} signatures, got {}", required, signatures.len()),
        ));
    }

    let mut remaining = signatures.iter().enumerate();
    let mut credentials = Vec::with_capacity(inputs.len());
    for input in inputs {
        let mut credential = Credential::default();
        for (position, raw) in remaining.by_ref().take(input.input.sig_indices().len()) {
            let signature: Signature = raw.as_slice().try_into().map_err(|_| {
                AdapterError::invalid_op(
                    position,
                    FIELD,
                    format!("expected {} bytes, got {}", SIGNATURE_LEN, raw.len()),
                )
            })?;
            credential.signatures.push(signature);
        }
        credentials.push(credential);
    }
    Ok(credentials)
}

/// Attach credentials for every signed input of `unsigned`.
pub fn sign_tx(unsigned: UnsignedTx, signatures: &[Vec<u8>]) -> Result<Tx, AdapterError> {
    let credentials = assemble_credentials(&unsigned.signed_inputs(), signatures)?;
    Ok(Tx {
        unsigned,
        credentials,
    })
}
