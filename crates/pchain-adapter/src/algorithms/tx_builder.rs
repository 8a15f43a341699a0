//! # Transaction Builder
//!
//! Matched operations plus construction metadata to an unsigned native
//! transaction and the accounts that must sign it.
//!
//! ## Canonical Form
//!
//! - Inputs sorted by (tx id, output index).
//! - Outputs sorted by their encoded bytes.
//! - Owner addresses sorted ascending, duplicates dropped.
//!
//! Building the same logical set in any order therefore yields identical
//! bytes.

use pchain_types::{
    hrp_for_network, parse_address, sort_transferable_outputs, AddDelegatorTx, AddValidatorTx,
    AddressId, AssetId, BaseTx, ExportTx, ImportTx,
    Input, Output, OutputOwners, TransferInput, TransferOutput, TransferableInput,
    TransferableOutput, UnsignedTx, UtxoId, Validator,
};
use serde_json::Value;

use super::strategies::strategy_for_type;
use crate::domain::{
    keys, AdapterError, BuiltTransaction, CoinAction, ConstructionMetadata, MatchedOperations,
    Operation, SignerAccount, StakingMetadata, SubRole,
};

/// Build through the variant's registered strategy.
pub fn build_tx(
    matched: &MatchedOperations,
    metadata: &ConstructionMetadata,
) -> Result<BuiltTransaction, AdapterError> {
    let strategy = strategy_for_type(matched.op_type);
    let build = strategy
        .build
        .ok_or_else(|| AdapterError::UnsupportedOperation(matched.op_type.to_string()))?;
    build(matched, metadata)
}

// =============================================================================
// VARIANTS
// =============================================================================

pub(crate) fn build_base(
    matched: &MatchedOperations,
    metadata: &ConstructionMetadata,
) -> Result<BuiltTransaction, AdapterError> {
    let draft = Draft::assemble(matched, metadata, Roles::BASE)?;
    Ok(draft.finish(UnsignedTx::Base))
}

pub(crate) fn build_import(
    matched: &MatchedOperations,
    metadata: &ConstructionMetadata,
) -> Result<BuiltTransaction, AdapterError> {
    let source_chain = metadata
        .source_chain_id
        .ok_or_else(|| AdapterError::invalid(keys::SOURCE_CHAIN_ID, "required for import"))?;
    let mut draft = Draft::assemble(matched, metadata, Roles::IMPORT)?;
    let imported_inputs = std::mem::take(&mut draft.extra_inputs);
    Ok(draft.finish(|base| {
        UnsignedTx::Import(ImportTx {
            base,
            source_chain,
            imported_inputs,
        })
    }))
}

pub(crate) fn build_export(
    matched: &MatchedOperations,
    metadata: &ConstructionMetadata,
) -> Result<BuiltTransaction, AdapterError> {
    let destination_chain = metadata.destination_chain_id.ok_or_else(|| {
        AdapterError::invalid(keys::DESTINATION_CHAIN_ID, "required for export")
    })?;
    let mut draft = Draft::assemble(matched, metadata, Roles::EXPORT)?;
    let exported_outputs = std::mem::take(&mut draft.extra_outputs);
    Ok(draft.finish(|base| {
        UnsignedTx::Export(ExportTx {
            base,
            destination_chain,
            exported_outputs,
        })
    }))
}

pub(crate) fn build_add_validator(
    matched: &MatchedOperations,
    metadata: &ConstructionMetadata,
) -> Result<BuiltTransaction, AdapterError> {
    let staking = staking_params(metadata)?;
    let shares = staking
        .shares
        .ok_or_else(|| AdapterError::invalid(keys::SHARES, "required for validators"))?;
    let mut draft = Draft::assemble(matched, metadata, Roles::STAKING)?;
    let stake = std::mem::take(&mut draft.extra_outputs);
    let validator = validator(staking, &stake)?;
    let rewards_owner = rewards_owner(staking, metadata.network_id)?;
    Ok(draft.finish(|base| {
        UnsignedTx::AddValidator(AddValidatorTx {
            base,
            validator,
            stake,
            rewards_owner,
            shares,
        })
    }))
}

pub(crate) fn build_add_delegator(
    matched: &MatchedOperations,
    metadata: &ConstructionMetadata,
) -> Result<BuiltTransaction, AdapterError> {
    let staking = staking_params(metadata)?;
    let mut draft = Draft::assemble(matched, metadata, Roles::STAKING)?;
    let stake = std::mem::take(&mut draft.extra_outputs);
    let validator = validator(staking, &stake)?;
    let rewards_owner = rewards_owner(staking, metadata.network_id)?;
    Ok(draft.finish(|base| {
        UnsignedTx::AddDelegator(AddDelegatorTx {
            base,
            validator,
            stake,
            rewards_owner,
        })
    }))
}

fn staking_params(metadata: &ConstructionMetadata) -> Result<&StakingMetadata, AdapterError> {
    metadata
        .staking
        .as_ref()
        .ok_or_else(|| AdapterError::invalid("staking", "required for staking transactions"))
}

fn validator(
    staking: &StakingMetadata,
    stake: &[TransferableOutput],
) -> Result<Validator, AdapterError> {
    if stake.is_empty() {
        return Err(AdapterError::invalid(keys::WEIGHT, "no stake outputs"));
    }
    if staking.end_time <= staking.start_time {
        return Err(AdapterError::invalid(
            keys::END_TIME,
            "must be after start time",
        ));
    }
    let weight = stake.iter().try_fold(0u64, |sum, output| {
        sum.checked_add(output.output.amount())
            .ok_or_else(|| AdapterError::invalid(keys::WEIGHT, "stake amount overflow"))
    })?;
    Ok(Validator {
        node_id: staking.node_id,
        start_time: staking.start_time,
        end_time: staking.end_time,
        weight,
    })
}

fn rewards_owner(staking: &StakingMetadata, network_id: u32) -> Result<OutputOwners, AdapterError> {
    if staking.reward_addresses.is_empty() {
        return Err(AdapterError::invalid(keys::REWARD_ADDRESSES, "empty"));
    }
    let addresses = staking
        .reward_addresses
        .iter()
        .map(|text| {
            parse_owner_address(text, network_id)
                .map_err(|reason| AdapterError::invalid(keys::REWARD_ADDRESSES, reason))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(OutputOwners::new(
        staking.reward_locktime,
        staking.reward_threshold,
        addresses,
    ))
}

// =============================================================================
// DRAFT
// =============================================================================

/// Which sub-roles a variant accepts, and the default when none is given.
#[derive(Debug, Clone, Copy)]
struct Roles {
    spend_default: SubRole,
    /// Spend role routed to `extra_inputs`.
    spend_extra: Option<SubRole>,
    create_default: SubRole,
    /// Create role routed to `extra_outputs`.
    create_extra: Option<SubRole>,
}

impl Roles {
    const BASE: Roles = Roles {
        spend_default: SubRole::Input,
        spend_extra: None,
        create_default: SubRole::Output,
        create_extra: None,
    };
    const IMPORT: Roles = Roles {
        spend_default: SubRole::Import,
        spend_extra: Some(SubRole::Import),
        create_default: SubRole::Output,
        create_extra: None,
    };
    const EXPORT: Roles = Roles {
        spend_default: SubRole::Input,
        spend_extra: None,
        create_default: SubRole::Export,
        create_extra: Some(SubRole::Export),
    };
    const STAKING: Roles = Roles {
        spend_default: SubRole::Input,
        spend_extra: None,
        create_default: SubRole::Stake,
        create_extra: Some(SubRole::Stake),
    };
}

/// A spend paired with the account that signs it, so the pair survives sorting.
struct SignedInput {
    input: TransferableInput,
    account: String,
}

/// Common body plus the variant's extra inputs or outputs, all canonical.
struct Draft {
    base: BaseTx,
    extra_inputs: Vec<TransferableInput>,
    extra_outputs: Vec<TransferableOutput>,
    signers: Vec<SignerAccount>,
}

impl Draft {
    fn assemble(
        matched: &MatchedOperations,
        metadata: &ConstructionMetadata,
        roles: Roles,
    ) -> Result<Self, AdapterError> {
        let mut inputs = Vec::new();
        let mut extra_inputs = Vec::new();
        for op in &matched.spends {
            let index = op.index;
            let role = read_role(op, index, roles.spend_default)?;
            let signed = read_spend(op, index, metadata.asset_id)?;
            if Some(role) == roles.spend_extra {
                extra_inputs.push(signed);
            } else if role == SubRole::Input {
                inputs.push(signed);
            } else {
                return Err(wrong_role(index, role, matched));
            }
        }

        let mut outputs = Vec::new();
        let mut extra_outputs = Vec::new();
        for op in &matched.creates {
            let index = op.index;
            let role = read_role(op, index, roles.create_default)?;
            let output = read_create(op, index, metadata)?;
            if Some(role) == roles.create_extra {
                extra_outputs.push(output);
            } else if role == SubRole::Output {
                outputs.push(output);
            } else {
                return Err(wrong_role(index, role, matched));
            }
        }

        inputs.sort_by(|a, b| a.input.utxo_id.cmp(&b.input.utxo_id));
        extra_inputs.sort_by(|a, b| a.input.utxo_id.cmp(&b.input.utxo_id));
        sort_transferable_outputs(&mut outputs);
        sort_transferable_outputs(&mut extra_outputs);

        let signers = inputs
            .iter()
            .chain(extra_inputs.iter())
            .map(|signed| SignerAccount {
                coin_identifier: signed.input.utxo_id.to_string(),
                address: signed.account.clone(),
            })
            .collect();
        let base_inputs = inputs.into_iter().map(|signed| signed.input).collect();
        let extra_inputs = extra_inputs.into_iter().map(|signed| signed.input).collect();

        Ok(Self {
            base: BaseTx {
                network_id: metadata.network_id,
                blockchain_id: metadata.blockchain_id,
                outputs,
                inputs: base_inputs,
                memo: read_memo(metadata)?,
            },
            extra_inputs,
            extra_outputs,
            signers,
        })
    }

    fn finish(self, wrap: impl FnOnce(BaseTx) -> UnsignedTx) -> BuiltTransaction {
        BuiltTransaction {
            tx: wrap(self.base),
            signers: self.signers,
        }
    }
}

// =============================================================================
// OPERATION READERS
// =============================================================================

fn wrong_role(index: usize, role: SubRole, matched: &MatchedOperations) -> AdapterError {
    AdapterError::invalid_op(
        index,
        keys::TYPE,
        format!("{} is not valid for {}", role, matched.op_type),
    )
}

fn read_role(op: &Operation, index: usize, default: SubRole) -> Result<SubRole, AdapterError> {
    match op.metadata.get(keys::TYPE) {
        None => Ok(default),
        Some(Value::String(text)) => SubRole::parse(text).ok_or_else(|| {
            AdapterError::invalid_op(index, keys::TYPE, format!("unknown role {}", text))
        }),
        Some(_) => Err(AdapterError::invalid_op(index, keys::TYPE, "must be a string")),
    }
}

fn read_u64(op: &Operation, index: usize, key: &str, default: u64) -> Result<u64, AdapterError> {
    match op.metadata.get(key) {
        None => Ok(default),
        Some(value) => value
            .as_u64()
            .ok_or_else(|| AdapterError::invalid_op(index, key, "must be an unsigned integer")),
    }
}

fn read_u32(op: &Operation, index: usize, key: &str, default: u32) -> Result<u32, AdapterError> {
    let value = read_u64(op, index, key, u64::from(default))?;
    u32::try_from(value).map_err(|_| AdapterError::invalid_op(index, key, "out of range"))
}

fn read_sig_indices(op: &Operation, index: usize) -> Result<Vec<u32>, AdapterError> {
    let Some(value) = op.metadata.get(keys::SIG_INDICES) else {
        return Ok(vec![0]);
    };
    let invalid = || AdapterError::invalid_op(index, keys::SIG_INDICES, "must be a list of u32");
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|v| v.as_u64().and_then(|n| u32::try_from(n).ok()).ok_or_else(invalid))
        .collect()
}

fn read_amount(op: &Operation, index: usize) -> Result<u64, AdapterError> {
    let amount = op
        .amount
        .ok_or_else(|| AdapterError::invalid_op(index, keys::AMOUNT, "missing"))?;
    u64::try_from(amount.unsigned_abs())
        .map_err(|_| AdapterError::invalid_op(index, keys::AMOUNT, "out of range"))
}

fn read_spend(
    op: &Operation,
    index: usize,
    asset_id: AssetId,
) -> Result<SignedInput, AdapterError> {
    let coin = op
        .coin_change
        .as_ref()
        .filter(|c| c.coin_action == CoinAction::CoinSpent)
        .ok_or_else(|| AdapterError::invalid_op(index, "coin_change", "spent coin required"))?;
    let utxo_id: UtxoId = coin
        .coin_identifier
        .parse()
        .map_err(|e| AdapterError::invalid_op(index, "coin_change", format!("{}", e)))?;
    let account = op
        .account
        .clone()
        .ok_or_else(|| AdapterError::invalid_op(index, keys::ACCOUNT, "required on spends"))?;

    let transfer = TransferInput {
        amount: read_amount(op, index)?,
        sig_indices: read_sig_indices(op, index)?,
    };
    let input = match read_u64(op, index, keys::STAKEABLE_LOCKTIME, 0)? {
        0 => Input::Transfer(transfer),
        locktime => Input::StakeableLock {
            locktime,
            input: transfer,
        },
    };
    Ok(SignedInput {
        input: TransferableInput {
            utxo_id,
            asset_id,
            input,
        },
        account,
    })
}

fn read_create(
    op: &Operation,
    index: usize,
    metadata: &ConstructionMetadata,
) -> Result<TransferableOutput, AdapterError> {
    let addresses = match op.metadata.get(keys::ADDRESSES) {
        Some(Value::Array(list)) => list
            .iter()
            .map(|v| {
                v.as_str()
                    .ok_or_else(|| "must be strings".to_string())
                    .and_then(|text| parse_owner_address(text, metadata.network_id))
                    .map_err(|reason| AdapterError::invalid_op(index, keys::ADDRESSES, reason))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(AdapterError::invalid_op(index, keys::ADDRESSES, "must be a list"))
        }
        None => {
            let account = op
                .account
                .as_deref()
                .ok_or_else(|| AdapterError::invalid_op(index, keys::ACCOUNT, "owner required"))?;
            let address = parse_owner_address(account, metadata.network_id)
                .map_err(|reason| AdapterError::invalid_op(index, keys::ACCOUNT, reason))?;
            vec![address]
        }
    };
    let owners = OutputOwners::new(
        read_u64(op, index, keys::LOCKTIME, 0)?,
        read_u32(op, index, keys::THRESHOLD, 1)?,
        addresses,
    );
    if owners.threshold as usize > owners.addresses.len() {
        return Err(AdapterError::invalid_op(
            index,
            keys::THRESHOLD,
            "exceeds the number of addresses",
        ));
    }
    let transfer = TransferOutput {
        amount: read_amount(op, index)?,
        owners,
    };
    let output = match read_u64(op, index, keys::STAKEABLE_LOCKTIME, 0)? {
        0 => Output::Transfer(transfer),
        locktime => Output::StakeableLock {
            locktime,
            output: transfer,
        },
    };
    Ok(TransferableOutput {
        asset_id: metadata.asset_id,
        output,
    })
}

/// Parse `<chain>-<bech32>` and check it belongs to this network.
fn parse_owner_address(text: &str, network_id: u32) -> Result<AddressId, String> {
    let parsed = parse_address(text).map_err(|e| e.to_string())?;
    let expected = hrp_for_network(network_id);
    if parsed.hrp != expected {
        return Err(format!(
            "address prefix {} does not match network prefix {}",
            parsed.hrp, expected
        ));
    }
    Ok(parsed.address)
}

fn read_memo(metadata: &ConstructionMetadata) -> Result<Vec<u8>, AdapterError> {
    match metadata.memo.as_deref() {
        None | Some("") => Ok(Vec::new()),
        Some(text) => {
            hex::decode(text).map_err(|e| AdapterError::invalid(keys::MEMO, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CoinChange, OperationType};
    use pchain_types::{format_address, ChainId, NodeId, TxId};
    use serde_json::json;

    fn test_metadata() -> ConstructionMetadata {
        ConstructionMetadata {
            network_id: 5,
            blockchain_id: ChainId::EMPTY,
            asset_id: AssetId::new([0x11; 32]),
            memo: None,
            source_chain_id: None,
            destination_chain_id: None,
            staking: None,
        }
    }

    fn address(byte: u8) -> String {
        format_address("P", "fuji", &AddressId::new([byte; 20])).unwrap()
    }

    fn spend(index: usize, op_type: OperationType, tx: u8, out: u32, amount: i128) -> Operation {
        let mut op = Operation::new(index, op_type);
        op.amount = Some(-amount);
        op.account = Some(address(0xaa));
        op.coin_change = Some(CoinChange::spent(&UtxoId::new(TxId::new([tx; 32]), out)));
        op
    }

    fn create(index: usize, op_type: OperationType, owner: u8, amount: i128) -> Operation {
        let mut op = Operation::new(index, op_type);
        op.amount = Some(amount);
        op.account = Some(address(owner));
        op
    }

    fn matched(
        op_type: OperationType,
        spends: Vec<Operation>,
        creates: Vec<Operation>,
    ) -> MatchedOperations {
        MatchedOperations {
            op_type,
            spends,
            creates,
        }
    }

    #[test]
    fn test_inputs_sorted_and_signers_follow() {
        let built = build_tx(
            &matched(
                OperationType::Base,
                vec![
                    spend(0, OperationType::Base, 2, 0, 10),
                    spend(1, OperationType::Base, 1, 3, 20),
                ],
                vec![create(2, OperationType::Base, 1, 25)],
            ),
            &test_metadata(),
        )
        .unwrap();
        let UnsignedTx::Base(base) = &built.tx else {
            panic!("expected base tx");
        };
        assert_eq!(base.inputs[0].utxo_id.tx_id, TxId::new([1; 32]));
        assert_eq!(base.inputs[0].input.amount(), 20);
        assert_eq!(
            built.signers[0].coin_identifier,
            base.inputs[0].utxo_id.to_string()
        );
        assert_eq!(built.signers.len(), 2);
    }

    #[test]
    fn test_defaults_applied() {
        let built = build_tx(
            &matched(
                OperationType::Base,
                vec![spend(0, OperationType::Base, 1, 0, 10)],
                vec![create(1, OperationType::Base, 1, 5)],
            ),
            &test_metadata(),
        )
        .unwrap();
        let UnsignedTx::Base(base) = &built.tx else {
            panic!("expected base tx");
        };
        assert_eq!(base.inputs[0].input.sig_indices(), &[0]);
        assert_eq!(base.outputs[0].output.owners().threshold, 1);
        assert_eq!(base.outputs[0].output.owners().locktime, 0);
    }

    #[test]
    fn test_missing_coin_is_validation_error() {
        let mut op = spend(0, OperationType::Base, 1, 0, 10);
        op.coin_change = None;
        let err = build_tx(
            &matched(OperationType::Base, vec![op], vec![]),
            &test_metadata(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AdapterError::Validation { index: Some(0), ref field, .. } if field == "coin_change"
        ));
    }

    #[test]
    fn test_malformed_coin_is_validation_error() {
        let mut op = spend(0, OperationType::Base, 1, 0, 10);
        op.coin_change = Some(CoinChange {
            coin_identifier: "not-a-coin".into(),
            coin_action: CoinAction::CoinSpent,
        });
        assert!(matches!(
            build_tx(&matched(OperationType::Base, vec![op], vec![]), &test_metadata()),
            Err(AdapterError::Validation { index: Some(0), .. })
        ));
    }

    #[test]
    fn test_wrong_network_address_rejected() {
        let mut op = create(1, OperationType::Base, 1, 5);
        op.account = Some(format_address("P", "avax", &AddressId::new([1; 20])).unwrap());
        let err = build_tx(
            &matched(
                OperationType::Base,
                vec![spend(0, OperationType::Base, 1, 0, 10)],
                vec![op],
            ),
            &test_metadata(),
        )
        .unwrap_err();
        assert!(matches!(err, AdapterError::Validation { index: Some(1), .. }));
    }

    #[test]
    fn test_unbuildable_variant_unsupported() {
        let err = build_tx(
            &matched(OperationType::CreateSubnet, vec![], vec![]),
            &test_metadata(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            AdapterError::UnsupportedOperation("CREATE_SUBNET".into())
        );
    }

    #[test]
    fn test_stake_weight_overflow() {
        let mut metadata = test_metadata();
        metadata.staking = Some(StakingMetadata {
            node_id: NodeId::new([1; 20]),
            start_time: 10,
            end_time: 20,
            shares: Some(20_000),
            reward_addresses: vec![address(3)],
            reward_threshold: 1,
            reward_locktime: 0,
        });
        let big = i128::from(u64::MAX);
        let err = build_tx(
            &matched(
                OperationType::AddValidator,
                vec![spend(0, OperationType::AddValidator, 1, 0, 10)],
                vec![
                    create(1, OperationType::AddValidator, 1, big),
                    create(2, OperationType::AddValidator, 2, big),
                ],
            ),
            &metadata,
        )
        .unwrap_err();
        assert!(matches!(err, AdapterError::Validation { ref field, .. } if field == "weight"));
    }

    #[test]
    fn test_import_role_routing() {
        let mut metadata = test_metadata();
        metadata.source_chain_id = Some(ChainId::new([0x22; 32]));
        let mut fee = spend(1, OperationType::ImportAvax, 2, 0, 1);
        fee.metadata.insert(keys::TYPE.into(), json!("INPUT"));
        let built = build_tx(
            &matched(
                OperationType::ImportAvax,
                vec![spend(0, OperationType::ImportAvax, 1, 0, 10), fee],
                vec![create(2, OperationType::ImportAvax, 1, 9)],
            ),
            &metadata,
        )
        .unwrap();
        let UnsignedTx::Import(import) = &built.tx else {
            panic!("expected import tx");
        };
        assert_eq!(import.base.inputs.len(), 1);
        assert_eq!(import.imported_inputs.len(), 1);
        assert_eq!(import.base.inputs[0].utxo_id.tx_id, TxId::new([2; 32]));
        // Base inputs sign first.
        assert_eq!(
            built.signers[0].coin_identifier,
            import.base.inputs[0].utxo_id.to_string()
        );
    }

    #[test]
    fn test_import_requires_source_chain() {
        let err = build_tx(
            &matched(
                OperationType::ImportAvax,
                vec![spend(0, OperationType::ImportAvax, 1, 0, 10)],
                vec![],
            ),
            &test_metadata(),
        )
        .unwrap_err();
        assert!(matches!(err, AdapterError::Validation { index: None, .. }));
    }

    #[test]
    fn test_stakeable_locktime_wraps_records() {
        let mut op = create(1, OperationType::Base, 1, 5);
        op.metadata.insert(keys::STAKEABLE_LOCKTIME.into(), json!(500));
        let built = build_tx(
            &matched(
                OperationType::Base,
                vec![spend(0, OperationType::Base, 1, 0, 10)],
                vec![op],
            ),
            &test_metadata(),
        )
        .unwrap();
        let UnsignedTx::Base(base) = &built.tx else {
            panic!("expected base tx");
        };
        assert_eq!(base.outputs[0].output.stakeable_locktime(), Some(500));
    }
}
