//! # Transaction Parser
//!
//! Native transaction to operation list.
//!
//! ## Operation Order
//!
//! 1. Base inputs (`INPUT`, negative amount, spent coin)
//! 2. Base outputs (`OUTPUT`, positive amount, created coin `<tx>:<n>`)
//! 3. Variant group: imported inputs (`IMPORT`), exported outputs (`EXPORT`,
//!    numbering continues after base outputs) or stake outputs (`STAKE`, no
//!    coin); value-less variants append one synthetic operation instead.
//!
//! Every operation carries the transaction's type tag; the sub-role lives in
//! metadata under `type`.

use pchain_types::{
    AddressId, ChainId, Output, OutputOwners, SealedTx, TransferableInput, TransferableOutput,
    TxId, UnsignedTx, UtxoId,
};
use serde_json::{json, Value};

use super::strategies::strategy_for_kind;
use crate::domain::{
    keys, AdapterError, CoinChange, DependencyMap, FormatProfile, Metadata, Operation,
    OperationType, ParsedTransaction, SignerAccount, SubRole,
};

/// Where input accounts come from.
#[derive(Debug, Clone, Copy)]
pub enum ParseMode<'a> {
    /// Confirmed transactions: accounts from fetched dependencies, outputs
    /// get created coins.
    Indexer { dependencies: &'a DependencyMap },
    /// Adapter-built unsigned transactions: accounts from the signer list,
    /// outputs carry no coin.
    Construction { signers: &'a [SignerAccount] },
}

/// Fixed parameters of one parse call.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub profile: &'a FormatProfile,
    pub mode: ParseMode<'a>,
}

/// Appends operations with contiguous indices.
pub struct OperationWriter<'a> {
    ctx: &'a ParseContext<'a>,
    tx_id: TxId,
    op_type: OperationType,
    operations: Vec<Operation>,
    next_coin: u32,
}

impl<'a> OperationWriter<'a> {
    pub fn new(ctx: &'a ParseContext<'a>, tx_id: TxId, op_type: OperationType) -> Self {
        Self {
            ctx,
            tx_id,
            op_type,
            operations: Vec::new(),
            next_coin: 0,
        }
    }

    pub fn context(&self) -> &ParseContext<'a> {
        self.ctx
    }

    fn next(&self) -> Operation {
        Operation::new(self.operations.len(), self.op_type)
    }

    /// Spent input; `chain_id` is the chain the UTXO lives on.
    pub fn spend(
        &mut self,
        input: &TransferableInput,
        role: SubRole,
        chain_id: &ChainId,
    ) -> Result<(), AdapterError> {
        let mut op = self.next();
        op.amount = Some(-i128::from(input.input.amount()));
        op.account = self.input_account(&input.utxo_id, chain_id)?;
        op.coin_change = Some(CoinChange::spent(&input.utxo_id));
        op.metadata.insert(keys::TYPE.into(), json!(role.as_str()));
        op.metadata
            .insert(keys::SIG_INDICES.into(), json!(input.input.sig_indices()));
        if let Some(locktime) = input.input.stakeable_locktime() {
            op.metadata
                .insert(keys::STAKEABLE_LOCKTIME.into(), json!(locktime));
        }
        self.operations.push(op);
        Ok(())
    }

    /// Created output; `chain_id` is the chain whose alias renders the owner.
    /// `numbered` outputs consume a created-coin index.
    pub fn create(
        &mut self,
        output: &TransferableOutput,
        role: SubRole,
        chain_id: &ChainId,
        numbered: bool,
    ) -> Result<(), AdapterError> {
        let mut op = self.next();
        op.amount = Some(i128::from(output.output.amount()));
        let owners = output.output.owners();
        op.account = owners
            .single_address()
            .map(|address| self.ctx.profile.address(chain_id, address))
            .transpose()?;
        if numbered {
            if let ParseMode::Indexer { .. } = self.ctx.mode {
                let utxo_id = UtxoId::new(self.tx_id, self.next_coin);
                op.coin_change = Some(CoinChange::created(&utxo_id));
            }
            self.next_coin += 1;
        }
        op.metadata.insert(keys::TYPE.into(), json!(role.as_str()));
        write_owner_metadata(&mut op.metadata, owners, op.account.is_none(), |a| {
            self.ctx.profile.address(chain_id, a)
        })?;
        if let Output::StakeableLock { locktime, .. } = &output.output {
            op.metadata
                .insert(keys::STAKEABLE_LOCKTIME.into(), json!(locktime));
        }
        self.operations.push(op);
        Ok(())
    }

    /// Value-less operation carrying only descriptive metadata.
    pub fn synthetic(&mut self, metadata: Metadata) {
        let mut op = self.next();
        op.metadata = metadata;
        self.operations.push(op);
    }

    pub fn finish(self) -> Vec<Operation> {
        self.operations
    }

    fn input_account(
        &self,
        utxo_id: &UtxoId,
        chain_id: &ChainId,
    ) -> Result<Option<String>, AdapterError> {
        match self.ctx.mode {
            ParseMode::Construction { signers } => {
                let coin = utxo_id.to_string();
                Ok(signers
                    .iter()
                    .find(|s| s.coin_identifier == coin)
                    .map(|s| s.address.clone()))
            }
            ParseMode::Indexer { dependencies } => dependencies
                .get(&utxo_id.tx_id)
                .and_then(|dep| dep.utxo_owners(utxo_id))
                .and_then(OutputOwners::single_address)
                .map(|address| self.ctx.profile.address(chain_id, address))
                .transpose(),
        }
    }
}

/// Threshold, locktime and (when `with_addresses`) the full address list.
fn write_owner_metadata(
    metadata: &mut Metadata,
    owners: &OutputOwners,
    with_addresses: bool,
    render: impl Fn(&AddressId) -> Result<String, AdapterError>,
) -> Result<(), AdapterError> {
    metadata.insert(keys::THRESHOLD.into(), json!(owners.threshold));
    metadata.insert(keys::LOCKTIME.into(), json!(owners.locktime));
    if with_addresses {
        let addresses = owners
            .addresses
            .iter()
            .map(render)
            .collect::<Result<Vec<_>, _>>()?;
        metadata.insert(keys::ADDRESSES.into(), json!(addresses));
    }
    Ok(())
}

/// Parse one transaction.
pub fn parse_tx(tx: &SealedTx, ctx: &ParseContext<'_>) -> Result<ParsedTransaction, AdapterError> {
    let unsigned = tx.unsigned();
    let strategy = strategy_for_kind(unsigned.kind());
    let mut writer = OperationWriter::new(ctx, tx.id, strategy.op_type);
    let mut metadata = Metadata::new();

    if let Some(base) = unsigned.base() {
        for input in &base.inputs {
            writer.spend(input, SubRole::Input, &base.blockchain_id)?;
        }
        for output in &base.outputs {
            writer.create(output, SubRole::Output, &base.blockchain_id, true)?;
        }
        metadata.insert(keys::NETWORK_ID.into(), json!(base.network_id));
        metadata.insert(
            keys::BLOCKCHAIN_ID.into(),
            json!(base.blockchain_id.to_string()),
        );
        if !base.memo.is_empty() {
            metadata.insert(keys::MEMO.into(), json!(hex::encode(&base.memo)));
        }
    }
    (strategy.parse_group)(unsigned, &mut writer)?;
    (strategy.tx_metadata)(unsigned, ctx.profile, &mut metadata)?;

    Ok(ParsedTransaction {
        tx_id: tx.id,
        operations: writer.finish(),
        metadata,
    })
}

// =============================================================================
// VARIANT GROUPS
// =============================================================================

pub(crate) fn no_group(
    _tx: &UnsignedTx,
    _writer: &mut OperationWriter<'_>,
) -> Result<(), AdapterError> {
    Ok(())
}

pub(crate) fn imported_inputs(
    tx: &UnsignedTx,
    writer: &mut OperationWriter<'_>,
) -> Result<(), AdapterError> {
    if let UnsignedTx::Import(import) = tx {
        for input in &import.imported_inputs {
            writer.spend(input, SubRole::Import, &import.source_chain)?;
        }
    }
    Ok(())
}

pub(crate) fn exported_outputs(
    tx: &UnsignedTx,
    writer: &mut OperationWriter<'_>,
) -> Result<(), AdapterError> {
    if let UnsignedTx::Export(export) = tx {
        for output in &export.exported_outputs {
            writer.create(output, SubRole::Export, &export.destination_chain, true)?;
        }
    }
    Ok(())
}

pub(crate) fn stake_outputs(
    tx: &UnsignedTx,
    writer: &mut OperationWriter<'_>,
) -> Result<(), AdapterError> {
    let (stake, chain_id) = match tx {
        UnsignedTx::AddValidator(add) => (&add.stake, add.base.blockchain_id),
        UnsignedTx::AddDelegator(add) => (&add.stake, add.base.blockchain_id),
        _ => return Ok(()),
    };
    for output in stake {
        writer.create(output, SubRole::Stake, &chain_id, false)?;
    }
    Ok(())
}

pub(crate) fn subnet_validator_summary(
    tx: &UnsignedTx,
    writer: &mut OperationWriter<'_>,
) -> Result<(), AdapterError> {
    if let UnsignedTx::AddSubnetValidator(add) = tx {
        let mut metadata = Metadata::new();
        metadata.insert(keys::NODE_ID.into(), json!(add.validator.node_id.to_string()));
        metadata.insert(keys::SUBNET_ID.into(), json!(add.subnet_id.to_string()));
        metadata.insert(keys::START_TIME.into(), json!(add.validator.start_time));
        metadata.insert(keys::END_TIME.into(), json!(add.validator.end_time));
        metadata.insert(keys::WEIGHT.into(), json!(add.validator.weight));
        writer.synthetic(metadata);
    }
    Ok(())
}

pub(crate) fn create_chain_summary(
    tx: &UnsignedTx,
    writer: &mut OperationWriter<'_>,
) -> Result<(), AdapterError> {
    if let UnsignedTx::CreateChain(create) = tx {
        let fx_ids: Vec<String> = create.fx_ids.iter().map(ToString::to_string).collect();
        let mut metadata = Metadata::new();
        metadata.insert(keys::SUBNET_ID.into(), json!(create.subnet_id.to_string()));
        metadata.insert(keys::CHAIN_NAME.into(), json!(create.chain_name));
        metadata.insert(keys::VM_ID.into(), json!(create.vm_id.to_string()));
        metadata.insert(keys::FX_IDS.into(), json!(fx_ids));
        writer.synthetic(metadata);
    }
    Ok(())
}

pub(crate) fn create_subnet_summary(
    tx: &UnsignedTx,
    writer: &mut OperationWriter<'_>,
) -> Result<(), AdapterError> {
    if let UnsignedTx::CreateSubnet(create) = tx {
        let profile = writer.context().profile;
        let mut owner = Metadata::new();
        write_owner_metadata(&mut owner, &create.owner, true, |a| {
            profile.address(&create.base.blockchain_id, a)
        })?;
        let mut metadata = Metadata::new();
        metadata.insert(keys::OWNER.into(), Value::Object(owner));
        writer.synthetic(metadata);
    }
    Ok(())
}

pub(crate) fn advance_time_summary(
    tx: &UnsignedTx,
    writer: &mut OperationWriter<'_>,
) -> Result<(), AdapterError> {
    if let UnsignedTx::AdvanceTime(advance) = tx {
        let mut metadata = Metadata::new();
        metadata.insert(keys::TIMESTAMP.into(), json!(advance.time));
        writer.synthetic(metadata);
    }
    Ok(())
}

pub(crate) fn reward_summary(
    tx: &UnsignedTx,
    writer: &mut OperationWriter<'_>,
) -> Result<(), AdapterError> {
    let UnsignedTx::RewardValidator(reward) = tx else {
        return Ok(());
    };
    let ctx = *writer.context();
    let mut outputs = Vec::new();
    if let ParseMode::Indexer { dependencies } = ctx.mode {
        if let Some(staking) = dependencies.get(&reward.tx_id) {
            for utxo in &staking.reward_utxos {
                let account = utxo
                    .output
                    .owners()
                    .single_address()
                    .map(|a| ctx.profile.address(&ChainId::EMPTY, a))
                    .transpose()?;
                let mut entry = Metadata::new();
                entry.insert(keys::COIN_IDENTIFIER.into(), json!(utxo.utxo_id.to_string()));
                entry.insert(keys::AMOUNT.into(), json!(utxo.output.amount().to_string()));
                entry.insert(keys::ACCOUNT.into(), json!(account));
                outputs.push(Value::Object(entry));
            }
        }
    }
    let mut metadata = Metadata::new();
    metadata.insert(keys::STAKING_TX_ID.into(), json!(reward.tx_id.to_string()));
    metadata.insert(keys::REWARD_OUTPUTS.into(), Value::Array(outputs));
    writer.synthetic(metadata);
    Ok(())
}

// =============================================================================
// TRANSACTION METADATA
// =============================================================================

pub(crate) fn no_tx_metadata(
    _tx: &UnsignedTx,
    _profile: &FormatProfile,
    _metadata: &mut Metadata,
) -> Result<(), AdapterError> {
    Ok(())
}

pub(crate) fn import_metadata(
    tx: &UnsignedTx,
    _profile: &FormatProfile,
    metadata: &mut Metadata,
) -> Result<(), AdapterError> {
    if let UnsignedTx::Import(import) = tx {
        metadata.insert(
            keys::SOURCE_CHAIN_ID.into(),
            json!(import.source_chain.to_string()),
        );
    }
    Ok(())
}

pub(crate) fn export_metadata(
    tx: &UnsignedTx,
    _profile: &FormatProfile,
    metadata: &mut Metadata,
) -> Result<(), AdapterError> {
    if let UnsignedTx::Export(export) = tx {
        metadata.insert(
            keys::DESTINATION_CHAIN_ID.into(),
            json!(export.destination_chain.to_string()),
        );
    }
    Ok(())
}

pub(crate) fn staking_metadata(
    tx: &UnsignedTx,
    profile: &FormatProfile,
    metadata: &mut Metadata,
) -> Result<(), AdapterError> {
    let (validator, rewards_owner, chain_id, shares) = match tx {
        UnsignedTx::AddValidator(add) => (
            &add.validator,
            &add.rewards_owner,
            add.base.blockchain_id,
            Some(add.shares),
        ),
        UnsignedTx::AddDelegator(add) => (
            &add.validator,
            &add.rewards_owner,
            add.base.blockchain_id,
            None,
        ),
        _ => return Ok(()),
    };
    let reward_addresses = rewards_owner
        .addresses
        .iter()
        .map(|a| profile.address(&chain_id, a))
        .collect::<Result<Vec<_>, _>>()?;
    metadata.insert(keys::NODE_ID.into(), json!(validator.node_id.to_string()));
    metadata.insert(keys::START_TIME.into(), json!(validator.start_time));
    metadata.insert(keys::END_TIME.into(), json!(validator.end_time));
    metadata.insert(keys::WEIGHT.into(), json!(validator.weight));
    if let Some(shares) = shares {
        metadata.insert(keys::SHARES.into(), json!(shares));
    }
    metadata.insert(keys::REWARD_ADDRESSES.into(), json!(reward_addresses));
    metadata.insert(
        keys::REWARD_THRESHOLD.into(),
        json!(rewards_owner.threshold),
    );
    metadata.insert(keys::REWARD_LOCKTIME.into(), json!(rewards_owner.locktime));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChainAliases, DependencyTx};
    use pchain_types::{
        AdvanceTimeTx, AssetId, BaseTx, ExportTx, Input, TransferInput, TransferOutput, Tx,
    };

    fn profile() -> FormatProfile {
        FormatProfile::new(
            5,
            ChainAliases::platform_only().with_chain(ChainId::new([0x22; 32]), "X"),
        )
    }

    fn output(amount: u64, owners: OutputOwners) -> TransferableOutput {
        TransferableOutput {
            asset_id: AssetId::new([0x11; 32]),
            output: Output::Transfer(TransferOutput { amount, owners }),
        }
    }

    fn input(tx: TxId, index: u32, amount: u64) -> TransferableInput {
        TransferableInput {
            utxo_id: UtxoId::new(tx, index),
            asset_id: AssetId::new([0x11; 32]),
            input: Input::Transfer(TransferInput {
                amount,
                sig_indices: vec![0],
            }),
        }
    }

    #[test]
    fn test_export_coins_continue_numbering() {
        let tx = Tx::new(UnsignedTx::Export(ExportTx {
            base: BaseTx {
                network_id: 5,
                outputs: vec![output(1, OutputOwners::single(AddressId::new([1; 20])))],
                ..Default::default()
            },
            destination_chain: ChainId::new([0x22; 32]),
            exported_outputs: vec![output(2, OutputOwners::single(AddressId::new([2; 20])))],
        }))
        .seal()
        .unwrap();
        let dependencies = DependencyMap::new();
        let profile = profile();
        let ctx = ParseContext {
            profile: &profile,
            mode: ParseMode::Indexer {
                dependencies: &dependencies,
            },
        };
        let parsed = parse_tx(&tx, &ctx).unwrap();
        let ops = &parsed.operations;
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].metadata[keys::TYPE], "OUTPUT");
        assert_eq!(ops[1].metadata[keys::TYPE], "EXPORT");
        assert!(ops[1].account.as_deref().unwrap().starts_with("X-fuji1"));
        assert_eq!(
            ops[1].coin_change.as_ref().unwrap().coin_identifier,
            format!("{}:1", tx.id)
        );
        assert!(ops.iter().all(|op| op.op_type == "EXPORT_AVAX"));
        assert!(parsed.metadata.contains_key(keys::DESTINATION_CHAIN_ID));
    }

    #[test]
    fn test_input_account_from_dependency() {
        let owner = AddressId::new([7; 20]);
        let funding = Tx::new(UnsignedTx::Base(BaseTx {
            outputs: vec![output(50, OutputOwners::single(owner))],
            ..Default::default()
        }))
        .seal()
        .unwrap();
        let spend = Tx::new(UnsignedTx::Base(BaseTx {
            inputs: vec![input(funding.id, 0, 50), input(TxId::new([9; 32]), 0, 5)],
            ..Default::default()
        }))
        .seal()
        .unwrap();
        let mut dependencies = DependencyMap::new();
        dependencies.insert(
            funding.id,
            DependencyTx {
                tx: funding,
                reward_utxos: Vec::new(),
            },
        );
        let profile = profile();
        let ctx = ParseContext {
            profile: &profile,
            mode: ParseMode::Indexer {
                dependencies: &dependencies,
            },
        };
        let ops = parse_tx(&spend, &ctx).unwrap().operations;
        assert_eq!(
            ops[0].account.as_deref(),
            Some(profile.address(&ChainId::EMPTY, &owner).unwrap().as_str())
        );
        assert_eq!(ops[0].amount, Some(-50));
        assert_eq!(ops[1].account, None);
    }

    #[test]
    fn test_multisig_output_lists_addresses() {
        let owners = OutputOwners::new(
            0,
            2,
            vec![AddressId::new([1; 20]), AddressId::new([2; 20])],
        );
        let tx = Tx::new(UnsignedTx::Base(BaseTx {
            outputs: vec![output(3, owners)],
            ..Default::default()
        }))
        .seal()
        .unwrap();
        let profile = profile();
        let ctx = ParseContext {
            profile: &profile,
            mode: ParseMode::Construction { signers: &[] },
        };
        let ops = parse_tx(&tx, &ctx).unwrap().operations;
        assert_eq!(ops[0].account, None);
        assert_eq!(ops[0].coin_change, None);
        assert_eq!(ops[0].metadata[keys::THRESHOLD], 2);
        assert_eq!(ops[0].metadata[keys::ADDRESSES].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_advance_time_is_single_synthetic_op() {
        let tx = Tx::new(UnsignedTx::AdvanceTime(AdvanceTimeTx { time: 99 }))
            .seal()
            .unwrap();
        let profile = profile();
        let ctx = ParseContext {
            profile: &profile,
            mode: ParseMode::Construction { signers: &[] },
        };
        let ops = parse_tx(&tx, &ctx).unwrap().operations;
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].op_type, "ADVANCE_TIME");
        assert_eq!(ops[0].amount, None);
        assert_eq!(ops[0].metadata[keys::TIMESTAMP], 99);
    }
}
