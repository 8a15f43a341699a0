//! # Operation Matcher
//!
//! Splits a caller's operation list into spends and creates and pins the
//! transaction variant they describe.

use crate::domain::{keys, AdapterError, CoinAction, MatchedOperations, Operation, OperationType};

/// Group `operations` by sign of amount.
///
/// All operations must share one type tag. Spends (negative amount) must
/// name the coin they consume.
pub fn match_operations(operations: &[Operation]) -> Result<MatchedOperations, AdapterError> {
    let first = operations
        .first()
        .ok_or_else(|| AdapterError::invalid("operations", "empty"))?;
    let op_type: OperationType = first.op_type.parse()?;

    let mut spends = Vec::new();
    let mut creates = Vec::new();
    for op in operations {
        if op.op_type != first.op_type {
            return Err(AdapterError::invalid_op(
                op.index,
                keys::TYPE,
                format!("{} does not match {}", op.op_type, first.op_type),
            ));
        }
        match op.amount {
            None | Some(0) => {
                return Err(AdapterError::invalid_op(
                    op.index,
                    keys::AMOUNT,
                    "must be non-zero",
                ))
            }
            Some(amount) if amount < 0 => {
                let spent = op
                    .coin_change
                    .as_ref()
                    .is_some_and(|c| c.coin_action == CoinAction::CoinSpent);
                if !spent {
                    return Err(AdapterError::invalid_op(
                        op.index,
                        "coin_change",
                        "spent coin required",
                    ));
                }
                spends.push(op.clone());
            }
            Some(_) => creates.push(op.clone()),
        }
    }
    if spends.is_empty() {
        return Err(AdapterError::invalid("operations", "no inputs"));
    }

    Ok(MatchedOperations {
        op_type,
        spends,
        creates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CoinChange;
    use pchain_types::{TxId, UtxoId};

    fn op(index: usize, op_type: OperationType, amount: i128) -> Operation {
        let mut op = Operation::new(index, op_type);
        op.amount = Some(amount);
        if amount < 0 {
            let utxo_id = UtxoId::new(TxId::new([1; 32]), index as u32);
            op.coin_change = Some(CoinChange::spent(&utxo_id));
        }
        op
    }

    #[test]
    fn test_split_by_sign() {
        let matched = match_operations(&[
            op(0, OperationType::Base, -10),
            op(1, OperationType::Base, 4),
            op(2, OperationType::Base, 5),
        ])
        .unwrap();
        assert_eq!(matched.op_type, OperationType::Base);
        assert_eq!(matched.spends.len(), 1);
        assert_eq!(matched.creates.len(), 2);
    }

    #[test]
    fn test_mixed_types_rejected() {
        let err = match_operations(&[
            op(0, OperationType::Base, -10),
            op(1, OperationType::ExportAvax, 4),
        ])
        .unwrap_err();
        assert!(matches!(err, AdapterError::Validation { index: Some(1), .. }));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let ops = [op(0, OperationType::Base, -10), op(1, OperationType::Base, 0)];
        let err = match_operations(&ops).unwrap_err();
        assert!(matches!(
            err,
            AdapterError::Validation { index: Some(1), ref field, .. } if field == "amount"
        ));
    }

    #[test]
    fn test_spend_without_coin_rejected() {
        let mut spend = op(0, OperationType::Base, -10);
        spend.coin_change = None;
        assert!(match_operations(&[spend]).is_err());
    }

    #[test]
    fn test_needs_a_spend() {
        assert!(match_operations(&[op(0, OperationType::Base, 5)]).is_err());
        assert!(match_operations(&[]).is_err());
    }

    #[test]
    fn test_unknown_tag_unsupported() {
        let mut unknown = op(0, OperationType::Base, -1);
        unknown.op_type = "MINT".into();
        assert_eq!(
            match_operations(&[unknown]).unwrap_err(),
            AdapterError::UnsupportedOperation("MINT".into())
        );
    }
}
