//! # Dependency Collection
//!
//! Which earlier transactions a batch references. Cheap and sequential; the
//! fetching happens in the application layer.

use std::collections::BTreeMap;

use pchain_types::{TxId, UnsignedTx};

use super::strategies::strategy_for_kind;

/// One transaction to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyRequest {
    pub tx_id: TxId,
    /// Also fetch the reward UTXOs it produced.
    pub with_rewards: bool,
}

/// Accumulates references, merging duplicates.
#[derive(Debug, Default)]
pub struct DependencySet {
    requests: BTreeMap<TxId, bool>,
}

impl DependencySet {
    pub fn add(&mut self, tx_id: TxId) {
        self.requests.entry(tx_id).or_insert(false);
    }

    pub fn add_with_rewards(&mut self, tx_id: TxId) {
        self.requests.insert(tx_id, true);
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn into_requests(self) -> Vec<DependencyRequest> {
        self.requests
            .into_iter()
            .map(|(tx_id, with_rewards)| DependencyRequest {
                tx_id,
                with_rewards,
            })
            .collect()
    }
}

/// Distinct dependencies of `txs`.
pub fn collect_dependencies<'a>(
    txs: impl IntoIterator<Item = &'a UnsignedTx>,
) -> Vec<DependencyRequest> {
    let mut set = DependencySet::default();
    for tx in txs {
        (strategy_for_kind(tx.kind()).dependencies)(tx, &mut set);
    }
    set.into_requests()
}

/// Spent base inputs.
pub(crate) fn base_input_dependencies(tx: &UnsignedTx, set: &mut DependencySet) {
    if let Some(base) = tx.base() {
        for input in &base.inputs {
            set.add(input.utxo_id.tx_id);
        }
    }
}

/// The staking transaction and its reward UTXOs.
pub(crate) fn reward_dependencies(tx: &UnsignedTx, set: &mut DependencySet) {
    if let UnsignedTx::RewardValidator(reward) = tx {
        set.add_with_rewards(reward.tx_id);
    }
}

/// Nothing referenced.
pub(crate) fn no_dependencies(_tx: &UnsignedTx, _set: &mut DependencySet) {}
