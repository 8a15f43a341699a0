//! # Dependency Resolver
//!
//! Fetches the transactions a batch references, concurrently.
//!
//! One task per distinct transaction id, bounded by a semaphore. The first
//! failure aborts every sibling, and `resolve` returns only after all tasks
//! have stopped. Dropping the `resolve` future drops the task set, which
//! aborts whatever is still running.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pchain_types::{Tx, TxId, UnsignedTx, Utxo};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::algorithms::{collect_dependencies, DependencyRequest};
use crate::config::AdapterConfig;
use crate::domain::{AdapterError, DependencyMap, DependencyTx};
use crate::ports::PChainClient;

/// Bounded fan-out fetcher.
pub struct DependencyResolver<N: PChainClient + 'static> {
    node: Arc<N>,
    permits: Arc<Semaphore>,
    fetch_timeout: Duration,
}

impl<N: PChainClient + 'static> DependencyResolver<N> {
    pub fn new(node: Arc<N>, config: &AdapterConfig) -> Self {
        Self {
            node,
            permits: Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1))),
            fetch_timeout: config.fetch_timeout(),
        }
    }

    /// Dependencies of `txs`, keyed by transaction id.
    pub async fn resolve<'a>(
        &self,
        txs: impl IntoIterator<Item = &'a UnsignedTx>,
    ) -> Result<DependencyMap, AdapterError> {
        self.fetch_all(collect_dependencies(txs)).await
    }

    /// Fetch every request; all or nothing.
    pub async fn fetch_all(
        &self,
        requests: Vec<DependencyRequest>,
    ) -> Result<DependencyMap, AdapterError> {
        if requests.is_empty() {
            return Ok(HashMap::new());
        }
        debug!("[pchain] resolving {} dependencies", requests.len());

        let mut tasks = JoinSet::new();
        for request in requests {
            let node = Arc::clone(&self.node);
            let permits = Arc::clone(&self.permits);
            let limit = self.fetch_timeout;
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|_| AdapterError::client("fetch permits closed"))?;
                tokio::time::timeout(limit, fetch_dependency(node.as_ref(), request))
                    .await
                    .map_err(|_| {
                        AdapterError::client(format!("timed out fetching {}", request.tx_id))
                    })?
            });
        }

        let mut resolved = HashMap::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| AdapterError::client(format!("fetch task failed: {}", e)))
                .and_then(|fetched| fetched);
            match outcome {
                Ok((tx_id, dependency)) => {
                    resolved.insert(tx_id, dependency);
                }
                Err(err) => {
                    tasks.abort_all();
                    while tasks.join_next().await.is_some() {}
                    warn!("[pchain] dependency resolution failed: {}", err);
                    return Err(err);
                }
            }
        }
        Ok(resolved)
    }
}

/// Fetch and decode one dependency, checking the node returned what was asked.
async fn fetch_dependency<N: PChainClient + ?Sized>(
    node: &N,
    request: DependencyRequest,
) -> Result<(TxId, DependencyTx), AdapterError> {
    let bytes = node.get_tx(&request.tx_id).await?;
    let tx = Tx::from_bytes(&bytes)?.seal()?;
    if tx.id != request.tx_id {
        return Err(AdapterError::client(format!(
            "node returned tx {} for {}",
            tx.id, request.tx_id
        )));
    }
    let reward_utxos = if request.with_rewards {
        node.get_reward_utxos(&request.tx_id)
            .await?
            .iter()
            .map(|bytes| Utxo::from_bytes(bytes))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        Vec::new()
    };
    Ok((request.tx_id, DependencyTx { tx, reward_utxos }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryNode;
    use pchain_types::{
        AddressId, AdvanceTimeTx, AssetId, BaseTx, Output, OutputOwners, TransferOutput, UtxoId,
    };

    fn stored(node: &InMemoryNode, time: u64) -> TxId {
        let sealed = Tx::new(UnsignedTx::AdvanceTime(AdvanceTimeTx { time }))
            .seal()
            .unwrap();
        node.insert_tx(sealed.id, sealed.bytes.clone());
        sealed.id
    }

    fn request(tx_id: TxId) -> DependencyRequest {
        DependencyRequest {
            tx_id,
            with_rewards: false,
        }
    }

    #[tokio::test]
    async fn test_fetches_all() {
        let node = Arc::new(InMemoryNode::new(5));
        let a = stored(&node, 1);
        let b = stored(&node, 2);
        let resolver = DependencyResolver::new(Arc::clone(&node), &AdapterConfig::for_testing());
        let map = resolver.fetch_all(vec![request(a), request(b)]).await.unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&a].tx.id, a);
        assert!(map[&b].reward_utxos.is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_skips_node() {
        let node = Arc::new(InMemoryNode::new(5));
        let resolver = DependencyResolver::new(Arc::clone(&node), &AdapterConfig::for_testing());
        let tx = UnsignedTx::Base(BaseTx::default());
        assert!(resolver.resolve([&tx]).await.unwrap().is_empty());
        assert_eq!(node.probe().started(), 0);
    }

    #[tokio::test]
    async fn test_mismatched_id_rejected() {
        let node = Arc::new(InMemoryNode::new(5));
        let real = stored(&node, 1);
        let wanted = TxId::new([9; 32]);
        let bytes = Tx::new(UnsignedTx::AdvanceTime(AdvanceTimeTx { time: 1 }))
            .signed_bytes()
            .unwrap();
        node.insert_tx(wanted, bytes);
        let resolver = DependencyResolver::new(Arc::clone(&node), &AdapterConfig::for_testing());
        let err = resolver.fetch_all(vec![request(wanted)]).await.unwrap_err();
        assert!(matches!(err, AdapterError::Client(ref m) if m.contains(&real.to_string())));
    }

    #[tokio::test]
    async fn test_reward_utxos_decoded() {
        let node = Arc::new(InMemoryNode::new(5));
        let staking = stored(&node, 1);
        let utxo = Utxo {
            utxo_id: UtxoId::new(staking, 2),
            asset_id: AssetId::new([1; 32]),
            output: Output::Transfer(TransferOutput {
                amount: 7,
                owners: OutputOwners::single(AddressId::new([4; 20])),
            }),
        };
        node.insert_reward_utxos(staking, vec![utxo.to_bytes().unwrap()]);
        let resolver = DependencyResolver::new(Arc::clone(&node), &AdapterConfig::for_testing());
        let map = resolver
            .fetch_all(vec![DependencyRequest {
                tx_id: staking,
                with_rewards: true,
            }])
            .await
            .unwrap();
        assert_eq!(map[&staking].reward_utxos, vec![utxo]);
    }

    #[tokio::test]
    async fn test_malformed_reward_utxo_is_decode_error() {
        let node = Arc::new(InMemoryNode::new(5));
        let staking = stored(&node, 1);
        node.insert_reward_utxos(staking, vec![vec![0, 0, 1]]);
        let resolver = DependencyResolver::new(Arc::clone(&node), &AdapterConfig::for_testing());
        let err = resolver
            .fetch_all(vec![DependencyRequest {
                tx_id: staking,
                with_rewards: true,
            }])
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Decode(_)));
    }

    #[tokio::test]
    async fn test_undecodable_dependency_is_decode_error() {
        let node = Arc::new(InMemoryNode::new(5));
        let tx_id = TxId::new([3; 32]);
        node.insert_tx(tx_id, vec![0, 0, 0, 0, 0, 99]);
        let resolver = DependencyResolver::new(Arc::clone(&node), &AdapterConfig::for_testing());
        let err = resolver.fetch_all(vec![request(tx_id)]).await.unwrap_err();
        assert!(matches!(err, AdapterError::Decode(_)));
    }
}
