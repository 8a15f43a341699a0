//! In-Memory Node Adapter
//!
//! Implements `PChainClient` over maps filled by the caller. Used by tests
//! and by offline tooling that replays captured containers.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use pchain_types::{BlockId, ChainId, TxId};
use tracing::debug;

use crate::algorithms::decode_payload;
use crate::domain::AdapterError;
use crate::ports::PChainClient;

/// Counters for `get_tx` calls. A call ends exactly one way.
#[derive(Debug, Default)]
pub struct FetchProbe {
    started: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicUsize,
}

impl FetchProbe {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Calls dropped before finishing.
    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Calls that started but have not ended yet.
    pub fn in_flight(&self) -> usize {
        self.started() - self.completed() - self.failed() - self.cancelled()
    }
}

/// Records a cancellation unless the call reached an outcome.
struct FetchGuard<'a> {
    probe: &'a FetchProbe,
    finished: bool,
}

impl<'a> FetchGuard<'a> {
    fn start(probe: &'a FetchProbe) -> Self {
        probe.started.fetch_add(1, Ordering::SeqCst);
        Self {
            probe,
            finished: false,
        }
    }

    fn complete(mut self) {
        self.finished = true;
        self.probe.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn fail(mut self) {
        self.finished = true;
        self.probe.failed.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.probe.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Node backed by in-process maps.
pub struct InMemoryNode {
    network_id: u32,
    containers: RwLock<BTreeMap<u64, Vec<u8>>>,
    heights: RwLock<HashMap<BlockId, u64>>,
    txs: RwLock<HashMap<TxId, Vec<u8>>>,
    reward_utxos: RwLock<HashMap<TxId, Vec<Vec<u8>>>>,
    chains: RwLock<HashMap<String, ChainId>>,
    /// Transactions whose fetch fails after the given delay.
    failing: RwLock<HashMap<TxId, Duration>>,
    latency: Duration,
    offline: AtomicBool,
    probe: Arc<FetchProbe>,
    container_calls: AtomicUsize,
}

impl InMemoryNode {
    pub fn new(network_id: u32) -> Self {
        Self {
            network_id,
            containers: RwLock::new(BTreeMap::new()),
            heights: RwLock::new(HashMap::new()),
            txs: RwLock::new(HashMap::new()),
            reward_utxos: RwLock::new(HashMap::new()),
            chains: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashMap::new()),
            latency: Duration::ZERO,
            offline: AtomicBool::new(false),
            probe: Arc::new(FetchProbe::default()),
            container_calls: AtomicUsize::new(0),
        }
    }

    /// Delay every `get_tx` by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Register `alias` for `get_blockchain_id`.
    pub fn with_chain(self, alias: impl Into<String>, chain_id: ChainId) -> Self {
        self.chains.write().insert(alias.into(), chain_id);
        self
    }

    /// Store a container; it is also indexed by its block id when it decodes.
    pub fn insert_container(&self, height: u64, bytes: Vec<u8>) {
        if let Ok(decoded) = decode_payload(&bytes) {
            self.heights.write().insert(decoded.block_id, height);
        }
        self.containers.write().insert(height, bytes);
    }

    pub fn insert_tx(&self, tx_id: TxId, bytes: Vec<u8>) {
        self.txs.write().insert(tx_id, bytes);
    }

    /// Store encoded reward UTXOs; they are returned as given.
    pub fn insert_reward_utxos(&self, tx_id: TxId, utxos: Vec<Vec<u8>>) {
        self.reward_utxos.write().insert(tx_id, utxos);
    }

    /// Make `get_tx(tx_id)` fail after `after`.
    pub fn fail_tx(&self, tx_id: TxId, after: Duration) {
        self.failing.write().insert(tx_id, after);
    }

    /// Every call fails while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn probe(&self) -> Arc<FetchProbe> {
        Arc::clone(&self.probe)
    }

    /// Number of container lookups served.
    pub fn container_calls(&self) -> usize {
        self.container_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), AdapterError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AdapterError::client("node unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl PChainClient for InMemoryNode {
    async fn get_container_by_index(&self, height: u64) -> Result<Vec<u8>, AdapterError> {
        self.check_online()?;
        self.container_calls.fetch_add(1, Ordering::SeqCst);
        self.containers
            .read()
            .get(&height)
            .cloned()
            .ok_or_else(|| {
                AdapterError::client(format!("container at height {} not found", height))
            })
    }

    async fn get_container_by_id(&self, block_id: &BlockId) -> Result<Vec<u8>, AdapterError> {
        self.check_online()?;
        self.container_calls.fetch_add(1, Ordering::SeqCst);
        let height = self
            .heights
            .read()
            .get(block_id)
            .copied()
            .ok_or_else(|| AdapterError::client(format!("container {} not found", block_id)))?;
        self.get_container_by_index(height).await
    }

    async fn get_height(&self) -> Result<u64, AdapterError> {
        self.check_online()?;
        self.containers
            .read()
            .keys()
            .next_back()
            .copied()
            .ok_or_else(|| AdapterError::client("no accepted blocks"))
    }

    async fn get_tx(&self, tx_id: &TxId) -> Result<Vec<u8>, AdapterError> {
        self.check_online()?;
        let guard = FetchGuard::start(&self.probe);
        let failure = self.failing.read().get(tx_id).copied();
        if let Some(after) = failure {
            tokio::time::sleep(after).await;
            guard.fail();
            return Err(AdapterError::client(format!("fetch of {} failed", tx_id)));
        }
        tokio::time::sleep(self.latency).await;
        let found = self.txs.read().get(tx_id).cloned();
        match found {
            Some(bytes) => {
                debug!("[pchain] served tx {}", tx_id);
                guard.complete();
                Ok(bytes)
            }
            None => {
                guard.fail();
                Err(AdapterError::client(format!("tx {} not found", tx_id)))
            }
        }
    }

    async fn get_reward_utxos(&self, tx_id: &TxId) -> Result<Vec<Vec<u8>>, AdapterError> {
        self.check_online()?;
        Ok(self
            .reward_utxos
            .read()
            .get(tx_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_network_id(&self) -> Result<u32, AdapterError> {
        self.check_online()?;
        Ok(self.network_id)
    }

    async fn get_blockchain_id(&self, alias: &str) -> Result<ChainId, AdapterError> {
        self.check_online()?;
        self.chains
            .read()
            .get(alias)
            .copied()
            .ok_or_else(|| AdapterError::client(format!("unknown chain alias {}", alias)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_tx_is_client_error() {
        let node = InMemoryNode::new(5);
        let err = node.get_tx(&TxId::new([1; 32])).await.unwrap_err();
        assert!(matches!(err, AdapterError::Client(_)));
        assert_eq!(node.probe().failed(), 1);
    }

    #[tokio::test]
    async fn test_offline_node_fails() {
        let node = InMemoryNode::new(5);
        node.set_offline(true);
        assert!(node.get_network_id().await.is_err());
        node.set_offline(false);
        assert_eq!(node.get_network_id().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_dropped_fetch_counts_as_cancelled() {
        let node = InMemoryNode::new(5).with_latency(Duration::from_secs(60));
        let tx_id = TxId::new([2; 32]);
        node.insert_tx(tx_id, vec![0]);
        let result = tokio::time::timeout(Duration::from_millis(10), node.get_tx(&tx_id)).await;
        assert!(result.is_err());
        let probe = node.probe();
        assert_eq!(probe.started(), 1);
        assert_eq!(probe.cancelled(), 1);
        assert_eq!(probe.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_height_is_last_container() {
        let node = InMemoryNode::new(5);
        assert!(node.get_height().await.is_err());
        node.insert_container(1, vec![1]);
        node.insert_container(7, vec![7]);
        assert_eq!(node.get_height().await.unwrap(), 7);
        assert_eq!(node.get_container_by_index(1).await.unwrap(), vec![1]);
    }
}
