//! # Adapter Service
//!
//! Application service wiring the node and genesis ports to the decode,
//! parse and build algorithms.
//!
//! ## Process State
//!
//! - Genesis block and address profile: computed once by `initialize`, then
//!   read-only. Concurrent initializers race benignly; the first wins.
//! - Chain time: the only mutable state. Each block parse proposes its
//!   resolved time and accepts it once the whole block decoded.

use std::sync::Arc;

use async_trait::async_trait;
use pchain_types::{BlockId, ChainId, PlatformGenesis, SealedTx, Tx, UnsignedTx};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::resolver::DependencyResolver;
use crate::algorithms::{self, decode_payload, parse_tx, resolve_timestamp, ParseContext, ParseMode};
use crate::config::AdapterConfig;
use crate::domain::{
    keys, AdapterError, BuiltTransaction, ChainAliases, ChainTimeRegister, ConstructionMetadata,
    ConstructionOptions, FormatProfile, GenesisBlock, MatchedOperations, Operation, OperationType,
    ParsedBlock, ParsedTransaction, SignerAccount,
};
use crate::ports::{GenesisSource, PChainAdapterApi, PChainClient};

/// Platform-chain adapter service.
pub struct PChainAdapterService<N: PChainClient + 'static, G: GenesisSource> {
    config: AdapterConfig,
    node: Arc<N>,
    genesis_source: G,
    resolver: DependencyResolver<N>,
    genesis: OnceCell<GenesisBlock>,
    profile: OnceCell<FormatProfile>,
    chain_time: ChainTimeRegister,
}

impl<N: PChainClient + 'static, G: GenesisSource> PChainAdapterService<N, G> {
    pub fn new(config: AdapterConfig, node: Arc<N>, genesis_source: G) -> Self {
        let resolver = DependencyResolver::new(Arc::clone(&node), &config);
        Self {
            config,
            node,
            genesis_source,
            resolver,
            genesis: OnceCell::new(),
            profile: OnceCell::new(),
            chain_time: ChainTimeRegister::default(),
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn resolver(&self) -> &DependencyResolver<N> {
        &self.resolver
    }

    /// Address profile loaded by `initialize`.
    pub fn profile(&self) -> Result<&FormatProfile, AdapterError> {
        self.profile
            .get()
            .ok_or(AdapterError::Uninitialized("address profile"))
    }

    fn genesis(&self) -> Result<&GenesisBlock, AdapterError> {
        self.genesis.get().ok_or(AdapterError::Uninitialized("genesis"))
    }

    async fn load_genesis(&self) -> Result<GenesisBlock, AdapterError> {
        let network_id = self.node.get_network_id().await?;
        let config = self.genesis_source.genesis(network_id).await?;
        let genesis = PlatformGenesis::from_bytes(&config.bytes)?;

        // Genesis is not served by block lookups; block 1 names it as parent.
        let first = self.node.get_container_by_index(1).await?;
        let block_id = decode_payload(&first)?.block.parent_id();

        let txs = genesis
            .txs()
            .cloned()
            .map(Tx::seal)
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            "[pchain] genesis loaded: network {} block {} with {} txs",
            network_id,
            block_id,
            txs.len()
        );
        Ok(GenesisBlock {
            block_id,
            network_id,
            asset_id: config.asset_id,
            timestamp: genesis.timestamp,
            initial_supply: genesis.initial_supply,
            txs,
        })
    }

    async fn load_profile(&self, network_id: u32) -> Result<FormatProfile, AdapterError> {
        let x_chain = self.node.get_blockchain_id(&self.config.x_chain_alias).await?;
        let c_chain = self.node.get_blockchain_id(&self.config.c_chain_alias).await?;
        let aliases = ChainAliases::platform_only()
            .with_chain(x_chain, self.config.x_chain_alias.clone())
            .with_chain(c_chain, self.config.c_chain_alias.clone());
        Ok(FormatProfile::new(network_id, aliases))
    }

    /// Decode a container, threading its time through the chain-time register.
    ///
    /// The time is staged and committed only once the whole container has
    /// decoded, so a bad container leaves the committed time untouched.
    fn parse_container(&self, bytes: &[u8]) -> Result<ParsedBlock, AdapterError> {
        let genesis = self.genesis()?;
        let decoded = decode_payload(bytes)?;
        let timestamp = resolve_timestamp(&decoded, genesis.timestamp);
        let block = decoded.seal(timestamp)?;
        self.chain_time.propose_write(block.timestamp);
        self.chain_time.accept_proposed_write();
        debug!(
            "[pchain] parsed block {} at height {} ({} txs)",
            block.block_id,
            block.height,
            block.txs.len()
        );
        Ok(block)
    }

    async fn chain_for_alias(
        &self,
        alias: Option<&str>,
        field: &'static str,
    ) -> Result<ChainId, AdapterError> {
        let alias = alias.ok_or_else(|| AdapterError::invalid(field, "required"))?;
        self.node.get_blockchain_id(alias).await
    }
}

#[async_trait]
impl<N: PChainClient + 'static, G: GenesisSource> PChainAdapterApi for PChainAdapterService<N, G> {
    async fn initialize(&self) -> Result<GenesisBlock, AdapterError> {
        let genesis = self
            .genesis
            .get_or_try_init(|| async {
                let genesis = self.load_genesis().await?;
                self.chain_time.write(genesis.timestamp);
                Ok::<_, AdapterError>(genesis)
            })
            .await?;
        self.profile
            .get_or_try_init(|| self.load_profile(genesis.network_id))
            .await?;
        Ok(genesis.clone())
    }

    async fn parse_block_at_index(&self, height: u64) -> Result<ParsedBlock, AdapterError> {
        let genesis = self.genesis()?;
        if height == 0 {
            return Ok(genesis.to_parsed_block());
        }
        let bytes = self.node.get_container_by_index(height).await?;
        self.parse_container(&bytes)
    }

    async fn parse_block_with_hash(&self, block_id: &BlockId) -> Result<ParsedBlock, AdapterError> {
        let genesis = self.genesis()?;
        if *block_id == genesis.block_id {
            return Ok(genesis.to_parsed_block());
        }
        let bytes = self.node.get_container_by_id(block_id).await?;
        self.parse_container(&bytes)
    }

    async fn parse_latest_block(&self) -> Result<ParsedBlock, AdapterError> {
        let height = self.node.get_height().await?;
        self.parse_block_at_index(height).await
    }

    async fn parse(&self, tx: &Tx) -> Result<Vec<Operation>, AdapterError> {
        let sealed = tx.clone().seal()?;
        let mut parsed = self.parse_transactions(std::slice::from_ref(&sealed)).await?;
        Ok(parsed.pop().map(|p| p.operations).unwrap_or_default())
    }

    async fn parse_transactions(
        &self,
        txs: &[SealedTx],
    ) -> Result<Vec<ParsedTransaction>, AdapterError> {
        let profile = self.profile()?;
        let dependencies = self.resolver.resolve(txs.iter().map(SealedTx::unsigned)).await?;
        let ctx = ParseContext {
            profile,
            mode: ParseMode::Indexer {
                dependencies: &dependencies,
            },
        };
        txs.iter().map(|tx| parse_tx(tx, &ctx)).collect()
    }

    async fn parse_construction(
        &self,
        unsigned_bytes: &[u8],
        signers: &[SignerAccount],
    ) -> Result<Vec<Operation>, AdapterError> {
        let profile = self.profile()?;
        let sealed = Tx::new(UnsignedTx::from_bytes(unsigned_bytes)?).seal()?;
        let ctx = ParseContext {
            profile,
            mode: ParseMode::Construction { signers },
        };
        Ok(parse_tx(&sealed, &ctx)?.operations)
    }

    fn match_operations(
        &self,
        operations: &[Operation],
    ) -> Result<MatchedOperations, AdapterError> {
        algorithms::match_operations(operations)
    }

    async fn construction_metadata(
        &self,
        options: &ConstructionOptions,
    ) -> Result<ConstructionMetadata, AdapterError> {
        let genesis = self.genesis()?;
        if algorithms::strategy_for_type(options.op_type).build.is_none() {
            return Err(AdapterError::UnsupportedOperation(options.op_type.to_string()));
        }
        if let Some(memo) = options.memo.as_deref() {
            hex::decode(memo).map_err(|e| AdapterError::invalid(keys::MEMO, e.to_string()))?;
        }

        let mut metadata = ConstructionMetadata {
            network_id: self.node.get_network_id().await?,
            blockchain_id: ChainId::EMPTY,
            asset_id: genesis.asset_id,
            memo: options.memo.clone(),
            source_chain_id: None,
            destination_chain_id: None,
            staking: None,
        };
        match options.op_type {
            OperationType::ImportAvax => {
                metadata.source_chain_id = Some(
                    self.chain_for_alias(options.source_chain.as_deref(), keys::SOURCE_CHAIN_ID)
                        .await?,
                );
            }
            OperationType::ExportAvax => {
                metadata.destination_chain_id = Some(
                    self.chain_for_alias(
                        options.destination_chain.as_deref(),
                        keys::DESTINATION_CHAIN_ID,
                    )
                    .await?,
                );
            }
            OperationType::AddValidator | OperationType::AddDelegator => {
                let staking = options
                    .staking
                    .clone()
                    .ok_or_else(|| AdapterError::invalid("staking", "required"))?;
                if options.op_type == OperationType::AddValidator && staking.shares.is_none() {
                    return Err(AdapterError::invalid(keys::SHARES, "required for validators"));
                }
                metadata.staking = Some(staking);
            }
            _ => {}
        }
        Ok(metadata)
    }

    fn build_tx(
        &self,
        op_type: &str,
        matched: &MatchedOperations,
        metadata: &ConstructionMetadata,
    ) -> Result<BuiltTransaction, AdapterError> {
        let op_type: OperationType = op_type.parse()?;
        if op_type != matched.op_type {
            return Err(AdapterError::invalid(
                keys::TYPE,
                format!("{} does not match operations of {}", op_type, matched.op_type),
            ));
        }
        algorithms::build_tx(matched, metadata)
    }

    fn combine(
        &self,
        unsigned_bytes: &[u8],
        signatures: &[Vec<u8>],
    ) -> Result<Vec<u8>, AdapterError> {
        let unsigned = UnsignedTx::from_bytes(unsigned_bytes)?;
        Ok(algorithms::sign_tx(unsigned, signatures)?.signed_bytes()?)
    }

    fn chain_time(&self) -> Result<u64, AdapterError> {
        self.genesis()?;
        Ok(self.chain_time.read())
    }
}
