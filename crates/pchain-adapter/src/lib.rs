//! # P-Chain Adapter
//!
//! Translation layer between a platform-chain node's native encoding and the
//! standardized operation-list representation.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Read Path
//!
//! container bytes → proposer unwrapper → block decoder → dependency
//! resolver → transaction parser → operations
//!
//! ## Write Path
//!
//! operations → matcher → transaction builder → unsigned bytes → (external
//! signing) → credential assembler → signed bytes
//!
//! ## Invariants
//!
//! | Invariant | Where |
//! |-----------|-------|
//! | Wrapped and bare forms of a block share one id | `algorithms::block_decoder` |
//! | Operation indices are contiguous, parse and build agree on order | `algorithms::tx_parser` |
//! | Same logical inputs/outputs build to identical bytes | `algorithms::tx_builder` |
//! | Signatures consumed exactly | `algorithms::credentials` |
//! | First fetch failure cancels every sibling fetch | `application::resolver` |
//!
//! ## Module Structure
//!
//! ```text
//! pchain-adapter/
//! ├── domain/          # Entities, errors, value objects, chain-time register
//! ├── algorithms/      # Unwrap, decode, parse, build, match, credentials
//! ├── ports/           # API trait (inbound) + node/genesis traits (outbound)
//! ├── adapters/        # In-memory node, static genesis source
//! ├── application/     # PChainAdapterService, DependencyResolver
//! └── config.rs        # AdapterConfig
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{FetchProbe, InMemoryNode, StaticGenesisSource};
pub use algorithms::{
    assemble_credentials, build_tx, collect_dependencies, decode_block, match_operations,
    parse_tx, sign_tx, ProposerEnvelope,
};
pub use application::{DependencyResolver, PChainAdapterService};
pub use config::AdapterConfig;
pub use domain::{
    AdapterError, BuiltTransaction, ChainAliases, ChainTimeRegister, CoinAction, CoinChange,
    ConstructionMetadata, ConstructionOptions, DependencyMap, DependencyTx, ErrorKind,
    FormatProfile, GenesisBlock, MatchedOperations, Metadata, Operation, OperationType,
    ParsedBlock, ParsedTransaction, SignerAccount, StakingMetadata, SubRole,
};
pub use ports::{GenesisConfig, GenesisSource, PChainAdapterApi, PChainClient};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
