//! # Algorithms Module
//!
//! Pure decode, parse and build logic. Nothing here touches the network.

pub mod block_decoder;
pub mod credentials;
pub mod dependencies;
pub mod matcher;
pub mod strategies;
pub mod tx_builder;
pub mod tx_parser;
pub mod unwrapper;

pub use block_decoder::{decode_block, decode_payload, resolve_timestamp, DecodedBlock};
pub use credentials::{assemble_credentials, sign_tx};
pub use dependencies::{collect_dependencies, DependencyRequest, DependencySet};
pub use matcher::match_operations;
pub use strategies::{strategy_for_kind, strategy_for_type, TxStrategy, STRATEGIES};
pub use tx_builder::build_tx;
pub use tx_parser::{parse_tx, OperationWriter, ParseContext, ParseMode};
pub use unwrapper::{proposer_node_id, ProposerEnvelope};
