//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound port traits without a network transport.

mod in_memory_node;
mod static_genesis;

pub use in_memory_node::{FetchProbe, InMemoryNode};
pub use static_genesis::StaticGenesisSource;
