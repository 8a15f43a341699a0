//! # Domain Module
//!
//! Core types for the platform-chain adapter.

pub mod chain_time;
pub mod entities;
pub mod errors;
pub mod value_objects;

pub use chain_time::ChainTimeRegister;
pub use entities::*;
pub use errors::*;
pub use value_objects::*;
