//! # Application Module
//!
//! Application services orchestrating the algorithms and outbound ports.

pub mod resolver;
pub mod service;

pub use resolver::DependencyResolver;
pub use service::PChainAdapterService;
