//! Chain Access
//!
//! The [`ChainClient`] trait is the only way the rest of the crate touches a
//! node. [`JsonRpcChainClient`] is the production implementation; tests drive
//! the orchestrator with the in-memory `mock::MockChain`.

pub mod client;
pub mod rpc;

#[cfg(test)]
pub mod mock;

// Re-exports for convenience
pub use client::{ChainClient, ChainError, Receipt};
pub use rpc::JsonRpcChainClient;

#[cfg(test)]
pub use mock::MockChain;
