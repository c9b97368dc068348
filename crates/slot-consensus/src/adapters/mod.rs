//! # Adapters Module
//!
//! In-memory implementations of the outbound ports, used by the dev node and
//! the integration tests.
//!
//! ## Modules
//!
//! - `chain`: block tree with local arrival timestamps
//! - `execution`: balances / key-value runtime with bincode-encoded calls

pub mod chain;
pub mod execution;

pub use chain::InMemoryChainView;
pub use execution::{Call, ExecutionContext, InMemoryExecutionEngine, RuntimeState};
