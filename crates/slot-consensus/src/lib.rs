//! # Slot Consensus - Slot-Based Block Authoring Engine
//!
//! **Bounded Context:** Leader Election & Block Authoring
//! **Architecture Compliance:** DDD + Hexagonal + TDD
//!
//! ## Purpose
//!
//! For every discrete time slot each authority privately decides whether it
//! has won the right to author the next block. Winners build, seal and emit
//! that block:
//! - VRF lottery over `epoch randomness ‖ slot` compared against a per-epoch
//!   threshold derived from the authority's stake share
//! - Epoch configuration fetched from the execution engine at boundaries
//! - Slot start times estimated from the median drift of recently observed
//!   blocks rather than the local clock alone
//! - Block assembly that drains a shared priority queue and restores applied
//!   extrinsics when the runtime rejects the attempt
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Adapters (Outer)                                   │
//! │  - InMemoryExecutionEngine: balances / kv runtime   │
//! │  - InMemoryChainView: block tree with arrivals      │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports (Middle)                                     │
//! │  - ExecutionEngine, ChainView, AuthorityKeyPair,    │
//! │    TimeSource                                       │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (Inner)                                     │
//! │  - threshold, lottery, slot_time, seal (pure)       │
//! │  - epoch loader, block builder (drive the ports)    │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Session: tick-driven state machine, one task       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Critical Invariants
//!
//! 1. **Threshold**: bounded by 2^128, exactly 2^128 when `c1 == c2`
//! 2. **Digest Order**: pre-digest first, seal last, seal never signs itself
//! 3. **Requeue Order**: extrinsics applied by an aborted build return to the
//!    queue front in their original order
//! 4. **Sequential Builds**: one build at a time, ordered by slot number
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! let (tx, mut blocks) = tokio::sync::mpsc::channel(config.block_channel_capacity);
//! let handle = Session::new(config, deps, tx).start();
//! while let Some(block) = blocks.recv().await {
//!     chain.import(block.header, time.now())?;
//! }
//! handle.stop().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// In-memory adapters for the outbound ports
pub mod adapters;
/// Domain models and authoring logic
pub mod domain;
pub mod ports;
pub mod queue;
pub mod session;

mod config;
mod error;
mod metrics;

pub use config::{BlockLimits, SlotConsensusConfig};
pub use error::{Result, SlotConsensusError};
pub use metrics::Metrics;

pub use domain::{
    build_seal, calculate_threshold, estimate_slot_time, load_configuration, median,
    run_lottery, seal_header, slot_offset, validate_configuration, verify_claim, verify_seal,
    verify_sealed_header, AuthorityData, AuthoritySet, BlockBuilder, BuiltBlock,
    EpochConfiguration, EpochConfigurationRaw, Randomness, Seal, Slot, SlotClaim, Threshold,
};

pub use ports::{
    AuthorityKeyPair, BlockRoots, ChainView, ExecutionEngine, ExecutionError, ObservedBlock,
    SystemTimeSource, TimeSource,
};

pub use adapters::{Call, InMemoryChainView, InMemoryExecutionEngine};
pub use queue::TransactionQueue;
pub use session::{Session, SessionDependencies, SessionHandle, SessionState};

/// Log prefix for this subsystem
pub const LOG_TARGET: &str = "slot";

/// Default number of recent blocks sampled by the slot-time estimator
pub const DEFAULT_SLOT_TIME_WINDOW: u64 = 20;

/// Default maximum number of extrinsics per block
pub const DEFAULT_MAX_BLOCK_EXTRINSICS: usize = 1_024;

/// Default maximum block body size (4 MiB)
pub const DEFAULT_MAX_BLOCK_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Default delay before retrying after a failed configuration load (ms)
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
