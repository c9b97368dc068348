//! # Slot-Chain Development Node
//!
//! Library half of the `node-runtime` binary: configuration loading and the
//! single-authority [`DevNode`] wiring.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, then `SLOT_*` environment overrides)
//! 2. Validate the genesis parameters
//! 3. Build genesis state and import the genesis header
//! 4. Start the slot authoring session and the block importer
//! 5. Wait for Ctrl+C, then shut down gracefully

pub mod config;
pub mod node;

pub use config::{load_config, load_config_from, ConfigError, GenesisConfig, NodeConfig};
pub use node::{DevNode, RunningNode};
