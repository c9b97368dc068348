//! # Node Configuration
//!
//! Configuration for the development node. Every value has a default and can
//! be overridden from the environment:
//!
//! | Variable              | Field                                   |
//! |-----------------------|-----------------------------------------|
//! | `SLOT_SEED`           | authority seed (64 hex chars)           |
//! | `SLOT_DURATION_MS`    | genesis slot duration                   |
//! | `SLOT_EPOCH_LENGTH`   | genesis epoch length in slots           |
//! | `SLOT_C1` / `SLOT_C2` | genesis probability ratio               |
//! | `SLOT_RANDOMNESS`     | genesis epoch randomness (64 hex chars) |
//! | `SLOT_TIME_WINDOW`    | slot-time estimator sample size         |
//! | `SLOT_MAX_EXTRINSICS` | per-block extrinsic cap                 |
//! | `SLOT_AUTHORING`      | `true` / `false`                        |
//! | `SLOT_DEMO_TRANSFERS` | `true` / `false`                        |
//!
//! Unparseable values are logged and ignored.

use slot_consensus::SlotConsensusConfig;
use thiserror::Error;
use tracing::{info, warn};

/// Account endowed at genesis that sends the demo transfers
pub const DEMO_SENDER: u64 = 1;

/// Account receiving the demo transfers
pub const DEMO_RECEIVER: u64 = 2;

/// Genesis parameters of the development chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisConfig {
    /// Slot duration in milliseconds.
    pub slot_duration_ms: u64,
    /// Slots per epoch.
    pub epoch_length: u64,
    /// Probability ratio numerator.
    pub c1: u64,
    /// Probability ratio denominator.
    pub c2: u64,
    /// First epoch randomness.
    pub randomness: [u8; 32],
    /// Initial balances.
    pub endowed: Vec<(u64, u64)>,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            slot_duration_ms: 2_000,
            epoch_length: 60,
            c1: 1,
            c2: 4,
            randomness: [0u8; 32],
            endowed: vec![(DEMO_SENDER, 1_000_000), (DEMO_RECEIVER, 1_000_000)],
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Slot authoring parameters.
    pub consensus: SlotConsensusConfig,
    /// Development chain genesis.
    pub genesis: GenesisConfig,
    /// Seed of the local authority key.
    pub authority_seed: [u8; 32],
    /// Submit a transfer every slot.
    pub demo_transfers: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            consensus: SlotConsensusConfig::default(),
            genesis: GenesisConfig::default(),
            authority_seed: [1u8; 32],
            demo_transfers: false,
        }
    }
}

impl NodeConfig {
    /// Reject configurations the node cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.genesis.slot_duration_ms == 0 {
            return Err(ConfigError::ZeroSlotDuration);
        }
        if self.genesis.epoch_length == 0 {
            return Err(ConfigError::ZeroEpochLength);
        }
        if self.genesis.c2 == 0 || self.genesis.c1 > self.genesis.c2 {
            return Err(ConfigError::InvalidRatio {
                c1: self.genesis.c1,
                c2: self.genesis.c2,
            });
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Slot duration of zero.
    #[error("slot duration must be positive")]
    ZeroSlotDuration,

    /// Epoch length of zero.
    #[error("epoch length must be positive")]
    ZeroEpochLength,

    /// Probability ratio outside `0 <= c1 <= c2, c2 > 0`.
    #[error("invalid probability ratio {c1}/{c2}")]
    InvalidRatio {
        /// Numerator
        c1: u64,
        /// Denominator
        c2: u64,
    },
}

/// Load configuration from the process environment.
pub fn load_config() -> NodeConfig {
    load_config_from(|key| std::env::var(key).ok())
}

/// Load configuration, reading overrides through `lookup`.
pub fn load_config_from(lookup: impl Fn(&str) -> Option<String>) -> NodeConfig {
    let mut config = NodeConfig::default();

    if let Some(seed) = lookup("SLOT_SEED") {
        if let Some(bytes) = decode_32(&seed, "SLOT_SEED") {
            config.authority_seed = bytes;
            info!("Loaded authority seed from environment");
        }
    }
    if let Some(randomness) = lookup("SLOT_RANDOMNESS") {
        if let Some(bytes) = decode_32(&randomness, "SLOT_RANDOMNESS") {
            config.genesis.randomness = bytes;
        }
    }

    override_parsed(&lookup, "SLOT_DURATION_MS", &mut config.genesis.slot_duration_ms);
    override_parsed(&lookup, "SLOT_EPOCH_LENGTH", &mut config.genesis.epoch_length);
    override_parsed(&lookup, "SLOT_C1", &mut config.genesis.c1);
    override_parsed(&lookup, "SLOT_C2", &mut config.genesis.c2);
    override_parsed(&lookup, "SLOT_TIME_WINDOW", &mut config.consensus.slot_time_window);
    override_parsed(
        &lookup,
        "SLOT_MAX_EXTRINSICS",
        &mut config.consensus.block_limits.max_extrinsics,
    );
    override_parsed(&lookup, "SLOT_AUTHORING", &mut config.consensus.authoring_enabled);
    override_parsed(&lookup, "SLOT_DEMO_TRANSFERS", &mut config.demo_transfers);

    config
}

fn override_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => warn!("{} has unparseable value {:?}, keeping default", key, raw),
        }
    }
}

fn decode_32(raw: &str, key: &str) -> Option<[u8; 32]> {
    match hex::decode(raw.trim().trim_start_matches("0x")) {
        Ok(bytes) if bytes.len() == 32 => {
            let mut out = [0u8; 32];
            out.copy_from_slice(&bytes);
            Some(out)
        }
        Ok(_) => {
            warn!("{} must be 32 bytes (64 hex chars)", key);
            None
        }
        Err(err) => {
            warn!("{} is not valid hex: {}", key, err);
            None
        }
    }
}
