//! Configuration types for slot authoring

use serde::Deserialize;

/// Runtime configuration for slot authoring
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SlotConsensusConfig {
    /// Author blocks at all (false = observe only)
    pub authoring_enabled: bool,

    /// Number of recent blocks sampled when estimating slot start times
    pub slot_time_window: u64,

    /// Block budget
    pub block_limits: BlockLimits,

    /// Capacity of the sealed-block output channel
    pub block_channel_capacity: usize,

    /// Delay before the loop retries when no slot can be scheduled (ms)
    pub retry_delay_ms: u64,
}

impl Default for SlotConsensusConfig {
    fn default() -> Self {
        Self {
            authoring_enabled: true,
            slot_time_window: crate::DEFAULT_SLOT_TIME_WINDOW,
            block_limits: BlockLimits::default(),
            block_channel_capacity: 16,
            retry_delay_ms: crate::DEFAULT_RETRY_DELAY_MS,
        }
    }
}

/// Size budget applied while draining the pending queue into a block
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BlockLimits {
    /// Maximum number of extrinsics per block
    pub max_extrinsics: usize,

    /// Maximum total encoded size of the block body in bytes
    pub max_body_bytes: usize,
}

impl Default for BlockLimits {
    fn default() -> Self {
        Self {
            max_extrinsics: crate::DEFAULT_MAX_BLOCK_EXTRINSICS,
            max_body_bytes: crate::DEFAULT_MAX_BLOCK_BODY_BYTES,
        }
    }
}

impl BlockLimits {
    /// Returns true if one more extrinsic of `next_len` bytes still fits.
    pub fn admits(&self, included: usize, body_bytes: usize, next_len: usize) -> bool {
        included < self.max_extrinsics && body_bytes.saturating_add(next_len) <= self.max_body_bytes
    }

    /// Returns false for an extrinsic no block body could ever hold.
    pub fn fits_empty_block(&self, len: usize) -> bool {
        len <= self.max_body_bytes
    }
}
