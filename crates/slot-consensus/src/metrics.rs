//! Metrics collection for slot authoring

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for slot authoring
#[derive(Debug, Default)]
pub struct Metrics {
    /// Slots for which the lottery ran
    pub slots_evaluated: AtomicU64,

    /// Slots won
    pub slots_claimed: AtomicU64,

    /// Sealed blocks emitted
    pub blocks_authored: AtomicU64,

    /// Build attempts that aborted
    pub build_failures: AtomicU64,

    /// Extrinsics included in emitted blocks
    pub extrinsics_included: AtomicU64,

    /// Extrinsics dropped as invalid or rejected
    pub extrinsics_dropped: AtomicU64,

    /// Extrinsics pushed back onto the queue after an aborted build
    pub extrinsics_requeued: AtomicU64,

    /// Epoch configuration loads that failed
    pub configuration_failures: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a lottery evaluation
    pub fn record_slot_evaluated(&self, won: bool) {
        self.slots_evaluated.fetch_add(1, Ordering::Relaxed);
        if won {
            self.slots_claimed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an emitted block
    pub fn record_block_authored(&self, extrinsic_count: usize) {
        self.blocks_authored.fetch_add(1, Ordering::Relaxed);
        self.extrinsics_included
            .fetch_add(extrinsic_count as u64, Ordering::Relaxed);
    }

    /// Record an aborted build
    pub fn record_build_failure(&self) {
        self.build_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record dropped extrinsics
    pub fn record_dropped(&self, count: usize) {
        self.extrinsics_dropped
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record requeued extrinsics
    pub fn record_requeued(&self, count: usize) {
        self.extrinsics_requeued
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record a failed configuration load
    pub fn record_configuration_failure(&self) {
        self.configuration_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get blocks authored
    pub fn get_blocks_authored(&self) -> u64 {
        self.blocks_authored.load(Ordering::Relaxed)
    }

    /// Get build failures
    pub fn get_build_failures(&self) -> u64 {
        self.build_failures.load(Ordering::Relaxed)
    }

    /// Fraction of evaluated slots that were won
    pub fn get_claim_rate(&self) -> f64 {
        let evaluated = self.slots_evaluated.load(Ordering::Relaxed);
        if evaluated == 0 {
            return 0.0;
        }
        let claimed = self.slots_claimed.load(Ordering::Relaxed);
        claimed as f64 / evaluated as f64
    }

    /// Get average extrinsics per authored block
    pub fn get_avg_extrinsics_per_block(&self) -> f64 {
        let blocks = self.blocks_authored.load(Ordering::Relaxed);
        if blocks == 0 {
            return 0.0;
        }
        let txs = self.extrinsics_included.load(Ordering::Relaxed);
        txs as f64 / blocks as f64
    }
}
