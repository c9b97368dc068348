//! Slot start estimation from observed block arrivals
//!
//! Each recent block yields one estimate of the target slot's start:
//! its arrival time plus the number of slots between it and the target.
//! The median of those estimates equals `median(drift) + target · duration`
//! with `drift = arrival - slot · duration`, and a single late or early
//! block cannot move it.

use crate::error::{Result, SlotConsensusError};
use crate::ports::ChainView;
use shared_types::BlockHeader;
use tracing::trace;

/// Median of `values`.
///
/// Odd length returns the middle element after sorting; even length returns
/// the floor of the average of the two middle elements.
pub fn median(values: &[u64]) -> Result<u64> {
    if values.is_empty() {
        return Err(SlotConsensusError::EmptySample);
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Ok(sorted[mid])
    } else {
        let sum = sorted[mid - 1] as u128 + sorted[mid] as u128;
        Ok((sum / 2) as u64)
    }
}

/// Number of slots from `start` to `end`.
pub fn slot_offset(start: u64, end: u64) -> Result<u64> {
    end.checked_sub(start)
        .ok_or(SlotConsensusError::NonMonotonicSlots { start, end })
}

/// Slot a block was authored in.
///
/// Read from the pre-digest; headers without one (genesis) are attributed
/// to the slot equal to their number.
pub fn slot_of(header: &BlockHeader) -> u64 {
    header.slot_number().unwrap_or(header.number)
}

/// Estimate the start (unix ms) of `target_slot`.
///
/// Walks back from the best block over at most `window` blocks.
///
/// # Errors
///
/// - `ChainViewUnavailable` if the chain view has no best block
/// - `NonMonotonicSlots` if a sampled block is from a slot after `target_slot`
/// - `EmptySample` if `window` is zero
pub fn estimate_slot_time<C: ChainView + ?Sized>(
    target_slot: u64,
    chain: &C,
    window: u64,
    slot_duration: u64,
) -> Result<u64> {
    let best = chain
        .best_hash()
        .ok_or_else(|| SlotConsensusError::ChainViewUnavailable("no best block".into()))?;

    let mut estimates = Vec::with_capacity(window.min(1_024) as usize);
    let mut cursor = chain.block(&best);
    if cursor.is_none() {
        return Err(SlotConsensusError::ChainViewUnavailable(
            "best block not found".into(),
        ));
    }

    while let Some(observed) = cursor {
        if estimates.len() as u64 >= window {
            break;
        }
        let offset = slot_offset(slot_of(&observed.header), target_slot)?;
        estimates.push(
            observed
                .arrival
                .saturating_add(offset.saturating_mul(slot_duration)),
        );

        if observed.header.is_genesis() {
            break;
        }
        cursor = chain.block(&observed.header.parent_hash);
    }

    let estimate = median(&estimates)?;
    trace!(
        "[{}] slot {} estimated at {} from {} blocks",
        crate::LOG_TARGET,
        target_slot,
        estimate,
        estimates.len()
    );
    Ok(estimate)
}
