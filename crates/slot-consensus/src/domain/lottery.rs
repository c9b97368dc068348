//! VRF slot lottery
//!
//! The transcript is `randomness ‖ slot_le`, so every authority evaluates a
//! different but verifiable value per slot. 16 bytes extracted from the VRF
//! in/out form the lottery value, read as a little-endian `u128`.

use super::entities::{Randomness, SlotClaim, Threshold};
use crate::error::{Result, SlotConsensusError};
use crate::ports::AuthorityKeyPair;
use primitive_types::U256;
use shared_crypto::vrf::VRF_RANDOMNESS_LENGTH;
use shared_crypto::{Sr25519PublicKey, VrfSignature, VrfTranscript};
use tracing::{debug, instrument};

/// Signing context of the lottery transcript
pub const LOTTERY_CONTEXT: &[u8] = b"slot-chain-lottery";

/// Context under which the lottery value is extracted from the VRF in/out
pub const LOTTERY_OUTPUT_CONTEXT: &[u8] = b"slot-chain-lottery-output";

/// Transcript for `slot` in the epoch seeded by `randomness`
pub fn lottery_transcript(randomness: &Randomness, slot: u64) -> VrfTranscript {
    let mut message = Vec::with_capacity(randomness.len() + 8);
    message.extend_from_slice(randomness);
    message.extend_from_slice(&slot.to_le_bytes());
    VrfTranscript::new(LOTTERY_CONTEXT, message)
}

fn lottery_value(bytes: [u8; VRF_RANDOMNESS_LENGTH]) -> u128 {
    u128::from_le_bytes(bytes)
}

fn wins(value: u128, threshold: &Threshold) -> bool {
    U256::from(value) < *threshold
}

/// Evaluate the lottery for `slot`.
///
/// Returns `Ok(None)` when the slot was not won.
#[instrument(skip(keypair, randomness, threshold), level = "debug")]
pub fn run_lottery<K: AuthorityKeyPair + ?Sized>(
    keypair: &K,
    randomness: &Randomness,
    threshold: &Threshold,
    slot: u64,
) -> Result<Option<SlotClaim>> {
    let transcript = lottery_transcript(randomness, slot);
    let evaluation = keypair
        .vrf_prove(&transcript, LOTTERY_OUTPUT_CONTEXT)
        .map_err(|err| SlotConsensusError::VrfGenerationFailed(err.to_string()))?;

    let lottery_output = lottery_value(evaluation.randomness);
    if !wins(lottery_output, threshold) {
        return Ok(None);
    }

    debug!("[{}] won slot {}", crate::LOG_TARGET, slot);
    Ok(Some(SlotClaim {
        lottery_output,
        vrf: evaluation.signature,
    }))
}

/// Check that `vrf` proves a winning lottery for `slot` under `public_key`.
///
/// Returns false if the proof does not verify or the value re-derived from
/// it is not below `threshold`.
pub fn verify_claim(
    public_key: &Sr25519PublicKey,
    randomness: &Randomness,
    slot: u64,
    vrf: &VrfSignature,
    threshold: &Threshold,
) -> bool {
    let transcript = lottery_transcript(randomness, slot);
    match public_key.vrf_verify(&transcript, LOTTERY_OUTPUT_CONTEXT, vrf) {
        Ok(bytes) => wins(lottery_value(bytes), threshold),
        Err(err) => {
            debug!("[{}] claim for slot {} rejected: {}", crate::LOG_TARGET, slot, err);
            false
        }
    }
}
