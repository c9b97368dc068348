//! Epoch configuration loading
//!
//! The runtime reports consensus parameters as a loosely typed record; every
//! field is checked before a [`EpochConfiguration`] is handed to the session.
//! The probability ratio is left to the threshold calculation so that an
//! out-of-range `c1` halts authoring for the epoch instead of retrying.

use super::entities::{
    AuthorityData, EpochConfiguration, EpochConfigurationRaw, Randomness, RANDOMNESS_LENGTH,
};
use crate::error::{Result, SlotConsensusError};
use crate::ports::ExecutionEngine;
use shared_crypto::Sr25519PublicKey;
use tracing::{debug, warn};

fn unavailable(reason: impl Into<String>) -> SlotConsensusError {
    SlotConsensusError::ConfigurationUnavailable(reason.into())
}

/// Validate a raw configuration record.
pub fn validate_configuration(raw: EpochConfigurationRaw) -> Result<EpochConfiguration> {
    if raw.slot_duration == 0 {
        return Err(unavailable("slot duration is zero"));
    }
    if raw.epoch_length == 0 {
        return Err(unavailable("epoch length is zero"));
    }
    if raw.c2 == 0 {
        return Err(unavailable("probability denominator is zero"));
    }
    if raw.authority_keys.len() != raw.authority_weights.len() {
        return Err(unavailable(format!(
            "{} authority keys but {} weights",
            raw.authority_keys.len(),
            raw.authority_weights.len()
        )));
    }

    let randomness: Randomness = raw.randomness.as_slice().try_into().map_err(|_| {
        unavailable(format!(
            "randomness must be {} bytes, got {}",
            RANDOMNESS_LENGTH,
            raw.randomness.len()
        ))
    })?;

    let authorities = raw
        .authority_keys
        .iter()
        .zip(&raw.authority_weights)
        .enumerate()
        .map(|(idx, (key, weight))| {
            Sr25519PublicKey::from_slice(key)
                .map(|public_key| AuthorityData {
                    public_key,
                    weight: *weight,
                })
                .map_err(|err| unavailable(format!("authority {idx}: {err}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(EpochConfiguration {
        slot_duration: raw.slot_duration,
        epoch_length: raw.epoch_length,
        c1: raw.c1,
        c2: raw.c2,
        authorities,
        randomness,
        secondary_slots: raw.secondary_slots,
    })
}

/// Fetch and validate the current epoch configuration.
pub async fn load_configuration<E: ExecutionEngine + ?Sized>(
    engine: &E,
) -> Result<EpochConfiguration> {
    let raw = engine.query_consensus_configuration().await.map_err(|err| {
        warn!("[{}] consensus configuration query failed: {}", crate::LOG_TARGET, err);
        unavailable(err.to_string())
    })?;

    let config = validate_configuration(raw)?;
    debug!(
        "[{}] loaded epoch configuration: {} authorities, slot {}ms, epoch {} slots",
        crate::LOG_TARGET,
        config.authorities.len(),
        config.slot_duration,
        config.epoch_length
    );
    Ok(config)
}
