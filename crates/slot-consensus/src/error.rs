//! Error types for the slot authoring engine

use thiserror::Error;

/// Result type alias for slot authoring operations
pub type Result<T> = std::result::Result<T, SlotConsensusError>;

/// Errors that can occur while authoring blocks
#[derive(Debug, Error)]
pub enum SlotConsensusError {
    /// `c1/c2` does not describe a probability in [0, 1]
    #[error("Invalid probability ratio: c1={c1}, c2={c2}")]
    InvalidProbabilityRatio {
        /// Numerator
        c1: u64,
        /// Denominator
        c2: u64,
    },

    /// Authority weights cannot produce a weight share
    #[error("Invalid authority weights: {0}")]
    InvalidAuthorityWeights(String),

    /// Epoch configuration could not be fetched or was malformed
    #[error("Configuration unavailable: {0}")]
    ConfigurationUnavailable(String),

    /// The VRF backend failed to evaluate
    #[error("VRF generation failed: {0}")]
    VrfGenerationFailed(String),

    /// Median of an empty sample
    #[error("Empty sample: no blocks available for slot time estimation")]
    EmptySample,

    /// Slot range goes backwards
    #[error("Non-monotonic slots: start {start} > end {end}")]
    NonMonotonicSlots {
        /// Start slot
        start: u64,
        /// End slot
        end: u64,
    },

    /// Block building was requested for a slot without a stored claim
    #[error("No claim stored for slot {slot}")]
    NoClaimForSlot {
        /// Slot number
        slot: u64,
    },

    /// An extrinsic was rejected by the runtime and the attempt was aborted
    #[error("Block build failed at slot {slot}: {reason}")]
    BlockBuildFailed {
        /// Slot number
        slot: u64,
        /// Runtime rejection reason
        reason: String,
    },

    /// A seal was requested over a header that already carries one
    #[error("Header already sealed")]
    HeaderAlreadySealed,

    /// The execution engine could not open or finalize a block
    #[error("Execution engine unavailable: {0}")]
    ExecutionUnavailable(String),

    /// The chain view has no usable best block
    #[error("Chain view unavailable: {0}")]
    ChainViewUnavailable(String),

    /// Encoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The block output channel was closed by its consumer
    #[error("Block channel closed")]
    ChannelClosed,

    /// Shutdown was requested while a sealed block waited for channel space
    #[error("Session shutting down")]
    ShuttingDown,
}

impl From<shared_types::TypesError> for SlotConsensusError {
    fn from(err: shared_types::TypesError) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl SlotConsensusError {
    /// Check if error is recoverable (skip the slot and keep authoring)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationUnavailable(_)
                | Self::VrfGenerationFailed(_)
                | Self::BlockBuildFailed { .. }
                | Self::ExecutionUnavailable(_)
                | Self::ChainViewUnavailable(_)
                | Self::EmptySample
        )
    }

    /// Check if error is critical (authoring for the epoch or session must stop)
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::InvalidProbabilityRatio { .. }
                | Self::InvalidAuthorityWeights(_)
                | Self::NoClaimForSlot { .. }
                | Self::HeaderAlreadySealed
                | Self::ChannelClosed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_recoverability() {
        assert!(SlotConsensusError::ConfigurationUnavailable("down".into()).is_recoverable());
        assert!(SlotConsensusError::BlockBuildFailed {
            slot: 3,
            reason: "balance".into()
        }
        .is_recoverable());
        assert!(!SlotConsensusError::NoClaimForSlot { slot: 1 }.is_recoverable());
    }

    #[test]
    fn test_error_criticality() {
        assert!(SlotConsensusError::InvalidProbabilityRatio { c1: 5, c2: 4 }.is_critical());
        assert!(SlotConsensusError::NoClaimForSlot { slot: 1 }.is_critical());
        assert!(!SlotConsensusError::EmptySample.is_critical());

        let stopping = SlotConsensusError::ShuttingDown;
        assert!(!stopping.is_critical());
        assert!(!stopping.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = SlotConsensusError::NonMonotonicSlots { start: 10, end: 9 };
        assert_eq!(err.to_string(), "Non-monotonic slots: start 10 > end 9");
    }
}
