//! Domain entities for slot authoring

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_crypto::{Sr25519PublicKey, Sr25519Signature, VrfSignature};
use shared_types::{DigestItem, PreDigest, SLOT_ENGINE_ID};

/// Length of the per-epoch randomness.
pub const RANDOMNESS_LENGTH: usize = 32;

/// Per-epoch randomness seeding the slot lottery.
pub type Randomness = [u8; RANDOMNESS_LENGTH];

/// Per-authority lottery cutoff; a lottery output below it wins the slot.
pub type Threshold = U256;

/// 2^128, the threshold of an authority that wins every slot.
pub fn max_threshold() -> Threshold {
    U256::one() << 128
}

/// Consensus parameters as reported by the execution engine, before validation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochConfigurationRaw {
    /// Slot duration in milliseconds
    pub slot_duration: u64,
    /// Slots per epoch
    pub epoch_length: u64,
    /// Probability ratio numerator
    pub c1: u64,
    /// Probability ratio denominator
    pub c2: u64,
    /// Encoded authority public keys
    pub authority_keys: Vec<Vec<u8>>,
    /// Authority weights, parallel to `authority_keys`
    pub authority_weights: Vec<u64>,
    /// Epoch randomness
    pub randomness: Vec<u8>,
    /// Whether secondary slots are enabled
    pub secondary_slots: bool,
}

/// A single authority entitled to claim slots
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorityData {
    /// sr25519 public key
    pub public_key: Sr25519PublicKey,
    /// Stake weight
    pub weight: u64,
}

/// Validated, immutable per-epoch configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpochConfiguration {
    /// Slot duration in milliseconds
    pub slot_duration: u64,
    /// Slots per epoch
    pub epoch_length: u64,
    /// Probability ratio numerator (c1 <= c2)
    pub c1: u64,
    /// Probability ratio denominator (> 0)
    pub c2: u64,
    /// Ordered authority set
    pub authorities: Vec<AuthorityData>,
    /// Epoch randomness
    pub randomness: Randomness,
    /// Whether secondary slots are enabled
    pub secondary_slots: bool,
}

impl EpochConfiguration {
    /// Epoch index a slot belongs to
    pub fn epoch_of(&self, slot: u64) -> u64 {
        slot / self.epoch_length
    }

    /// First slot of an epoch
    pub fn epoch_start(&self, epoch: u64) -> u64 {
        epoch.saturating_mul(self.epoch_length)
    }

    /// Authority weights in set order
    pub fn weights(&self) -> Vec<u64> {
        self.authorities.iter().map(|a| a.weight).collect()
    }

    /// Position of `key` in the authority set
    pub fn authority_index(&self, key: &Sr25519PublicKey) -> Option<u32> {
        self.authorities
            .iter()
            .position(|a| &a.public_key == key)
            .map(|idx| idx as u32)
    }
}

/// This node's view of the epoch's authority set
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthoritySet {
    /// Authorities in set order
    pub authorities: Vec<AuthorityData>,
    /// This node's position, `None` if the node is not an authority
    pub authority_index: Option<u32>,
}

impl AuthoritySet {
    /// Derive the set from a configuration and the local public key
    pub fn derive(config: &EpochConfiguration, local: &Sr25519PublicKey) -> Self {
        Self {
            authorities: config.authorities.clone(),
            authority_index: config.authority_index(local),
        }
    }

    /// Public key of the authority at `index`
    pub fn public_key(&self, index: u32) -> Option<&Sr25519PublicKey> {
        self.authorities.get(index as usize).map(|a| &a.public_key)
    }
}

/// A won slot: lottery value plus the VRF output and proof backing it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotClaim {
    /// Lottery value compared against the threshold
    pub lottery_output: u128,
    /// VRF pre-output and proof
    pub vrf: VrfSignature,
}

impl SlotClaim {
    /// Pre-digest carried by a block authored with this claim
    pub fn to_pre_digest(&self, authority_index: u32, slot_number: u64) -> PreDigest {
        PreDigest {
            authority_index,
            slot_number,
            vrf_output: self.vrf.output,
            vrf_proof: self.vrf.proof,
        }
    }

    /// Reconstruct the publishable part from a pre-digest
    pub fn vrf_from_pre_digest(pre: &PreDigest) -> VrfSignature {
        VrfSignature {
            output: pre.vrf_output,
            proof: pre.vrf_proof,
        }
    }
}

/// One tick of the slot clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    /// Monotonic slot number
    pub number: u64,
    /// Start instant (unix milliseconds)
    pub start: u64,
    /// Duration in milliseconds
    pub duration: u64,
}

impl Slot {
    /// End instant (unix milliseconds)
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.duration)
    }
}

/// Block producer signature over the pre-seal header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seal {
    /// sr25519 signature
    pub signature: Sr25519Signature,
}

impl Seal {
    /// Wrap into the terminal digest item
    pub fn to_digest_item(&self) -> DigestItem {
        DigestItem::Seal(SLOT_ENGINE_ID, self.signature.as_bytes().to_vec())
    }

    /// Parse a slot-engine seal digest item
    pub fn from_digest_item(item: &DigestItem) -> Option<Self> {
        item.as_seal(&SLOT_ENGINE_ID)
            .and_then(|bytes| Sr25519Signature::from_slice(bytes).ok())
            .map(|signature| Self { signature })
    }
}
