//! # Core Chain Entities
//!
//! ## Clusters
//!
//! - **Chain**: [`Block`], [`BlockHeader`], [`DigestItem`], [`PreDigest`]
//! - **Transactions**: [`Extrinsic`], [`PendingTransaction`], [`TransactionValidity`]

use crate::errors::TypesError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_crypto::{blake3_hash, VRF_OUTPUT_LENGTH, VRF_PROOF_LENGTH};

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// A 32-byte hash (Blake3).
pub type Hash = [u8; 32];

/// Four-byte consensus engine identifier carried by digest items.
pub type EngineId = [u8; 4];

/// Engine identifier of the slot authoring engine.
pub const SLOT_ENGINE_ID: EngineId = *b"SLOT";

/// An entry in a header's digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DigestItem {
    /// Consensus data placed before block execution (the slot claim).
    PreRuntime(EngineId, Vec<u8>),
    /// Block producer's signature over the rest of the header.
    Seal(EngineId, Vec<u8>),
    /// Any other opaque entry.
    Other(Vec<u8>),
}

impl DigestItem {
    /// Returns the pre-runtime payload if this item belongs to `engine`.
    pub fn as_pre_runtime(&self, engine: &EngineId) -> Option<&[u8]> {
        match self {
            DigestItem::PreRuntime(id, data) if id == engine => Some(data),
            _ => None,
        }
    }

    /// Returns the seal payload if this item belongs to `engine`.
    pub fn as_seal(&self, engine: &EngineId) -> Option<&[u8]> {
        match self {
            DigestItem::Seal(id, data) if id == engine => Some(data),
            _ => None,
        }
    }
}

/// Proof that an authority won a slot, carried as the first digest item.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreDigest {
    /// Index of the authoring authority in the epoch's authority set.
    pub authority_index: u32,
    /// Slot the block was authored in.
    pub slot_number: u64,
    /// VRF pre-output.
    #[serde_as(as = "Bytes")]
    pub vrf_output: [u8; VRF_OUTPUT_LENGTH],
    /// VRF proof.
    #[serde_as(as = "Bytes")]
    pub vrf_proof: [u8; VRF_PROOF_LENGTH],
}

impl PreDigest {
    /// Canonical encoding.
    pub fn encode(&self) -> Result<Vec<u8>, TypesError> {
        bincode::serialize(self).map_err(|e| TypesError::Encoding(e.to_string()))
    }

    /// Decode from canonical encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self, TypesError> {
        bincode::deserialize(bytes).map_err(|e| TypesError::Decoding(e.to_string()))
    }

    /// Wrap into a digest item for the slot engine.
    pub fn to_digest_item(&self) -> Result<DigestItem, TypesError> {
        Ok(DigestItem::PreRuntime(SLOT_ENGINE_ID, self.encode()?))
    }
}

/// The header of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Hash of the parent header.
    pub parent_hash: Hash,
    /// Block number (height).
    pub number: u64,
    /// State root after applying the block's extrinsics.
    pub state_root: Hash,
    /// Ordered root over the block's extrinsics.
    pub extrinsics_root: Hash,
    /// Ordered digest items: pre-digest first, seal last.
    pub digest: Vec<DigestItem>,
}

impl BlockHeader {
    /// Canonical encoding. Seals are computed over this.
    pub fn encode(&self) -> Result<Vec<u8>, TypesError> {
        bincode::serialize(self).map_err(|e| TypesError::Encoding(e.to_string()))
    }

    /// Header hash (Blake3 of the canonical encoding).
    pub fn hash(&self) -> Result<Hash, TypesError> {
        Ok(blake3_hash(&self.encode()?))
    }

    /// Returns true for the genesis header.
    pub fn is_genesis(&self) -> bool {
        self.number == 0
    }

    /// Decoded slot pre-digest, if the first digest item carries one.
    pub fn pre_digest(&self) -> Option<PreDigest> {
        self.digest
            .first()
            .and_then(|item| item.as_pre_runtime(&SLOT_ENGINE_ID))
            .and_then(|data| PreDigest::decode(data).ok())
    }

    /// Slot recorded in the pre-digest.
    pub fn slot_number(&self) -> Option<u64> {
        self.pre_digest().map(|pre| pre.slot_number)
    }

    /// Returns true when the last digest item is a slot-engine seal.
    pub fn is_sealed(&self) -> bool {
        self.digest
            .last()
            .and_then(|item| item.as_seal(&SLOT_ENGINE_ID))
            .is_some()
    }
}

/// A complete block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// Applied extrinsics in application order.
    pub body: Vec<Extrinsic>,
}

// =============================================================================
// CLUSTER B: TRANSACTIONS
// =============================================================================

/// Opaque encoded extrinsic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Extrinsic(pub Vec<u8>);

impl Extrinsic {
    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the extrinsic carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Blake3 hash of the encoded bytes.
    pub fn hash(&self) -> Hash {
        blake3_hash(&self.0)
    }
}

impl AsRef<[u8]> for Extrinsic {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Extrinsic {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Validity metadata reported by transaction validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionValidity {
    /// Higher priority is included first.
    pub priority: u64,
    /// Number of blocks the transaction stays valid for.
    pub longevity: u64,
    /// Whether the transaction may be gossiped.
    pub propagate: bool,
}

impl Default for TransactionValidity {
    fn default() -> Self {
        Self {
            priority: 0,
            longevity: u64::MAX,
            propagate: true,
        }
    }
}

/// A validated extrinsic waiting in the pending queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// The extrinsic itself.
    pub extrinsic: Extrinsic,
    /// Validity metadata.
    pub validity: TransactionValidity,
}

impl PendingTransaction {
    /// Create a pending transaction.
    pub fn new(extrinsic: impl Into<Extrinsic>, validity: TransactionValidity) -> Self {
        Self {
            extrinsic: extrinsic.into(),
            validity,
        }
    }

    /// Create a pending transaction with default validity.
    pub fn with_default_validity(extrinsic: impl Into<Extrinsic>) -> Self {
        Self::new(extrinsic, TransactionValidity::default())
    }
}
