//! Outbound ports (driven side - SPI)

use crate::domain::EpochConfigurationRaw;
use async_trait::async_trait;
use shared_crypto::{
    CryptoError, Sr25519KeyPair, Sr25519PublicKey, Sr25519Signature, VrfEvaluation,
    VrfTranscript,
};
use shared_types::{BlockHeader, DigestItem, Extrinsic, Hash};
use thiserror::Error;

/// Failures reported by the execution engine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// The extrinsic itself is malformed (undecodable, bad signature)
    #[error("Invalid extrinsic: {0}")]
    InvalidExtrinsic(String),

    /// A well-formed extrinsic could not execute against current state
    #[error("Rejected by runtime: {0}")]
    Rejected(String),

    /// The engine could not serve the request at all
    #[error("Execution engine unavailable: {0}")]
    Unavailable(String),
}

/// Roots computed when a block is finalized
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockRoots {
    /// Post-state root
    pub state_root: Hash,
    /// Root over the applied extrinsics
    pub extrinsics_root: Hash,
}

/// Port: state-transition execution engine
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Per-block execution context
    type Context: Send;

    /// Consensus parameters for the current epoch
    async fn query_consensus_configuration(
        &self,
    ) -> Result<EpochConfigurationRaw, ExecutionError>;

    /// Open a block on top of `parent` carrying `pre_digest`
    async fn initialize_block(
        &self,
        parent: &BlockHeader,
        pre_digest: &DigestItem,
    ) -> Result<Self::Context, ExecutionError>;

    /// Apply one extrinsic inside `context`
    async fn apply_extrinsic(
        &self,
        context: &mut Self::Context,
        extrinsic: &Extrinsic,
    ) -> Result<(), ExecutionError>;

    /// Close the block and compute its roots
    async fn finalize_block(&self, context: Self::Context) -> Result<BlockRoots, ExecutionError>;
}

/// A block as observed locally
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedBlock {
    /// Block header
    pub header: BlockHeader,
    /// Local arrival timestamp (unix milliseconds)
    pub arrival: u64,
}

/// Port: read-only view of the local block tree
pub trait ChainView: Send + Sync {
    /// Hash of the current best block, `None` before genesis is known
    fn best_hash(&self) -> Option<Hash>;

    /// Look up a block with its arrival time
    fn block(&self, hash: &Hash) -> Option<ObservedBlock>;
}

/// Port: the authority's key material
pub trait AuthorityKeyPair: Send + Sync {
    /// Public half of the key
    fn public_key(&self) -> Sr25519PublicKey;

    /// Sign `message` under `context`
    fn sign(&self, context: &[u8], message: &[u8]) -> Sr25519Signature;

    /// Evaluate the VRF over `transcript`
    fn vrf_prove(
        &self,
        transcript: &VrfTranscript,
        randomness_context: &[u8],
    ) -> Result<VrfEvaluation, CryptoError>;
}

impl AuthorityKeyPair for Sr25519KeyPair {
    fn public_key(&self) -> Sr25519PublicKey {
        Sr25519KeyPair::public_key(self)
    }

    fn sign(&self, context: &[u8], message: &[u8]) -> Sr25519Signature {
        Sr25519KeyPair::sign(self, context, message)
    }

    fn vrf_prove(
        &self,
        transcript: &VrfTranscript,
        randomness_context: &[u8],
    ) -> Result<VrfEvaluation, CryptoError> {
        self.vrf_sign(transcript, randomness_context)
    }
}

/// Time source for slot scheduling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn now(&self) -> u64;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
