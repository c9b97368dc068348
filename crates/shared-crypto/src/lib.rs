//! # Shared Crypto - Signing, VRF and Hashing Primitives
//!
//! **Status:** Used by the slot authoring engine for block seals and slot
//! lottery proofs.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | BLAKE3 | Header hashes, ordered roots |
//! | `signatures` | sr25519 (Schnorr over Ristretto) | Block seals |
//! | `vrf` | sr25519 VRF | Slot lottery outputs and proofs |
//!
//! ## Security Properties
//!
//! - **sr25519**: Merlin transcripts, domain-separated signing contexts
//! - **VRF**: Output is bound to the public key and the transcript input;
//!   anyone holding the public key can re-derive it from the proof
//! - **BLAKE3**: 256-bit collision-resistant digests

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;
pub mod vrf;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{blake3_hash, ordered_root, Blake3Hasher};
pub use signatures::{Sr25519KeyPair, Sr25519PublicKey, Sr25519Signature};
pub use vrf::{VrfEvaluation, VrfSignature, VrfTranscript, VRF_OUTPUT_LENGTH, VRF_PROOF_LENGTH};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
