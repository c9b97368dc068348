//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid key length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid signature format
    #[error("Invalid signature format")]
    InvalidSignatureFormat,

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid secret seed
    #[error("Invalid secret seed")]
    InvalidPrivateKey,

    /// VRF proof or pre-output could not be decoded
    #[error("Invalid VRF encoding: {0}")]
    InvalidVrfEncoding(String),

    /// VRF proof did not verify against the public key and transcript
    #[error("VRF verification failed: {0}")]
    VrfVerificationFailed(String),
}
