//! # sr25519 Signatures
//!
//! Schnorr signatures over the Ristretto group (schnorrkel).
//!
//! ## Security Properties
//!
//! - Every signature is bound to a signing context (domain separation), so a
//!   seal signature can never be replayed as a signature for another purpose
//! - Same keypair serves signing and VRF evaluation (see [`crate::vrf`])

use crate::CryptoError;
use schnorrkel::{signing_context, ExpansionMode, Keypair, MiniSecretKey, PublicKey, Signature};
use std::fmt;
use zeroize::Zeroize;

/// Length of an sr25519 public key.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Length of an sr25519 signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// sr25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sr25519PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl Sr25519PublicKey {
    /// Create from bytes, checking the encoding is a valid Ristretto point.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Result<Self, CryptoError> {
        PublicKey::from_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Create from a slice of unknown length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] =
            bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: PUBLIC_KEY_LENGTH,
                actual: bytes.len(),
            })?;
        Self::from_bytes(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    pub(crate) fn to_schnorrkel(self) -> Result<PublicKey, CryptoError> {
        PublicKey::from_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Verify a signature made under `context`.
    pub fn verify(
        &self,
        context: &[u8],
        message: &[u8],
        signature: &Sr25519Signature,
    ) -> Result<(), CryptoError> {
        let public = self.to_schnorrkel()?;
        let sig = Signature::from_bytes(&signature.0)
            .map_err(|_| CryptoError::InvalidSignatureFormat)?;

        public
            .verify(signing_context(context).bytes(message), &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

impl fmt::Debug for Sr25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sr25519PublicKey(0x")?;
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

/// sr25519 signature (64 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sr25519Signature([u8; SIGNATURE_LENGTH]);

impl Sr25519Signature {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create from a slice of unknown length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; SIGNATURE_LENGTH] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureFormat)?;
        Ok(Self(bytes))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }
}

/// sr25519 keypair.
pub struct Sr25519KeyPair {
    seed: [u8; 32],
    keypair: Keypair,
}

impl Sr25519KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let mini = MiniSecretKey::generate();
        Self::from_mini(mini)
    }

    /// Create from secret seed (32 bytes).
    pub fn from_seed(seed: [u8; 32]) -> Result<Self, CryptoError> {
        let mini = MiniSecretKey::from_bytes(&seed).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self::from_mini(mini))
    }

    fn from_mini(mini: MiniSecretKey) -> Self {
        let keypair = mini.expand_to_keypair(ExpansionMode::Ed25519);
        Self {
            seed: mini.to_bytes(),
            keypair,
        }
    }

    /// Get public key.
    pub fn public_key(&self) -> Sr25519PublicKey {
        Sr25519PublicKey(self.keypair.public.to_bytes())
    }

    /// Sign a message under `context`.
    pub fn sign(&self, context: &[u8], message: &[u8]) -> Sr25519Signature {
        let sig = self.keypair.sign(signing_context(context).bytes(message));
        Sr25519Signature(sig.to_bytes())
    }

    /// Get secret seed (for serialization).
    pub fn to_seed(&self) -> [u8; 32] {
        self.seed
    }

    pub(crate) fn inner(&self) -> &Keypair {
        &self.keypair
    }
}

impl fmt::Debug for Sr25519KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sr25519KeyPair")
            .field("public", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl Drop for Sr25519KeyPair {
    fn drop(&mut self) {
        // Zeroize secret key material
        self.seed.zeroize();
    }
}
