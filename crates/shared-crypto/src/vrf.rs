//! # sr25519 VRF
//!
//! Verifiable random function on top of schnorrkel. The prover evaluates the
//! VRF over a domain-separated transcript and publishes the pre-output plus a
//! DLEQ proof; a verifier holding the public key re-derives the same output.
//!
//! Callers get a fixed-width `randomness` value extracted from the VRF in/out
//! under a caller-chosen context, which is what slot lotteries compare
//! against their threshold.

use crate::{CryptoError, Sr25519KeyPair, Sr25519PublicKey};
use schnorrkel::signing_context;
use schnorrkel::vrf::{VRFInOut, VRFPreOut, VRFProof};

/// Length of the VRF pre-output encoded by the backend.
pub const VRF_OUTPUT_LENGTH: usize = 32;

/// Length of the VRF proof encoded by the backend.
pub const VRF_PROOF_LENGTH: usize = 64;

/// Length of the randomness extracted from a VRF evaluation.
pub const VRF_RANDOMNESS_LENGTH: usize = 16;

/// Domain-separated VRF input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VrfTranscript {
    context: &'static [u8],
    message: Vec<u8>,
}

impl VrfTranscript {
    /// Build a transcript over `message` under signing `context`.
    pub fn new(context: &'static [u8], message: Vec<u8>) -> Self {
        Self { context, message }
    }

    /// Signing context label.
    pub fn context(&self) -> &'static [u8] {
        self.context
    }

    /// Raw transcript message.
    pub fn message(&self) -> &[u8] {
        &self.message
    }
}

/// Published part of a VRF evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VrfSignature {
    /// VRF pre-output (compressed Ristretto point).
    pub output: [u8; VRF_OUTPUT_LENGTH],
    /// DLEQ proof binding `output` to the public key.
    pub proof: [u8; VRF_PROOF_LENGTH],
}

/// Result of a VRF evaluation by the key holder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VrfEvaluation {
    /// Publishable output and proof.
    pub signature: VrfSignature,
    /// Randomness extracted from the in/out under the randomness context.
    pub randomness: [u8; VRF_RANDOMNESS_LENGTH],
}

fn extract(inout: &VRFInOut, randomness_context: &[u8]) -> [u8; VRF_RANDOMNESS_LENGTH] {
    inout.make_bytes::<[u8; VRF_RANDOMNESS_LENGTH]>(randomness_context)
}

impl Sr25519KeyPair {
    /// Evaluate the VRF over `transcript`.
    ///
    /// `randomness_context` selects which bytes are extracted from the
    /// in/out; the verifier must use the same label.
    pub fn vrf_sign(
        &self,
        transcript: &VrfTranscript,
        randomness_context: &[u8],
    ) -> Result<VrfEvaluation, CryptoError> {
        let context = signing_context(transcript.context());
        let (inout, proof, _) = self.inner().vrf_sign(context.bytes(transcript.message()));

        Ok(VrfEvaluation {
            signature: VrfSignature {
                output: inout.to_preout().to_bytes(),
                proof: proof.to_bytes(),
            },
            randomness: extract(&inout, randomness_context),
        })
    }
}

impl Sr25519PublicKey {
    /// Verify a VRF signature and return the extracted randomness.
    pub fn vrf_verify(
        &self,
        transcript: &VrfTranscript,
        randomness_context: &[u8],
        signature: &VrfSignature,
    ) -> Result<[u8; VRF_RANDOMNESS_LENGTH], CryptoError> {
        let public = self.to_schnorrkel()?;
        let preout = VRFPreOut::from_bytes(&signature.output)
            .map_err(|err| CryptoError::InvalidVrfEncoding(format!("pre-output: {err}")))?;
        let proof = VRFProof::from_bytes(&signature.proof)
            .map_err(|err| CryptoError::InvalidVrfEncoding(format!("proof: {err}")))?;

        let context = signing_context(transcript.context());
        let (inout, _) = public
            .vrf_verify(context.bytes(transcript.message()), &preout, &proof)
            .map_err(|err| CryptoError::VrfVerificationFailed(format!("{err}")))?;

        Ok(extract(&inout, randomness_context))
    }
}
