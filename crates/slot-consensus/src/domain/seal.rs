//! Block sealing
//!
//! The seal is an sr25519 signature over the canonical header encoding
//! taken before the seal item is appended.

use super::entities::Seal;
use crate::error::{Result, SlotConsensusError};
use crate::ports::AuthorityKeyPair;
use shared_crypto::Sr25519PublicKey;
use shared_types::BlockHeader;

/// Signing context for block seals
pub const SEAL_CONTEXT: &[u8] = b"slot-chain-seal";

/// Sign `header`, which must not already be sealed.
pub fn build_seal<K: AuthorityKeyPair + ?Sized>(header: &BlockHeader, keypair: &K) -> Result<Seal> {
    if header.is_sealed() {
        return Err(SlotConsensusError::HeaderAlreadySealed);
    }
    let encoded = header.encode()?;
    Ok(Seal {
        signature: keypair.sign(SEAL_CONTEXT, &encoded),
    })
}

/// Check `seal` over the unsealed `header`.
pub fn verify_seal(header: &BlockHeader, seal: &Seal, public_key: &Sr25519PublicKey) -> bool {
    match header.encode() {
        Ok(encoded) => public_key
            .verify(SEAL_CONTEXT, &encoded, &seal.signature)
            .is_ok(),
        Err(_) => false,
    }
}

/// Seal `header` in place by appending the seal digest item.
pub fn seal_header<K: AuthorityKeyPair + ?Sized>(
    header: &mut BlockHeader,
    keypair: &K,
) -> Result<Seal> {
    let seal = build_seal(header, keypair)?;
    header.digest.push(seal.to_digest_item());
    Ok(seal)
}

/// Verify a sealed header: the last digest item must be a seal that
/// verifies over the header without it.
pub fn verify_sealed_header(header: &BlockHeader, public_key: &Sr25519PublicKey) -> bool {
    let Some(seal) = header.digest.last().and_then(Seal::from_digest_item) else {
        return false;
    };
    let mut unsealed = header.clone();
    unsealed.digest.pop();
    verify_seal(&unsealed, &seal, public_key)
}
