//! Shared builders for the integration flows and benchmarks.

use shared_crypto::Sr25519KeyPair;
use shared_types::PendingTransaction;
use shared_types::TransactionValidity;
use slot_consensus::adapters::RuntimeState;
use slot_consensus::{
    calculate_threshold, run_lottery, Call, EpochConfigurationRaw, InMemoryExecutionEngine,
    Randomness, SlotClaim, Threshold,
};

/// Epoch randomness used throughout the suite
pub const RANDOMNESS: Randomness = [0x5a; 32];

/// Slot duration used throughout the suite (ms)
pub const SLOT_DURATION: u64 = 1_000;

/// Deterministic authority key
pub fn authority(seed: u8) -> Sr25519KeyPair {
    Sr25519KeyPair::from_seed([seed; 32]).expect("any 32 bytes are a valid seed")
}

/// Equal-weight epoch over `keys`
pub fn epoch_config(keys: &[&Sr25519KeyPair], c1: u64, c2: u64) -> EpochConfigurationRaw {
    EpochConfigurationRaw {
        slot_duration: SLOT_DURATION,
        epoch_length: 100,
        c1,
        c2,
        authority_keys: keys
            .iter()
            .map(|k| k.public_key().as_bytes().to_vec())
            .collect(),
        authority_weights: vec![1; keys.len()],
        randomness: RANDOMNESS.to_vec(),
        secondary_slots: false,
    }
}

/// Engine over `raw` with accounts 1 and 2 endowed
pub fn engine(raw: EpochConfigurationRaw) -> InMemoryExecutionEngine {
    InMemoryExecutionEngine::new(raw, RuntimeState::with_balances([(1, 100), (2, 100)]))
        .expect("genesis state encodes")
}

/// Threshold every lottery output falls below
pub fn certain_threshold() -> Threshold {
    calculate_threshold(1, 1, 0, &[1]).expect("1/1 is a valid ratio")
}

/// Claim for `slot` under [`certain_threshold`]
pub fn winning_claim(keypair: &Sr25519KeyPair, slot: u64) -> SlotClaim {
    run_lottery(keypair, &RANDOMNESS, &certain_threshold(), slot)
        .expect("vrf evaluates")
        .expect("certain threshold always wins")
}

/// Transfer wrapped as a pending transaction
pub fn transfer(from: u64, to: u64, amount: u64, priority: u64) -> PendingTransaction {
    PendingTransaction::new(
        Call::Transfer { from, to, amount }.encode(),
        TransactionValidity {
            priority,
            ..TransactionValidity::default()
        },
    )
}
