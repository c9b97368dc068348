//! In-memory execution engine
//!
//! A small runtime with two calls, encoded with bincode:
//! - `Store` writes a key/value pair
//! - `Transfer` moves balance between accounts and is rejected when the
//!   sender cannot cover the amount
//!
//! Post-states are kept per state root, so blocks can be built on any
//! finalized parent.

use crate::domain::EpochConfigurationRaw;
use crate::error::{Result, SlotConsensusError};
use crate::ports::{BlockRoots, ExecutionEngine, ExecutionError};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_crypto::{blake3_hash, ordered_root};
use shared_types::{BlockHeader, DigestItem, Extrinsic, Hash};
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// Runtime call carried by an extrinsic
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Call {
    /// Write `value` under `key`
    Store {
        /// Storage key
        key: Vec<u8>,
        /// Storage value
        value: Vec<u8>,
    },
    /// Move `amount` from `from` to `to`
    Transfer {
        /// Sending account
        from: u64,
        /// Receiving account
        to: u64,
        /// Amount moved
        amount: u64,
    },
}

impl Call {
    /// Encode as an extrinsic
    pub fn encode(&self) -> Extrinsic {
        Extrinsic(bincode::serialize(self).unwrap_or_default())
    }

    /// Decode an extrinsic
    pub fn decode(extrinsic: &Extrinsic) -> std::result::Result<Self, ExecutionError> {
        bincode::deserialize(&extrinsic.0)
            .map_err(|err| ExecutionError::InvalidExtrinsic(format!("undecodable call: {err}")))
    }
}

/// Runtime state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeState {
    /// Account balances
    pub balances: BTreeMap<u64, u64>,
    /// Key/value storage
    pub storage: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl RuntimeState {
    /// State with the given balances
    pub fn with_balances(balances: impl IntoIterator<Item = (u64, u64)>) -> Self {
        Self {
            balances: balances.into_iter().collect(),
            storage: BTreeMap::new(),
        }
    }

    /// Blake3 root over the canonical encoding
    pub fn root(&self) -> std::result::Result<Hash, ExecutionError> {
        bincode::serialize(self)
            .map(|bytes| blake3_hash(&bytes))
            .map_err(|err| ExecutionError::Unavailable(format!("state encoding: {err}")))
    }

    fn apply(&mut self, call: Call) -> std::result::Result<(), ExecutionError> {
        match call {
            Call::Store { key, value } => {
                self.storage.insert(key, value);
                Ok(())
            }
            Call::Transfer { from, to, amount } => {
                let available = self.balances.get(&from).copied().unwrap_or(0);
                let remaining = available.checked_sub(amount).ok_or_else(|| {
                    ExecutionError::Rejected(format!(
                        "account {from} has {available}, needs {amount}"
                    ))
                })?;
                self.balances.insert(from, remaining);

                let received = self.balances.get(&to).copied().unwrap_or(0);
                let credited = received.checked_add(amount).ok_or_else(|| {
                    ExecutionError::Rejected(format!("balance overflow for account {to}"))
                })?;
                self.balances.insert(to, credited);
                Ok(())
            }
        }
    }
}

/// Block under construction
#[derive(Debug)]
pub struct ExecutionContext {
    state: RuntimeState,
    extrinsics: Vec<Extrinsic>,
}

/// Execution engine backed by in-memory state
#[derive(Debug)]
pub struct InMemoryExecutionEngine {
    consensus: RwLock<EpochConfigurationRaw>,
    states: RwLock<HashMap<Hash, RuntimeState>>,
    genesis_root: Hash,
}

impl InMemoryExecutionEngine {
    /// Create an engine reporting `consensus` and starting from `genesis`
    pub fn new(consensus: EpochConfigurationRaw, genesis: RuntimeState) -> Result<Self> {
        let genesis_root = genesis
            .root()
            .map_err(|err| SlotConsensusError::Encoding(err.to_string()))?;
        let mut states = HashMap::new();
        states.insert(genesis_root, genesis);

        Ok(Self {
            consensus: RwLock::new(consensus),
            states: RwLock::new(states),
            genesis_root,
        })
    }

    /// Genesis header committing to the genesis state
    pub fn genesis_header(&self) -> BlockHeader {
        BlockHeader {
            state_root: self.genesis_root,
            extrinsics_root: ordered_root::<Extrinsic>(&[]),
            ..BlockHeader::default()
        }
    }

    /// Replace the consensus configuration reported from now on
    pub fn set_consensus_configuration(&self, consensus: EpochConfigurationRaw) {
        *self.consensus.write() = consensus;
    }

    /// State committed under `root`
    pub fn state_at(&self, root: &Hash) -> Option<RuntimeState> {
        self.states.read().get(root).cloned()
    }
}

#[async_trait]
impl ExecutionEngine for InMemoryExecutionEngine {
    type Context = ExecutionContext;

    async fn query_consensus_configuration(
        &self,
    ) -> std::result::Result<EpochConfigurationRaw, ExecutionError> {
        Ok(self.consensus.read().clone())
    }

    async fn initialize_block(
        &self,
        parent: &BlockHeader,
        _pre_digest: &DigestItem,
    ) -> std::result::Result<ExecutionContext, ExecutionError> {
        let state = self.state_at(&parent.state_root).ok_or_else(|| {
            ExecutionError::Unavailable(format!("no state for parent #{}", parent.number))
        })?;
        Ok(ExecutionContext {
            state,
            extrinsics: Vec::new(),
        })
    }

    async fn apply_extrinsic(
        &self,
        context: &mut ExecutionContext,
        extrinsic: &Extrinsic,
    ) -> std::result::Result<(), ExecutionError> {
        let call = Call::decode(extrinsic)?;
        trace!("[{}] applying {:?}", crate::LOG_TARGET, call);
        context.state.apply(call)?;
        context.extrinsics.push(extrinsic.clone());
        Ok(())
    }

    async fn finalize_block(
        &self,
        context: ExecutionContext,
    ) -> std::result::Result<BlockRoots, ExecutionError> {
        let state_root = context.state.root()?;
        let extrinsics_root = ordered_root(&context.extrinsics);
        self.states.write().insert(state_root, context.state);
        Ok(BlockRoots {
            state_root,
            extrinsics_root,
        })
    }
}
