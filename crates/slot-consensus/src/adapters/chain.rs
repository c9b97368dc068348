//! Block tree adapter

use crate::error::{Result, SlotConsensusError};
use crate::ports::{ChainView, ObservedBlock};
use parking_lot::RwLock;
use shared_types::{BlockHeader, Hash};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
struct Tree {
    blocks: HashMap<Hash, ObservedBlock>,
    best: Option<(u64, Hash)>,
}

/// Block tree kept in memory.
///
/// The best block is the highest one imported; ties keep the first seen.
#[derive(Debug, Default)]
pub struct InMemoryChainView {
    tree: RwLock<Tree>,
}

impl InMemoryChainView {
    /// Create a view holding only `genesis`, observed at `arrival`
    pub fn with_genesis(genesis: BlockHeader, arrival: u64) -> Result<Self> {
        let view = Self::default();
        view.import(genesis, arrival)?;
        Ok(view)
    }

    /// Record a header observed at `arrival`. Returns its hash.
    ///
    /// Non-genesis headers must extend a known block.
    pub fn import(&self, header: BlockHeader, arrival: u64) -> Result<Hash> {
        let hash = header.hash()?;
        let number = header.number;
        let mut tree = self.tree.write();

        if !header.is_genesis() && !tree.blocks.contains_key(&header.parent_hash) {
            return Err(SlotConsensusError::ChainViewUnavailable(format!(
                "unknown parent for block #{number}"
            )));
        }

        tree.blocks.insert(hash, ObservedBlock { header, arrival });
        if tree.best.map_or(true, |(best, _)| number > best) {
            tree.best = Some((number, hash));
            debug!("[{}] new best block #{}", crate::LOG_TARGET, number);
        }
        Ok(hash)
    }

    /// Height of the best block
    pub fn best_number(&self) -> Option<u64> {
        self.tree.read().best.map(|(number, _)| number)
    }

    /// Number of known blocks
    pub fn len(&self) -> usize {
        self.tree.read().blocks.len()
    }

    /// Returns true before genesis is imported
    pub fn is_empty(&self) -> bool {
        self.tree.read().blocks.is_empty()
    }
}

impl ChainView for InMemoryChainView {
    fn best_hash(&self) -> Option<Hash> {
        self.tree.read().best.map(|(_, hash)| hash)
    }

    fn block(&self, hash: &Hash) -> Option<ObservedBlock> {
        self.tree.read().blocks.get(hash).cloned()
    }
}
