//! Block assembly against the pending-transaction queue
//!
//! ## Failure policy
//!
//! | Engine result      | Extrinsic | Attempt                                   |
//! |--------------------|-----------|-------------------------------------------|
//! | `InvalidExtrinsic` | dropped   | continues                                 |
//! | `Rejected`         | dropped   | aborts, applied extrinsics requeued       |
//! | `Unavailable`      | requeued  | aborts, applied extrinsics requeued first |
//!
//! Requeued extrinsics go back to the front band of the queue in application
//! order, ahead of anything submitted while the attempt ran. An extrinsic
//! larger than the whole body budget can never be included and is dropped.

use super::entities::{Slot, SlotClaim};
use crate::config::BlockLimits;
use crate::error::{Result, SlotConsensusError};
use crate::metrics::Metrics;
use crate::ports::{ExecutionEngine, ExecutionError};
use crate::queue::TransactionQueue;
use shared_types::{Block, BlockHeader, PendingTransaction};
use tracing::{debug, info, warn};

/// An unsealed block together with the queue entries it was built from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltBlock {
    /// Header and body, body in application order
    pub block: Block,
    /// Queue entries behind `block.body`, validity intact
    pub applied: Vec<PendingTransaction>,
}

/// Builds candidate blocks for won slots
pub struct BlockBuilder<'a, E: ExecutionEngine + ?Sized> {
    engine: &'a E,
    queue: &'a TransactionQueue,
    limits: BlockLimits,
    metrics: &'a Metrics,
}

impl<'a, E: ExecutionEngine + ?Sized> BlockBuilder<'a, E> {
    /// Create a builder over `engine` draining `queue`
    pub fn new(
        engine: &'a E,
        queue: &'a TransactionQueue,
        limits: BlockLimits,
        metrics: &'a Metrics,
    ) -> Self {
        Self {
            engine,
            queue,
            limits,
            metrics,
        }
    }

    fn requeue(&self, applied: Vec<PendingTransaction>) {
        if applied.is_empty() {
            return;
        }
        self.metrics.record_requeued(applied.len());
        self.queue.push_front_all(applied);
    }

    /// Build an unsealed block on `parent` for `slot`.
    ///
    /// `claim` is the stored claim for `slot`; the returned header carries
    /// its pre-digest as the only digest item.
    pub async fn build_block(
        &self,
        parent: &BlockHeader,
        slot: &Slot,
        claim: Option<SlotClaim>,
        authority_index: u32,
    ) -> Result<BuiltBlock> {
        let claim = claim.ok_or(SlotConsensusError::NoClaimForSlot { slot: slot.number })?;
        let pre_digest = claim
            .to_pre_digest(authority_index, slot.number)
            .to_digest_item()?;
        let parent_hash = parent.hash()?;

        let mut context = self
            .engine
            .initialize_block(parent, &pre_digest)
            .await
            .map_err(|err| SlotConsensusError::ExecutionUnavailable(err.to_string()))?;

        let mut applied: Vec<PendingTransaction> = Vec::new();
        let mut body_bytes = 0usize;

        while let Some(tx) = self.queue.pop_highest_priority() {
            if !self.limits.fits_empty_block(tx.extrinsic.len()) {
                warn!(
                    "[{}] dropping oversized extrinsic {} ({} bytes)",
                    crate::LOG_TARGET,
                    hex_prefix(&tx.extrinsic.hash()),
                    tx.extrinsic.len()
                );
                self.metrics.record_dropped(1);
                continue;
            }
            if !self
                .limits
                .admits(applied.len(), body_bytes, tx.extrinsic.len())
            {
                debug!("[{}] block budget reached at slot {}", crate::LOG_TARGET, slot.number);
                self.queue.push_front(tx);
                break;
            }

            match self.engine.apply_extrinsic(&mut context, &tx.extrinsic).await {
                Ok(()) => {
                    body_bytes += tx.extrinsic.len();
                    applied.push(tx);
                }
                Err(ExecutionError::InvalidExtrinsic(reason)) => {
                    warn!(
                        "[{}] dropping invalid extrinsic {}: {}",
                        crate::LOG_TARGET,
                        hex_prefix(&tx.extrinsic.hash()),
                        reason
                    );
                    self.metrics.record_dropped(1);
                }
                Err(ExecutionError::Rejected(reason)) => {
                    warn!(
                        "[{}] extrinsic {} rejected at slot {}, requeueing {} applied",
                        crate::LOG_TARGET,
                        hex_prefix(&tx.extrinsic.hash()),
                        slot.number,
                        applied.len()
                    );
                    self.metrics.record_dropped(1);
                    self.requeue(applied);
                    return Err(SlotConsensusError::BlockBuildFailed {
                        slot: slot.number,
                        reason,
                    });
                }
                Err(ExecutionError::Unavailable(reason)) => {
                    applied.push(tx);
                    self.requeue(applied);
                    return Err(SlotConsensusError::ExecutionUnavailable(reason));
                }
            }
        }

        let roots = match self.engine.finalize_block(context).await {
            Ok(roots) => roots,
            Err(err) => {
                self.requeue(applied);
                return Err(SlotConsensusError::ExecutionUnavailable(err.to_string()));
            }
        };

        let header = BlockHeader {
            parent_hash,
            number: parent.number + 1,
            state_root: roots.state_root,
            extrinsics_root: roots.extrinsics_root,
            digest: vec![pre_digest],
        };
        let body = applied.iter().map(|tx| tx.extrinsic.clone()).collect::<Vec<_>>();

        info!(
            "[{}] built block #{} for slot {} with {} extrinsics",
            crate::LOG_TARGET,
            header.number,
            slot.number,
            body.len()
        );
        Ok(BuiltBlock {
            block: Block { header, body },
            applied,
        })
    }
}

fn hex_prefix(hash: &[u8; 32]) -> String {
    hash[..4].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::EpochConfigurationRaw;
    use crate::ports::BlockRoots;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use shared_crypto::VrfSignature;
    use shared_types::{DigestItem, Extrinsic, TransactionValidity};
    use std::sync::Arc;

    /// Engine keyed on the first byte: 0 = valid, 1 = invalid, 2 = rejected,
    /// 3 = unavailable.
    ///
    /// With `on_reject` set, a rejection also pushes a priority-100
    /// extrinsic (id 9) onto that queue, as a concurrent producer would.
    #[derive(Default)]
    struct ScriptedEngine {
        applied: Mutex<Vec<u8>>,
        fail_finalize: bool,
        on_reject: Option<Arc<TransactionQueue>>,
    }

    #[async_trait]
    impl ExecutionEngine for ScriptedEngine {
        type Context = Vec<Extrinsic>;

        async fn query_consensus_configuration(
            &self,
        ) -> std::result::Result<EpochConfigurationRaw, ExecutionError> {
            Err(ExecutionError::Unavailable("scripted".into()))
        }

        async fn initialize_block(
            &self,
            _parent: &BlockHeader,
            pre_digest: &DigestItem,
        ) -> std::result::Result<Self::Context, ExecutionError> {
            assert!(matches!(pre_digest, DigestItem::PreRuntime(..)));
            Ok(Vec::new())
        }

        async fn apply_extrinsic(
            &self,
            context: &mut Self::Context,
            extrinsic: &Extrinsic,
        ) -> std::result::Result<(), ExecutionError> {
            match extrinsic.0[0] {
                0 => {
                    self.applied.lock().push(extrinsic.0[1]);
                    context.push(extrinsic.clone());
                    Ok(())
                }
                1 => Err(ExecutionError::InvalidExtrinsic("bad".into())),
                2 => {
                    if let Some(queue) = &self.on_reject {
                        queue.push(tx_with_priority(0, 9, 100));
                    }
                    Err(ExecutionError::Rejected("insufficient balance".into()))
                }
                _ => Err(ExecutionError::Unavailable("gone".into())),
            }
        }

        async fn finalize_block(
            &self,
            context: Self::Context,
        ) -> std::result::Result<BlockRoots, ExecutionError> {
            if self.fail_finalize {
                return Err(ExecutionError::Unavailable("finalize".into()));
            }
            Ok(BlockRoots {
                state_root: [context.len() as u8; 32],
                extrinsics_root: shared_crypto::ordered_root(&context),
            })
        }
    }

    fn tx(kind: u8, id: u8) -> PendingTransaction {
        PendingTransaction::with_default_validity(vec![kind, id])
    }

    fn tx_with_priority(kind: u8, id: u8, priority: u64) -> PendingTransaction {
        PendingTransaction::new(
            vec![kind, id],
            TransactionValidity {
                priority,
                ..TransactionValidity::default()
            },
        )
    }

    fn claim() -> SlotClaim {
        SlotClaim {
            lottery_output: 1,
            vrf: VrfSignature {
                output: [3u8; 32],
                proof: [4u8; 64],
            },
        }
    }

    fn slot() -> Slot {
        Slot {
            number: 12,
            start: 12_000,
            duration: 1_000,
        }
    }

    fn parent() -> BlockHeader {
        BlockHeader {
            number: 4,
            ..BlockHeader::default()
        }
    }

    fn ids(queue: &TransactionQueue) -> Vec<u8> {
        std::iter::from_fn(|| queue.pop_highest_priority())
            .map(|tx| tx.extrinsic.0[1])
            .collect()
    }

    #[tokio::test]
    async fn test_build_success() {
        let engine = ScriptedEngine::default();
        let queue = TransactionQueue::new();
        let metrics = Metrics::new();
        queue.push(tx(0, 1));
        queue.push(tx(0, 2));

        let builder = BlockBuilder::new(&engine, &queue, BlockLimits::default(), &metrics);
        let block = builder
            .build_block(&parent(), &slot(), Some(claim()), 2)
            .await
            .unwrap()
            .block;

        assert_eq!(block.header.number, 5);
        assert_eq!(block.header.parent_hash, parent().hash().unwrap());
        assert_eq!(block.header.digest.len(), 1);
        let pre = block.header.pre_digest().unwrap();
        assert_eq!(pre.slot_number, 12);
        assert_eq!(pre.authority_index, 2);
        assert_eq!(block.body.len(), 2);
        assert_eq!(block.body[0].0, vec![0, 1]);
        assert_eq!(block.header.state_root, [2u8; 32]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_missing_claim() {
        let engine = ScriptedEngine::default();
        let queue = TransactionQueue::new();
        let metrics = Metrics::new();
        let builder = BlockBuilder::new(&engine, &queue, BlockLimits::default(), &metrics);

        let result = builder.build_block(&parent(), &slot(), None, 0).await;
        assert!(matches!(
            result,
            Err(SlotConsensusError::NoClaimForSlot { slot: 12 })
        ));
    }

    #[tokio::test]
    async fn test_invalid_extrinsic_dropped() {
        let engine = ScriptedEngine::default();
        let queue = TransactionQueue::new();
        let metrics = Metrics::new();
        queue.push(tx(0, 1));
        queue.push(tx(1, 2));
        queue.push(tx(0, 3));

        let builder = BlockBuilder::new(&engine, &queue, BlockLimits::default(), &metrics);
        let block = builder
            .build_block(&parent(), &slot(), Some(claim()), 0)
            .await
            .unwrap()
            .block;

        assert_eq!(block.body.len(), 2);
        assert!(queue.is_empty());
        assert_eq!(
            metrics
                .extrinsics_dropped
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn test_rejection_requeues_applied_in_order() {
        let engine = ScriptedEngine::default();
        let queue = TransactionQueue::new();
        let metrics = Metrics::new();
        queue.push(tx(0, 1));
        queue.push(tx(0, 2));
        queue.push(tx(2, 3));
        queue.push(tx(0, 4));

        let builder = BlockBuilder::new(&engine, &queue, BlockLimits::default(), &metrics);
        let result = builder.build_block(&parent(), &slot(), Some(claim()), 0).await;

        assert!(matches!(
            result,
            Err(SlotConsensusError::BlockBuildFailed { slot: 12, .. })
        ));
        // Rejected tx 3 is gone; 1 and 2 are back ahead of 4.
        assert_eq!(ids(&queue), vec![1, 2, 4]);
    }

    #[tokio::test]
    async fn test_unavailable_requeues_current_too() {
        let engine = ScriptedEngine::default();
        let queue = TransactionQueue::new();
        let metrics = Metrics::new();
        queue.push(tx(0, 1));
        queue.push(tx(3, 2));

        let builder = BlockBuilder::new(&engine, &queue, BlockLimits::default(), &metrics);
        let result = builder.build_block(&parent(), &slot(), Some(claim()), 0).await;

        assert!(matches!(
            result,
            Err(SlotConsensusError::ExecutionUnavailable(_))
        ));
        assert_eq!(ids(&queue), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_finalize_failure_requeues() {
        let engine = ScriptedEngine {
            fail_finalize: true,
            ..ScriptedEngine::default()
        };
        let queue = TransactionQueue::new();
        let metrics = Metrics::new();
        queue.push(tx(0, 1));
        queue.push(tx(0, 2));

        let builder = BlockBuilder::new(&engine, &queue, BlockLimits::default(), &metrics);
        assert!(builder
            .build_block(&parent(), &slot(), Some(claim()), 0)
            .await
            .is_err());
        assert_eq!(ids(&queue), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_budget_leaves_rest_queued() {
        let engine = ScriptedEngine::default();
        let queue = TransactionQueue::new();
        let metrics = Metrics::new();
        for id in 0..5 {
            queue.push(tx(0, id));
        }
        let limits = BlockLimits {
            max_extrinsics: 3,
            max_body_bytes: 1_000,
        };

        let builder = BlockBuilder::new(&engine, &queue, limits, &metrics);
        let block = builder
            .build_block(&parent(), &slot(), Some(claim()), 0)
            .await
            .unwrap()
            .block;

        assert_eq!(block.body.len(), 3);
        assert_eq!(ids(&queue), vec![3, 4]);
    }

    #[tokio::test]
    async fn test_byte_budget() {
        let engine = ScriptedEngine::default();
        let queue = TransactionQueue::new();
        let metrics = Metrics::new();
        queue.push(tx(0, 1));
        queue.push(PendingTransaction::with_default_validity(vec![0u8, 2, 9]));
        let limits = BlockLimits {
            max_extrinsics: 10,
            max_body_bytes: 4,
        };

        let builder = BlockBuilder::new(&engine, &queue, limits, &metrics);
        let block = builder
            .build_block(&parent(), &slot(), Some(claim()), 0)
            .await
            .unwrap()
            .block;

        assert_eq!(block.body.len(), 1);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_extrinsic_does_not_block_queue() {
        let engine = ScriptedEngine::default();
        let queue = TransactionQueue::new();
        let metrics = Metrics::new();
        queue.push(PendingTransaction::with_default_validity(vec![0u8, 1, 9, 9, 9, 9]));
        queue.push(tx(0, 2));
        let limits = BlockLimits {
            max_extrinsics: 10,
            max_body_bytes: 4,
        };

        let builder = BlockBuilder::new(&engine, &queue, limits, &metrics);
        let block = builder
            .build_block(&parent(), &slot(), Some(claim()), 0)
            .await
            .unwrap()
            .block;

        assert_eq!(block.body, vec![Extrinsic(vec![0, 2])]);
        assert!(queue.is_empty());
        assert_eq!(
            metrics
                .extrinsics_dropped
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn test_requeued_ahead_of_higher_priority_newcomer() {
        let queue = Arc::new(TransactionQueue::new());
        let engine = ScriptedEngine {
            on_reject: Some(Arc::clone(&queue)),
            ..ScriptedEngine::default()
        };
        let metrics = Metrics::new();
        queue.push(tx(0, 1));
        queue.push(tx(2, 2));

        let builder = BlockBuilder::new(&engine, queue.as_ref(), BlockLimits::default(), &metrics);
        let result = builder.build_block(&parent(), &slot(), Some(claim()), 0).await;

        assert!(matches!(
            result,
            Err(SlotConsensusError::BlockBuildFailed { .. })
        ));
        assert_eq!(
            queue.peek_front().map(|t| t.extrinsic.0),
            Some(vec![0, 1])
        );
        assert_eq!(ids(&queue), vec![1, 9]);
    }

    #[tokio::test]
    async fn test_applied_entries_keep_validity() {
        let engine = ScriptedEngine::default();
        let queue = TransactionQueue::new();
        let metrics = Metrics::new();
        queue.push(tx_with_priority(0, 1, 40));
        queue.push(tx_with_priority(0, 2, 7));

        let builder = BlockBuilder::new(&engine, &queue, BlockLimits::default(), &metrics);
        let built = builder
            .build_block(&parent(), &slot(), Some(claim()), 0)
            .await
            .unwrap();

        let priorities: Vec<u64> = built.applied.iter().map(|t| t.validity.priority).collect();
        assert_eq!(priorities, vec![40, 7]);
        let from_applied: Vec<Extrinsic> =
            built.applied.into_iter().map(|t| t.extrinsic).collect();
        assert_eq!(built.block.body, from_applied);
    }
}
