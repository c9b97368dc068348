//! # Requeue Flow
//!
//! A build attempt that aborts must hand every extrinsic it already applied
//! back to the queue, ahead of every newer submission whatever its priority.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use shared_types::{Extrinsic, PendingTransaction};
    use slot_consensus::{
        BlockBuilder, BlockLimits, Metrics, Slot, SlotConsensusError, TransactionQueue,
    };
    use std::sync::atomic::Ordering;

    const SLOT: Slot = Slot {
        number: 1,
        start: SLOT_DURATION,
        duration: SLOT_DURATION,
    };

    #[tokio::test]
    async fn test_rejected_build_requeues_applied_at_front() {
        let author = authority(1);
        let engine = engine(epoch_config(&[&author], 1, 1));
        let genesis = engine.genesis_header();
        let queue = TransactionQueue::new();
        let metrics = Metrics::new();

        let valid = transfer(1, 2, 10, 10);
        // Account 3 holds nothing
        let overdraft = transfer(3, 1, 50, 5);
        queue.push(valid.clone());
        queue.push(overdraft);

        let builder = BlockBuilder::new(&engine, &queue, BlockLimits::default(), &metrics);
        let result = builder
            .build_block(&genesis, &SLOT, Some(winning_claim(&author, 1)), 0)
            .await;

        assert!(matches!(
            result,
            Err(SlotConsensusError::BlockBuildFailed { slot: 1, .. })
        ));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek_front(), Some(valid.clone()));
        assert_eq!(metrics.extrinsics_requeued.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.extrinsics_dropped.load(Ordering::Relaxed), 1);

        // A newer submission lines up behind it even at a higher priority
        let newer = transfer(2, 1, 5, 50);
        queue.push(newer.clone());

        let block = builder
            .build_block(&genesis, &SLOT, Some(winning_claim(&author, 1)), 0)
            .await
            .unwrap()
            .block;
        assert_eq!(block.body, vec![valid.extrinsic, newer.extrinsic]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_extrinsic_dropped_block_still_built() {
        let author = authority(1);
        let engine = engine(epoch_config(&[&author], 1, 1));
        let queue = TransactionQueue::new();
        let metrics = Metrics::new();

        queue.push(PendingTransaction::with_default_validity(Extrinsic(vec![0xff; 3])));
        let valid = transfer(1, 2, 1, 0);
        queue.push(valid.clone());

        let builder = BlockBuilder::new(&engine, &queue, BlockLimits::default(), &metrics);
        let block = builder
            .build_block(
                &engine.genesis_header(),
                &SLOT,
                Some(winning_claim(&author, 1)),
                0,
            )
            .await
            .unwrap()
            .block;

        assert_eq!(block.body, vec![valid.extrinsic]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_budget_leaves_remainder_queued() {
        let author = authority(1);
        let engine = engine(epoch_config(&[&author], 1, 1));
        let queue = TransactionQueue::new();
        let metrics = Metrics::new();
        for amount in 1..=3 {
            queue.push(transfer(1, 2, amount, 0));
        }

        let limits = BlockLimits {
            max_extrinsics: 2,
            ..BlockLimits::default()
        };
        let builder = BlockBuilder::new(&engine, &queue, limits, &metrics);
        let block = builder
            .build_block(
                &engine.genesis_header(),
                &SLOT,
                Some(winning_claim(&author, 1)),
                0,
            )
            .await
            .unwrap()
            .block;

        assert_eq!(block.body.len(), 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek_front(), Some(transfer(1, 2, 3, 0)));
    }

    #[tokio::test]
    async fn test_missing_claim_touches_nothing() {
        let author = authority(1);
        let engine = engine(epoch_config(&[&author], 1, 1));
        let queue = TransactionQueue::new();
        let metrics = Metrics::new();
        queue.push(transfer(1, 2, 1, 0));

        let builder = BlockBuilder::new(&engine, &queue, BlockLimits::default(), &metrics);
        let result = builder
            .build_block(&engine.genesis_header(), &SLOT, None, 0)
            .await;

        assert!(matches!(
            result,
            Err(SlotConsensusError::NoClaimForSlot { slot: 1 })
        ));
        assert_eq!(queue.len(), 1);
    }
}
