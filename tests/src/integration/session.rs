//! # Session Flow
//!
//! Two authorities share one block tree. Each emits sealed blocks through its
//! own channel; the test plays the importer.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use shared_crypto::Sr25519KeyPair;
    use shared_types::Block;
    use slot_consensus::{
        verify_sealed_header, ChainView, InMemoryChainView, InMemoryExecutionEngine, Metrics,
        Session, SessionDependencies, Slot, SlotConsensusConfig, TimeSource, TransactionQueue,
    };
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct FixedTime(u64);

    impl TimeSource for FixedTime {
        fn now(&self) -> u64 {
            self.0
        }
    }

    struct Author {
        session: Session<InMemoryExecutionEngine, InMemoryChainView>,
        blocks: mpsc::Receiver<Block>,
        keypair: Arc<Sr25519KeyPair>,
    }

    fn author(
        keypair: Sr25519KeyPair,
        engine: &Arc<InMemoryExecutionEngine>,
        chain: &Arc<InMemoryChainView>,
        queue: &Arc<TransactionQueue>,
    ) -> Author {
        let keypair = Arc::new(keypair);
        let (tx, blocks) = mpsc::channel(4);
        let deps = SessionDependencies {
            engine: Arc::clone(engine),
            chain: Arc::clone(chain),
            queue: Arc::clone(queue),
            keypair: keypair.clone(),
            time: Arc::new(FixedTime(0)),
            metrics: Arc::new(Metrics::new()),
        };
        Author {
            session: Session::new(SlotConsensusConfig::default(), deps, tx),
            blocks,
            keypair,
        }
    }

    fn slot(number: u64) -> Slot {
        Slot {
            number,
            start: number * SLOT_DURATION,
            duration: SLOT_DURATION,
        }
    }

    /// Tick `slot`, then import whatever was emitted
    async fn author_slot(author: &mut Author, chain: &InMemoryChainView, number: u64) -> Block {
        let hash = author.session.tick(slot(number)).await.unwrap();
        assert!(hash.is_some(), "slot {number} should be authored");
        let block = author.blocks.recv().await.unwrap();
        assert!(verify_sealed_header(
            &block.header,
            &author.keypair.public_key()
        ));
        chain
            .import(block.header.clone(), number * SLOT_DURATION)
            .unwrap();
        block
    }

    #[tokio::test]
    async fn test_two_authorities_extend_each_other() {
        let alice = authority(21);
        let bob = authority(22);
        let engine = Arc::new(engine(epoch_config(&[&alice, &bob], 1, 1)));
        let chain = Arc::new(InMemoryChainView::with_genesis(engine.genesis_header(), 0).unwrap());
        let queue = Arc::new(TransactionQueue::new());

        let mut alice = author(alice, &engine, &chain, &queue);
        let mut bob = author(bob, &engine, &chain, &queue);
        alice.session.initialize().await.unwrap();
        bob.session.initialize().await.unwrap();
        assert_eq!(alice.session.authority_index(), Some(0));
        assert_eq!(bob.session.authority_index(), Some(1));

        queue.push(transfer(1, 2, 7, 0));
        let first = author_slot(&mut alice, &chain, 1).await;
        assert_eq!(first.header.number, 1);
        assert_eq!(first.body.len(), 1);

        let second = author_slot(&mut bob, &chain, 2).await;
        assert_eq!(second.header.number, 2);
        assert_eq!(second.header.parent_hash, first.header.hash().unwrap());
        assert_eq!(second.header.pre_digest().unwrap().authority_index, 1);
        assert!(second.body.is_empty());

        assert_eq!(chain.best_hash(), Some(second.header.hash().unwrap()));
        let state = engine.state_at(&second.header.state_root).unwrap();
        assert_eq!(state.balances[&1], 93);
        assert_eq!(state.balances[&2], 107);
    }

    #[tokio::test]
    async fn test_outsider_never_authors() {
        let member = authority(21);
        let outsider = authority(99);
        let engine = Arc::new(engine(epoch_config(&[&member], 1, 1)));
        let chain = Arc::new(InMemoryChainView::with_genesis(engine.genesis_header(), 0).unwrap());
        let queue = Arc::new(TransactionQueue::new());

        let mut outsider = author(outsider, &engine, &chain, &queue);
        outsider.session.initialize().await.unwrap();
        assert_eq!(outsider.session.authority_index(), None);

        for number in 1..=5 {
            assert_eq!(outsider.session.tick(slot(number)).await.unwrap(), None);
        }
        assert!(outsider.blocks.try_recv().is_err());
        assert_eq!(chain.len(), 1);
    }
}
