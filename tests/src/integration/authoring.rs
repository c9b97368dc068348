//! # Authoring Flow
//!
//! Lottery claim → block assembly → seal → verification by a third party
//! holding only the public key.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use shared_types::SLOT_ENGINE_ID;
    use slot_consensus::{
        build_seal, calculate_threshold, run_lottery, seal_header, verify_claim,
        verify_sealed_header, BlockBuilder, BlockLimits, Metrics, Slot, SlotClaim,
        SlotConsensusError, TransactionQueue,
    };

    fn slot(number: u64) -> Slot {
        Slot {
            number,
            start: number * SLOT_DURATION,
            duration: SLOT_DURATION,
        }
    }

    #[tokio::test]
    async fn test_built_block_seals_and_verifies() {
        let author = authority(1);
        let stranger = authority(2);
        let engine = engine(epoch_config(&[&author], 1, 1));
        let genesis = engine.genesis_header();
        let queue = TransactionQueue::new();
        let metrics = Metrics::new();
        queue.push(transfer(1, 2, 10, 0));

        let builder = BlockBuilder::new(&engine, &queue, BlockLimits::default(), &metrics);
        let block = builder
            .build_block(&genesis, &slot(3), Some(winning_claim(&author, 3)), 0)
            .await
            .unwrap()
            .block;
        let mut header = block.header;

        // Pre-digest comes first and names the slot and author
        assert!(header.digest[0].as_pre_runtime(&SLOT_ENGINE_ID).is_some());
        let pre = header.pre_digest().unwrap();
        assert_eq!(pre.slot_number, 3);
        assert_eq!(pre.authority_index, 0);
        assert_eq!(header.number, 1);
        assert_eq!(header.parent_hash, genesis.hash().unwrap());
        assert_eq!(block.body.len(), 1);

        // Anyone with the public key can check the claim
        assert!(verify_claim(
            &author.public_key(),
            &RANDOMNESS,
            3,
            &SlotClaim::vrf_from_pre_digest(&pre),
            &certain_threshold(),
        ));

        seal_header(&mut header, &author).unwrap();
        assert_eq!(header.digest.len(), 2);
        assert!(header.digest[1].as_seal(&SLOT_ENGINE_ID).is_some());
        assert!(verify_sealed_header(&header, &author.public_key()));
        assert!(!verify_sealed_header(&header, &stranger.public_key()));

        assert!(matches!(
            build_seal(&header, &author),
            Err(SlotConsensusError::HeaderAlreadySealed)
        ));

        let mut tampered = header.clone();
        tampered.state_root = [0xee; 32];
        assert!(!verify_sealed_header(&tampered, &author.public_key()));
    }

    #[tokio::test]
    async fn test_claim_is_bound_to_its_slot() {
        let author = authority(1);
        let claim = winning_claim(&author, 7);

        assert!(verify_claim(
            &author.public_key(),
            &RANDOMNESS,
            7,
            &claim.vrf,
            &certain_threshold()
        ));
        assert!(!verify_claim(
            &author.public_key(),
            &RANDOMNESS,
            8,
            &claim.vrf,
            &certain_threshold()
        ));
        assert!(!verify_claim(
            &author.public_key(),
            &[0u8; 32],
            7,
            &claim.vrf,
            &certain_threshold()
        ));
    }

    #[test]
    fn test_win_rate_tracks_ratio() {
        let author = authority(4);
        let threshold = calculate_threshold(1, 2, 0, &[1]).unwrap();

        let wins = (0..400u64)
            .filter(|&slot| {
                run_lottery(&author, &RANDOMNESS, &threshold, slot)
                    .unwrap()
                    .is_some()
            })
            .count();

        // p = 0.5, n = 400: ten standard deviations either side
        assert!((100..=300).contains(&wins), "won {wins} of 400");
    }

    #[test]
    fn test_heavier_authority_wins_more_often() {
        let weights = [1, 9];
        let light = calculate_threshold(1, 4, 0, &weights).unwrap();
        let heavy = calculate_threshold(1, 4, 1, &weights).unwrap();
        assert!(heavy > light);

        let author = authority(5);
        let count = |threshold: slot_consensus::Threshold| {
            (0..300u64)
                .filter(|&slot| {
                    run_lottery(&author, &RANDOMNESS, &threshold, slot)
                        .unwrap()
                        .is_some()
                })
                .count()
        };
        assert!(count(heavy) >= count(light));
    }
}
