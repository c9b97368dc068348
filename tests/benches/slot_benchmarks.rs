//! # Slot-Chain Benchmarks
//!
//! Hot paths of slot authoring:
//!
//! | Path                 | Runs                          |
//! |----------------------|-------------------------------|
//! | Threshold            | once per epoch                |
//! | Lottery              | once per slot                 |
//! | Claim verification   | once per imported block       |
//! | Seal + verify        | once per authored block       |
//! | Slot-time estimation | once per slot, over a window  |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use shared_types::BlockHeader;
use slot_consensus::{
    calculate_threshold, estimate_slot_time, median, run_lottery, seal_header, verify_claim,
    verify_sealed_header, InMemoryChainView,
};
use slot_tests::integration::fixtures::{authority, certain_threshold, RANDOMNESS, SLOT_DURATION};
use std::time::Duration;

fn bench_threshold(c: &mut Criterion) {
    let mut group = c.benchmark_group("threshold");

    for authorities in [10usize, 100, 1_000] {
        let weights: Vec<u64> = (0..authorities).map(|i| 1 + i as u64 % 7).collect();
        group.bench_with_input(
            BenchmarkId::new("calculate", authorities),
            &weights,
            |b, weights| b.iter(|| calculate_threshold(1, 4, black_box(3), weights)),
        );
    }
    group.finish();
}

fn bench_lottery(c: &mut Criterion) {
    let mut group = c.benchmark_group("lottery");
    group.measurement_time(Duration::from_secs(5));

    let keypair = authority(1);
    let threshold = calculate_threshold(1, 4, 0, &[1, 1, 1, 1]).unwrap();
    let mut slot = 0u64;
    group.bench_function("run", |b| {
        b.iter(|| {
            slot += 1;
            run_lottery(&keypair, &RANDOMNESS, &threshold, black_box(slot))
        })
    });

    let claim = run_lottery(&keypair, &RANDOMNESS, &certain_threshold(), 42)
        .unwrap()
        .unwrap();
    let public = keypair.public_key();
    group.bench_function("verify", |b| {
        b.iter(|| verify_claim(&public, &RANDOMNESS, 42, &claim.vrf, &certain_threshold()))
    });
    group.finish();
}

fn bench_seal(c: &mut Criterion) {
    let mut group = c.benchmark_group("seal");
    let keypair = authority(2);
    let header = BlockHeader {
        number: 1,
        state_root: rand::thread_rng().gen(),
        ..BlockHeader::default()
    };

    group.bench_function("seal", |b| {
        b.iter(|| {
            let mut header = header.clone();
            seal_header(&mut header, &keypair)
        })
    });

    let mut sealed = header.clone();
    seal_header(&mut sealed, &keypair).unwrap();
    let public = keypair.public_key();
    group.bench_function("verify", |b| {
        b.iter(|| verify_sealed_header(black_box(&sealed), &public))
    });
    group.finish();
}

fn bench_slot_time(c: &mut Criterion) {
    let mut group = c.benchmark_group("slot-time");

    let mut rng = rand::thread_rng();
    let samples: Vec<u64> = (0..1_000).map(|_| rng.gen_range(0..1_000_000)).collect();
    group.bench_function("median_1000", |b| b.iter(|| median(black_box(&samples))));

    let chain = InMemoryChainView::with_genesis(BlockHeader::default(), 0).unwrap();
    let mut parent = BlockHeader::default();
    for number in 1..=200u64 {
        let header = BlockHeader {
            parent_hash: parent.hash().unwrap(),
            number,
            ..BlockHeader::default()
        };
        let jitter = rng.gen_range(0..50);
        chain.import(header.clone(), number * SLOT_DURATION + jitter).unwrap();
        parent = header;
    }

    for window in [5u64, 20, 100] {
        group.bench_with_input(BenchmarkId::new("estimate", window), &window, |b, &window| {
            b.iter(|| estimate_slot_time(201, &chain, window, SLOT_DURATION))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_threshold,
    bench_lottery,
    bench_seal,
    bench_slot_time
);
criterion_main!(benches);
