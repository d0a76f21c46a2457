use amplicluster::bio::alignment::{AlignmentDistance, PairwiseDistance};
use amplicluster::bio::{Read, ReadKey, TrimBounds};
use amplicluster::core::IdentityClusterer;
use amplicluster::storage::AnnotatedRead;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

fn generate_sequence(length: usize, seed: usize) -> Vec<u8> {
    let bases = b"ACGT";
    (0..length).map(|i| bases[(i * i + seed) % 4]).collect()
}

fn generate_family(count: usize, length: usize) -> Vec<AnnotatedRead> {
    (0..count)
        .map(|i| {
            let mut sequence = generate_sequence(length, i % 5);
            // Sprinkle substitutions so family members stay within a few percent.
            let p = (i * 13) % length;
            sequence[p] = if sequence[p] == b'A' { b'C' } else { b'A' };
            AnnotatedRead {
                read: Read::new(
                    ReadKey::new("bench", format!("r{:05}", i)),
                    sequence,
                    vec![1e-4; length],
                ),
                bounds: TrimBounds::Region { start: 1, end: length },
                marker_count: 1,
            }
        })
        .collect()
}

fn bench_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("distance/global");
    let distance = AlignmentDistance::default();

    for length in [100, 250, 500].iter() {
        let a = generate_sequence(*length, 1);
        let b = generate_sequence(*length, 2);
        group.bench_with_input(BenchmarkId::from_parameter(length), length, |bench, _| {
            bench.iter(|| distance.fractional_distance(black_box(&a), black_box(&b)).unwrap());
        });
    }

    group.finish();
}

fn bench_first_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("clustering/first_fit");
    group.sample_size(10);
    let clusterer = IdentityClusterer::new(100, 0.03).unwrap();

    for count in [50, 200].iter() {
        let reads = generate_family(*count, 150);
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| clusterer.assign(black_box(&reads)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_distance, bench_first_fit);
criterion_main!(benches);
