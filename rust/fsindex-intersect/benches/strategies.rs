use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fsindex_intersect::{Strategy, intersect_pair};
use fsindex_testkit::data_gen::{PairShape, list_pair};
use std::hint::black_box;

fn bench_strategies_by_ratio(c: &mut Criterion) {
    let mut group = c.benchmark_group("intersect_pair_by_ratio");
    let mut rng = fastrand::Rng::with_seed(1);

    for ratio in [1, 4, 16, 64, 256] {
        let (small, large) = list_pair(
            &mut rng,
            PairShape {
                small_len: 1000,
                ratio,
                overlap: 0.25,
            },
        );
        group.throughput(Throughput::Elements((small.len() + large.len()) as u64));

        for strategy in Strategy::ALL {
            group.bench_with_input(
                BenchmarkId::new(strategy.name(), ratio),
                &(&small, &large),
                |b, (small, large)| {
                    b.iter(|| {
                        let result = intersect_pair(
                            black_box(small.as_slice()),
                            black_box(large.as_slice()),
                            strategy,
                        );
                        black_box(result)
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_strategies_by_ratio);
criterion_main!(benches);
