use criterion::{black_box, criterion_group, criterion_main, Bencher, BenchmarkId, Criterion};

use coupon_loadtest::report::{percentile_ppm, Percentiles};
use coupon_loadtest::request::IssueRequestGenerator;
use rand::Rng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

const SEED: u64 = 42;

criterion_group!(benches, bench_generate, bench_percentiles);
criterion_main!(benches);

#[derive(Debug, Clone)]
struct TestScenario {
    n_samples: usize,
    max_time_ms: usize,
}

const TEST_SCENARIOS: &[&TestScenario] = &[
    &TestScenario {
        n_samples: 1_000,
        max_time_ms: 100,
    },
    &TestScenario {
        n_samples: 100_000,
        max_time_ms: 1_000,
    },
    &TestScenario {
        n_samples: 1_000_000,
        max_time_ms: 10_000,
    },
];

impl Display for TestScenario {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} samples spread up to {}ms",
            self.n_samples, self.max_time_ms
        )
    }
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("Issue requests");
    let generator = IssueRequestGenerator::default();

    group.bench_function("generate_seeded", |b: &mut Bencher| {
        let rng = &mut rand::rngs::StdRng::seed_from_u64(SEED);
        b.iter(|| black_box(generator.generate_with(rng)))
    });
    group.bench_function("generate_thread_rng", |b: &mut Bencher| {
        b.iter(|| black_box(generator.generate()))
    });
    group.bench_function("serialize", |b: &mut Bencher| {
        let request = generator.generate();
        b.iter(|| black_box(serde_json::to_vec(&request).unwrap()))
    });
    group.finish();
}

fn bench_percentiles(c: &mut Criterion) {
    let mut group = c.benchmark_group("Percentiles");
    let percentiles = Percentiles::default();
    for scenario in TEST_SCENARIOS {
        group.bench_with_input(
            BenchmarkId::new("percentile", scenario),
            scenario,
            |b: &mut Bencher, test_scenario: &&TestScenario| {
                let histogram = generate_histogram(test_scenario);
                b.iter(|| {
                    for ppm in percentiles.parts_per_million() {
                        black_box(percentile_ppm(&histogram, *ppm));
                    }
                })
            },
        );
    }
    group.finish();
}

fn generate_histogram(test_scenario: &TestScenario) -> BTreeMap<usize, usize> {
    let rng = &mut rand::rngs::StdRng::seed_from_u64(SEED);
    let mut histogram = BTreeMap::new();
    for _ in 0..test_scenario.n_samples {
        *histogram
            .entry(rng.gen_range(1..=test_scenario.max_time_ms))
            .or_insert(0) += 1;
    }
    histogram
}
