use criterion::measurement::Measurement;
use criterion::{criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion};
use rand::distr::{Distribution, Uniform};
use rand::{rngs::StdRng, SeedableRng};
use single_hypothesis::statistics::normality::{assess_normality, NormalityOptions};
use single_hypothesis::{permutation_test, single_mean, MeanTestOptions, PermutationOptions};
use std::time::Duration;

#[derive(Clone)]
pub struct PermutationBenchConfig {
    seed: u64,
    exact_sizes: Vec<usize>,
    monte_carlo_sizes: Vec<usize>,
    draws: Vec<usize>,
    measurement_time: u64,
    sample_size: usize,
}

impl Default for PermutationBenchConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            exact_sizes: vec![8, 12, 16, 20],
            monte_carlo_sizes: vec![50, 500, 5000],
            draws: vec![1_000, 10_000],
            measurement_time: 10,
            sample_size: 10,
        }
    }
}

fn create_sample(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Uniform::try_from(0.0..10.0).unwrap();
    (0..n).map(|_| dist.sample(&mut rng)).collect()
}

impl PermutationBenchConfig {
    fn group<'a, M: Measurement>(&self, c: &'a mut Criterion<M>, name: &str) -> BenchmarkGroup<'a, M> {
        let mut group = c.benchmark_group(name);
        group
            .measurement_time(Duration::from_secs(self.measurement_time))
            .sample_size(self.sample_size);
        group
    }
}

pub fn bench_exact_permutation(c: &mut Criterion) {
    let config = PermutationBenchConfig::default();
    let mut group = config.group(c, "Permutation_Exact");

    for &n in config.exact_sizes.iter() {
        let sample = create_sample(n, config.seed + n as u64);
        group.bench_with_input(BenchmarkId::new("exact", n), &n, |b, _| {
            b.iter(|| permutation_test(&sample, 5.0, &PermutationOptions::default()).unwrap());
        });
    }

    group.finish();
}

pub fn bench_monte_carlo_permutation(c: &mut Criterion) {
    let config = PermutationBenchConfig::default();
    let mut group = config.group(c, "Permutation_MonteCarlo");

    for &n in config.monte_carlo_sizes.iter() {
        let sample = create_sample(n, config.seed + n as u64);
        for &draws in config.draws.iter() {
            let options = PermutationOptions::default()
                .max_permutations(draws)
                .seed(config.seed);
            group.bench_with_input(
                BenchmarkId::new("monte_carlo", format!("n{}_d{}", n, draws)),
                &(n, draws),
                |b, _| {
                    b.iter(|| permutation_test(&sample, 5.0, &options).unwrap());
                },
            );
        }
    }

    group.finish();
}

pub fn bench_normality_and_dispatch(c: &mut Criterion) {
    let config = PermutationBenchConfig::default();
    let mut group = config.group(c, "Normality_Dispatch");

    for &n in config.monte_carlo_sizes.iter() {
        let sample = create_sample(n, config.seed + n as u64);

        group.bench_with_input(BenchmarkId::new("assess_normality", n), &n, |b, _| {
            b.iter(|| assess_normality(&sample, &NormalityOptions::default()).unwrap());
        });

        let options = MeanTestOptions::builder().max_permutations(1_000).build();
        group.bench_with_input(BenchmarkId::new("single_mean", n), &n, |b, _| {
            b.iter(|| single_mean(&sample, 5.0, &options).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_exact_permutation,
    bench_monte_carlo_permutation,
    bench_normality_and_dispatch
);
criterion_main!(benches);
