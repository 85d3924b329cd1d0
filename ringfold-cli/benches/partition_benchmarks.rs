use criterion::{criterion_group, criterion_main, Criterion};

use ringfold_core::config::RingfoldConfig;
use ringfold_core::constraints::Constraints;
use ringfold_core::engine::PartitionCalculation;
use ringfold_core::pairs::BasePairRegistry;
use ringfold_core::params::ModelParams;
use ringfold_core::topology::Topology;

use criterion_config::configure_criterion;

fn quiet_config(calc_deriv: bool, calc_contrib: bool) -> RingfoldConfig {
    RingfoldConfig {
        calc_deriv,
        calc_contrib,
        quiet: true,
    }
}

fn run_partition(sequence: &str, circularized: bool, config: RingfoldConfig) -> f64 {
    let topology = Topology::from_strands(&[sequence], circularized).unwrap();
    let registry = BasePairRegistry::with_wobble().unwrap();
    let mut calculation = PartitionCalculation::new(
        topology,
        registry,
        ModelParams::default(),
        Constraints::none(),
        config,
    )
    .unwrap();
    calculation.execute().unwrap();
    calculation.z()
}

// A tRNA-sized stem-loop-rich sequence; long enough that the cubic fill
// dominates setup costs.
const SEQUENCE: &str = "GGGCGCGUAGCUCAGCUGGGAGAGCGCCUGCUUUGCACGCAGGAGGU";

fn bench_linear_fill(c: &mut Criterion) {
    c.bench_function("partition_linear_47nt", |b| {
        b.iter(|| run_partition(SEQUENCE, false, quiet_config(false, false)));
    });
}

fn bench_circular_fill(c: &mut Criterion) {
    c.bench_function("partition_circular_47nt", |b| {
        b.iter(|| run_partition(SEQUENCE, true, quiet_config(false, false)));
    });
}

fn bench_fill_with_derivative_shadow(c: &mut Criterion) {
    c.bench_function("partition_linear_47nt_deriv", |b| {
        b.iter(|| run_partition(SEQUENCE, false, quiet_config(true, false)));
    });
}

fn bench_fill_with_contributions(c: &mut Criterion) {
    c.bench_function("partition_linear_47nt_contrib", |b| {
        b.iter(|| run_partition(SEQUENCE, false, quiet_config(false, true)));
    });
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = bench_linear_fill, bench_circular_fill, bench_fill_with_derivative_shadow, bench_fill_with_contributions
}
criterion_main!(benches);
