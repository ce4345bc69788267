//! Criterion benchmarks for the reference module chain.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use pixsim_bench::reference_profile;
use pixsim_engine::Simulation;

fn bench_event_100(c: &mut Criterion) {
    let mut sim = Simulation::new(reference_profile(42, 100)).unwrap();
    sim.run_event().unwrap();

    c.bench_function("event_100_charges", |b| {
        b.iter(|| {
            let metrics = sim.run_event().unwrap();
            black_box(metrics.total_us);
        });
    });
}

fn bench_event_1000(c: &mut Criterion) {
    let mut sim = Simulation::new(reference_profile(42, 1000)).unwrap();
    sim.run_event().unwrap();

    c.bench_function("event_1000_charges", |b| {
        b.iter(|| {
            let metrics = sim.run_event().unwrap();
            black_box(metrics.total_us);
        });
    });
}

criterion_group!(benches, bench_event_100, bench_event_1000);
criterion_main!(benches);
