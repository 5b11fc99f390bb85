//! Criterion benchmarks for periodsweep_core
//!
//! Run with: cargo bench -p periodsweep_core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use periodsweep_core::analysis::{LinearRange, SweepConfig, SweepProgress, run_sweep};
use periodsweep_core::channel::result_channel;
use periodsweep_core::ode::{INITIAL_STATE, Oscillator, SolverSettings, solve_oscillator};
use periodsweep_core::period::estimate_series_period;
use periodsweep_core::{OscillatorEvaluator, ParameterGrid, PlotBuffer, WorkerPool};

fn bench_single_point(c: &mut Criterion) {
    let settings = SolverSettings::default();
    let mut group = c.benchmark_group("single_point");

    for (mu, nu) in [(0.5, 100.0), (2.0, 150.0)] {
        let oscillator = Oscillator::new(mu, nu);
        group.bench_with_input(
            BenchmarkId::new("solve_and_estimate", format!("mu={mu},nu={nu}")),
            &oscillator,
            |b, oscillator| {
                b.iter(|| {
                    let series =
                        solve_oscillator(black_box(oscillator), INITIAL_STATE, 20.0, &settings);
                    series.map(|s| estimate_series_period(&s))
                })
            },
        );
    }

    group.finish();
}

fn bench_reference_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference_sweep");
    group.sample_size(10);

    let config = SweepConfig::default();
    let grid = config.grid().unwrap();
    let evaluator = OscillatorEvaluator::from_config(&config);

    for workers in [1, 4] {
        let pool = WorkerPool::new(workers).unwrap();
        group.bench_with_input(BenchmarkId::new("workers", workers), &pool, |b, pool| {
            b.iter(|| {
                let (sender, receiver) = result_channel();
                let summary = run_sweep(&grid, &evaluator, pool, sender, &SweepProgress::default());
                let mut buffer = PlotBuffer::new(&grid);
                receiver.dispatch(&mut buffer, |buffer, result| {
                    buffer.apply(&result);
                });
                black_box((summary, buffer))
            })
        });
    }

    group.finish();
}

fn bench_grid_build(c: &mut Criterion) {
    let mu = LinearRange::new(0.5, 2.0, 200);
    let nu = LinearRange::new(100.0, 150.0, 200);

    c.bench_function("grid_build_200x200", |b| {
        b.iter(|| ParameterGrid::build(black_box(&mu), black_box(&nu)))
    });
}

criterion_group!(
    benches,
    bench_single_point,
    bench_reference_sweep,
    bench_grid_build,
);
criterion_main!(benches);
