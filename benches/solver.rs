//! Benchmarks for the couch puzzle solver.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use couch::explore::find_pushes;
use couch::{solve_with, Puzzle, SolverConfig};

const TWO_COUCHES: &str = include_str!("../levels/two_couches.txt");

fn puzzle() -> Puzzle {
    Puzzle::parse(TWO_COUCHES).expect("sample level parses")
}

/// Benchmark a complete single-threaded solve of the two-couch level.
fn bench_solve(c: &mut Criterion) {
    let puzzle = puzzle();
    let config = SolverConfig {
        progress_interval: 0,
        ..SolverConfig::with_threads(1)
    };

    c.bench_function("solve_two_couches", |b| {
        b.iter(|| solve_with(black_box(&puzzle), &config))
    });
}

/// Benchmark the same solve on every available core.
fn bench_solve_parallel(c: &mut Criterion) {
    let puzzle = puzzle();
    let config = SolverConfig {
        progress_interval: 0,
        ..SolverConfig::default()
    };

    let mut group = c.benchmark_group("parallel");
    group.sample_size(20);
    group.bench_function("solve_two_couches", |b| {
        b.iter(|| solve_with(black_box(&puzzle), &config))
    });
    group.finish();
}

/// Benchmark one explorer call from the initial state.
fn bench_find_pushes(c: &mut Criterion) {
    let puzzle = puzzle();

    c.bench_function("find_pushes", |b| {
        b.iter(|| find_pushes(black_box(&puzzle.initial_state), &puzzle.metadata))
    });
}

/// Benchmark encoding and decoding the initial state key.
fn bench_state_key(c: &mut Criterion) {
    let puzzle = puzzle();
    let key = puzzle.codec.encode(&puzzle.initial_state);

    c.bench_function("encode_state", |b| {
        b.iter(|| puzzle.codec.encode(black_box(&puzzle.initial_state)))
    });
    c.bench_function("decode_state", |b| {
        b.iter(|| puzzle.codec.decode(black_box(key)))
    });
}

criterion_group!(
    benches,
    bench_solve,
    bench_solve_parallel,
    bench_find_pushes,
    bench_state_key
);
criterion_main!(benches);
