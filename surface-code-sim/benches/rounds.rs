// benches/rounds.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use surface_code_sim::prelude::*;

fn benchmark_lattice_build(c: &mut Criterion) {
    c.bench_function("lattice_build_9x9", |b| {
        b.iter(|| Lattice::build(black_box(9), black_box(9)).unwrap());
    });
}

fn benchmark_rounds(c: &mut Criterion) {
    let lattice = Lattice::build(7, 7).unwrap();
    let config = RunConfig {
        total_rounds: 20,
        retention: HistoryRetention::CurrentRound,
    };

    c.bench_function("clean_rounds_7x7", |b| {
        b.iter(|| {
            let mut engine = PauliFrameEngine::clean(&lattice);
            RoundDriver::new(&lattice, config.clone())
                .run(&mut engine)
                .unwrap()
        });
    });

    c.bench_function("noisy_rounds_7x7", |b| {
        b.iter(|| {
            let noise = DepolarizingNoise::for_lattice(&lattice, 0.001, 5);
            let mut engine = PauliFrameEngine::new(&lattice, noise);
            RoundDriver::new(&lattice, config.clone())
                .run(&mut engine)
                .unwrap()
        });
    });
}

fn benchmark_history(c: &mut Criterion) {
    let bits: Vec<bool> = (0..10_000).map(|i| i % 17 == 0).collect();
    c.bench_function("history_record_10k", |b| {
        b.iter(|| {
            let mut history = SyndromeHistory::with_retention(84, HistoryRetention::CurrentRound);
            bits.iter().filter_map(|&bit| history.record(black_box(bit))).count()
        });
    });
}

criterion_group!(benches, benchmark_lattice_build, benchmark_rounds, benchmark_history);
criterion_main!(benches);
