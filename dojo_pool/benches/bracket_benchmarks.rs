use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dojo_pool::bracket::{
    calculate_rounds, calculate_total_matches, generate_bracket, record_result, seeding_order,
};
use dojo_pool::{Bracket, BracketGenerationOptions, TournamentFormat, TournamentPlayer};
use std::hint::black_box;

fn players(n: usize) -> Vec<TournamentPlayer> {
    (1..=n)
        .map(|i| TournamentPlayer::new(format!("p{i}"), format!("Player {i}"), i as u32))
        .collect()
}

fn generate(format: TournamentFormat, n: usize) -> Bracket {
    generate_bracket(format, &players(n), &BracketGenerationOptions::default()).unwrap()
}

/// Plays every ready match with slot A winning
fn play_out(mut bracket: Bracket) -> Bracket {
    loop {
        let next = bracket
            .ready_matches()
            .first()
            .map(|m| (m.id.clone(), m.slot_a.player_id().unwrap().clone()));
        let Some((id, winner)) = next else {
            return bracket;
        };
        bracket = record_result(&bracket, &id, &winner, Some(7), Some(2)).unwrap();
    }
}

/// Benchmark the seeding table for large brackets
fn bench_seeding_order(c: &mut Criterion) {
    c.bench_function("seeding_order_1024", |b| {
        b.iter(|| seeding_order(black_box(1024)));
    });
}

/// Benchmark bracket generation per format and field size
fn bench_generate_bracket(c: &mut Criterion) {
    for format in TournamentFormat::ALL {
        let mut group = c.benchmark_group(format!("generate_{}", format.as_str().to_lowercase()));

        for n_players in [8, 32, 128].iter() {
            group.bench_with_input(
                BenchmarkId::from_parameter(format!("{}_players", n_players)),
                n_players,
                |b, &n| {
                    let field = players(n);
                    let options = BracketGenerationOptions::default();
                    b.iter(|| generate_bracket(format, black_box(&field), &options));
                },
            );
        }

        group.finish();
    }
}

/// Benchmark recording a single first-round result
fn bench_record_result(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_result");

    for n_players in [8, 64].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_players", n_players)),
            n_players,
            |b, &n| {
                let bracket = generate(TournamentFormat::DoubleElimination, n);
                b.iter(|| record_result(black_box(&bracket), "W1-1", "p1", Some(7), Some(3)));
            },
        );
    }

    group.finish();
}

/// Benchmark playing a whole event, every result producing a new bracket
fn bench_full_playthrough(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_playthrough");

    for (format, n) in [
        (TournamentFormat::SingleElimination, 32),
        (TournamentFormat::DoubleElimination, 32),
        (TournamentFormat::RoundRobin, 12),
        (TournamentFormat::GroupKnockout, 32),
    ] {
        group.bench_with_input(BenchmarkId::new(format.as_str(), n), &n, |b, &n| {
            b.iter_batched(
                || generate(format, n),
                play_out,
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark the closed-form estimates
fn bench_estimates(c: &mut Criterion) {
    c.bench_function("estimates_all_formats", |b| {
        b.iter(|| {
            TournamentFormat::ALL
                .iter()
                .map(|&format| {
                    calculate_rounds(format, black_box(100))
                        + calculate_total_matches(format, black_box(100))
                })
                .sum::<usize>()
        });
    });
}

criterion_group!(
    generation,
    bench_seeding_order,
    bench_generate_bracket,
    bench_estimates,
);

criterion_group!(play, bench_record_result, bench_full_playthrough);

criterion_main!(generation, play);
