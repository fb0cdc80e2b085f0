use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use fbref_stats::metrics::{leaderboard, league_average, per90};
use fbref_stats::queries::PlayerSeasonRow;

fn sample_rows(n: usize) -> Vec<PlayerSeasonRow> {
    (0..n)
        .map(|i| PlayerSeasonRow {
            player_name: format!("Player {i:05}"),
            team_name: format!("Team {:02}", i % 20),
            league_name: format!("League {}", i % 5),
            season: "2024-2025".to_string(),
            minutes: ((i * 37) % 3400) as i64,
            goals: ((i * 7) % 25) as i64,
            assists: ((i * 5) % 15) as i64,
            tackles: ((i * 11) % 90) as i64,
            interceptions: ((i * 13) % 60) as i64,
            xg: (i % 23) as f64 * 0.7,
            ..PlayerSeasonRow::default()
        })
        .collect()
}

fn bench_leaderboard(c: &mut Criterion) {
    let rows = sample_rows(5000);
    c.bench_function("leaderboard_top20_goals", |b| {
        b.iter(|| {
            let board = leaderboard(black_box(&rows), |r| r.goals as f64, 20, 450);
            black_box(board.len())
        })
    });
}

fn bench_league_average(c: &mut Criterion) {
    let rows = sample_rows(5000);
    c.bench_function("league_average_xg", |b| {
        b.iter(|| black_box(league_average(black_box(&rows), "League 0", |r| r.xg, 450)))
    });
}

fn bench_per90_sweep(c: &mut Criterion) {
    let rows = sample_rows(5000);
    c.bench_function("per90_sweep", |b| {
        b.iter(|| {
            let total: f64 = rows
                .iter()
                .map(|r| per90(r.goals as f64, r.minutes))
                .sum();
            black_box(total)
        })
    });
}

criterion_group!(
    benches,
    bench_leaderboard,
    bench_league_average,
    bench_per90_sweep
);
criterion_main!(benches);
