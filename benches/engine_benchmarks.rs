//! Benchmarks for search, move generation and score reporting.

use std::str::FromStr;
use std::sync::Arc;

use chess::Board;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chess_uci::perft::perft;
use chess_uci::position::{text_to_move, StateHistory};
use chess_uci::score::{to_score, wdl};
use chess_uci::search::{AlphaBetaSearcher, SearchConfig, SearchJob, SearchLimits, Searcher};
use chess_uci::sync::SearchSignals;
use chess_uci::tt::TranspositionTable;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");

    let startpos = Board::default();
    for depth in 1..=4 {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| {
            b.iter(|| perft(&startpos, black_box(depth)))
        });
    }

    let kiwipete = Board::from_str(KIWIPETE).expect("valid fen");
    for depth in 1..=3 {
        group.bench_with_input(BenchmarkId::new("kiwipete", depth), &depth, |b, &depth| {
            b.iter(|| perft(&kiwipete, black_box(depth)))
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    let history = Arc::new(StateHistory::from_fen(KIWIPETE, false).expect("valid fen"));
    let tt = Arc::new(TranspositionTable::new(16));

    for depth in [3, 4, 5] {
        group.bench_with_input(BenchmarkId::new("kiwipete", depth), &depth, |b, &depth| {
            b.iter(|| {
                tt.clear();
                let job = SearchJob {
                    history: Arc::clone(&history),
                    limits: SearchLimits {
                        depth,
                        ..SearchLimits::default()
                    },
                    config: SearchConfig::default(),
                    tt: Arc::clone(&tt),
                    signals: SearchSignals::default(),
                    on_info: None,
                };
                black_box(AlphaBetaSearcher.think(&job))
            })
        });
    }

    group.finish();
}

fn bench_protocol(c: &mut Criterion) {
    let mut group = c.benchmark_group("protocol");

    group.bench_function("position_moves", |b| {
        b.iter(|| {
            let mut history = StateHistory::default();
            history.apply_moves(black_box(["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6"]))
        })
    });

    let kiwipete = Board::from_str(KIWIPETE).expect("valid fen");
    group.bench_function("text_to_move", |b| {
        b.iter(|| text_to_move(&kiwipete, black_box("e1g1"), false))
    });

    group.bench_function("score", |b| {
        b.iter(|| {
            (-2000..2000)
                .step_by(50)
                .map(|v| (to_score(black_box(v), 58), wdl(v, 58)))
                .count()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_perft, bench_search, bench_protocol);
criterion_main!(benches);
