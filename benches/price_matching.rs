//! benches/price_matching.rs
//! Run with:  cargo bench --bench price_matching
//! HTML:      target/criterion/report/index.html

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lltv_sim::config::SimulationConfig;
use lltv_sim::ledger::SwapPool;
use lltv_sim::scenario::{MARKET_MAKER, build_ledger};
use lltv_sim::simulators::price_matching::PriceMatchingSolver;
use std::hint::black_box;

// ────────────────────────────────────────────────────────────────────────────
//  Parameter grids
// ────────────────────────────────────────────────────────────────────────────
/// Relative price moves; the larger ones cross liquidity boundaries.
const PRICE_MOVES: &[f64] = &[0.001, 0.01, 0.05, 0.2];

pub fn bench_solver(c: &mut Criterion) {
    let ledger = build_ledger(&SimulationConfig::default()).expect("default ledger");
    let pool = ledger.pool_state().expect("pool state");
    let mut group = c.benchmark_group("price_matching");

    for &exact in &[false, true] {
        let solver = PriceMatchingSolver::new(exact, 5);
        for &shift in PRICE_MOVES {
            for (label, factor) in [("up", 1.0 + shift), ("down", 1.0 - shift)] {
                let target = pool.sqrt_price * factor.sqrt();
                let id = BenchmarkId::new(
                    if exact { "secant" } else { "linear" },
                    format!("{label}_{shift}"),
                );
                group.bench_function(id, |b| {
                    b.iter(|| {
                        let request =
                            solver.solve(MARKET_MAKER, black_box(&pool), black_box(target), &ledger);
                        black_box(request);
                    })
                });
            }
        }
    }

    group.finish();
}

criterion_group!(benches, bench_solver);
criterion_main!(benches);
