use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cairn_ledger::{
    EmissionShare, FairnessBook, LedgerContext, LedgerParams, PoolLedger, TokenFees,
};
use cairn_types::{Address, Elevation, EngineParams, Timestamp, TokenId, Totem};

fn ctx(now: u64, round: u64) -> LedgerContext {
    LedgerContext {
        now: Timestamp::new(now),
        round,
        unlocked: true,
        in_lockout: false,
        share: EmissionShare {
            emission_per_second: 1_000_000_000_000,
            elevation_alloc: 150,
            total_elevation_alloc: 485,
        },
    }
}

/// A summit ledger with `pools` active pools and `users` stakers per pool.
fn populated_ledger(pools: u32, users: usize) -> PoolLedger {
    let mut ledger = PoolLedger::new(Elevation::Summit, LedgerParams::default());
    let mut book = FairnessBook::default();
    let fees = TokenFees::from_params(&EngineParams::default(), false);
    for p in 0..pools {
        ledger.add_pool(&ctx(0, 1), TokenId::new(p), 100).unwrap();
    }
    for u in 0..users {
        let user = Address::new(format!("crn_bench{u}"));
        let totem = if u % 2 == 0 { Totem::ZERO } else { Totem::ONE };
        for p in 0..pools.min(12) {
            let token = TokenId::new(p);
            ledger
                .deposit(&ctx(0, 1), &user, token, 1_000_000, Some(totem), &fees, &mut book)
                .unwrap();
        }
    }
    ledger
}

fn bench_rollover(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_rollover");

    for pool_count in [1u32, 8, 24] {
        let ledger = populated_ledger(pool_count, 16);
        group.bench_with_input(
            BenchmarkId::new("rollover_pools", pool_count),
            &pool_count,
            |b, _| {
                b.iter_batched(
                    || ledger.clone(),
                    |mut l| {
                        black_box(
                            l.rollover_pools(&ctx(3600, 1), 2, Some(Totem::ONE)).unwrap(),
                        )
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_claimable(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_claimable");
    let mut ledger = populated_ledger(12, 4);
    for round in 1..=10u64 {
        ledger
            .rollover_pools(&ctx(round * 3600, round), round + 1, Some(Totem::ZERO))
            .unwrap();
    }
    let user = Address::new("crn_bench0");
    let now = ctx(11 * 3600, 11);

    group.bench_function("user_total_claimable", |b| {
        b.iter(|| black_box(ledger.user_total_claimable(black_box(&now), &user).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_rollover, bench_claimable);
criterion_main!(benches);
