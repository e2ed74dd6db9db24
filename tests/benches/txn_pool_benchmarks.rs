//! # Transaction Pool Benchmarks
//!
//! Hot paths of the admission pipeline, measured without the async runtime:
//!
//! | Path | What is measured |
//! |------|------------------|
//! | Pool | admit + promote per transaction |
//! | Coordinator | admit, dispatch to N validators, N passing verdicts |
//! | Stateless validator | full structural check of a signed transfer |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qc_06_txn_pool::{
    DispatchPlan, EmptyRegistryPolicy, Sender, StatelessValidator, Transaction, TransactionPool,
    ValidationCoordinator, ValidatorId, Verdict, VerdictMessage,
};
use rand::Rng;
use shared_types::{MutableTransaction, Payload, Sig};
use std::sync::Arc;

fn random_transfers(count: usize) -> Vec<Arc<Transaction>> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let mut tx = MutableTransaction::new(Payload::Transfer {
                to: rng.gen(),
                amount: rng.gen_range(1..1_000),
            });
            tx.nonce = rng.gen();
            tx.gas_price = 1;
            tx.gas_limit = 21_000;
            tx.payer = rng.gen();
            tx.sigs = vec![Sig {
                pub_keys: vec![rng.gen()],
                m: 1,
                sig_data: vec![vec![0xAB; 64]],
            }];
            Arc::new(tx.into_immutable().unwrap())
        })
        .collect()
}

// ============================================================================
// Pool: admit and promote
// ============================================================================

fn bench_pool_admit_promote(c: &mut Criterion) {
    let mut group = c.benchmark_group("txn-pool-pool");

    for size in [100usize, 1_000, 10_000] {
        let txs = random_transfers(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("admit_promote", size), &txs, |b, txs| {
            b.iter(|| {
                let mut pool = TransactionPool::new(size);
                for (now, tx) in txs.iter().enumerate() {
                    pool.admit(tx.clone(), now as u64).unwrap();
                    pool.promote(&tx.hash(), now as u64);
                }
                black_box(pool.len())
            })
        });
    }

    group.finish();
}

// ============================================================================
// Coordinator: dispatch and aggregate
// ============================================================================

fn bench_coordinator_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("txn-pool-coordinator");
    let txs = random_transfers(1_000);

    for validators in [1usize, 4, 16] {
        let ids: Vec<ValidatorId> = (0..validators)
            .map(|i| ValidatorId::new(format!("v{i}")))
            .collect();

        group.throughput(Throughput::Elements(txs.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("all_pass", validators),
            &ids,
            |b, ids| {
                b.iter(|| {
                    let mut coordinator =
                        ValidationCoordinator::new(9_000, EmptyRegistryPolicy::Reject);
                    for tx in &txs {
                        let hash = tx.hash();
                        coordinator.admit(tx.clone(), Sender::Nil, 0);
                        let DispatchPlan::Dispatch { attempt, .. } =
                            coordinator.dispatch(&hash, ids.clone(), 0)
                        else {
                            continue;
                        };
                        for id in ids {
                            black_box(coordinator.on_verdict(VerdictMessage {
                                tx_hash: hash,
                                validator: id.clone(),
                                attempt,
                                verdict: Verdict::Pass,
                            }));
                        }
                    }
                    black_box(coordinator.len())
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Stateless validator
// ============================================================================

fn bench_stateless_validator(c: &mut Criterion) {
    let mut group = c.benchmark_group("txn-pool-validators");
    let txs = random_transfers(1_000);
    let validator = StatelessValidator;

    group.throughput(Throughput::Elements(txs.len() as u64));
    group.bench_function("stateless_validate", |b| {
        b.iter(|| {
            txs.iter()
                .filter(|tx| validator.validate(tx).is_pass())
                .count()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_pool_admit_promote,
    bench_coordinator_aggregation,
    bench_stateless_validator
);
criterion_main!(benches);
