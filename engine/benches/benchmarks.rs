//! Performance benchmarks for vaxsync-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use vaxsync_engine::{ConflictLog, ConflictLogEntry, MemoryStore, Record, Resolver, Strategy};

const NOW: i64 = 1_717_200_000_000;

fn child(id: u64, name: &str, updated_at: i64) -> Record {
    Record::classified(
        json!({
            "id": id,
            "name": name,
            "motherId": id / 2,
            "dateOfBirth": "2023-06-01",
            "lastWeight": 9.2,
            "_version": 1,
            "updatedAt": updated_at,
        })
        .as_object()
        .cloned()
        .unwrap_or_default(),
    )
}

fn bench_pair_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("pair_operations");
    let resolver = Resolver::default();
    let local = child(1, "Amina", NOW);
    let server = child(1, "Amina W.", NOW - 60_000);

    group.bench_function("detect", |b| {
        b.iter(|| resolver.detect(black_box(&local), black_box(&server)))
    });

    for strategy in Strategy::ALL {
        group.bench_with_input(
            BenchmarkId::new("resolve", strategy.as_str()),
            &strategy,
            |b, &strategy| {
                b.iter(|| resolver.resolve(black_box(&local), black_box(&server), strategy, NOW))
            },
        );
    }

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    let resolver = Resolver::default();

    for size in [100u64, 1_000, 10_000] {
        // Half the ids overlap; every tenth shared record conflicts
        let local: Vec<Record> = (0..size).map(|i| child(i, "local", NOW)).collect();
        let server: Vec<Record> = (size / 2..size + size / 2)
            .map(|i| {
                let name = if i % 10 == 0 { "server" } else { "local" };
                child(i, name, NOW)
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("custom", size), &size, |b, _| {
            b.iter(|| resolver.reconcile(black_box(&local), black_box(&server), Strategy::Custom, NOW))
        });
    }

    group.finish();
}

fn bench_conflict_log(c: &mut Criterion) {
    let mut group = c.benchmark_group("conflict_log");

    group.bench_function("append_full_log", |b| {
        let store = MemoryStore::new();
        let log = ConflictLog::new(&store);
        for n in 0..100 {
            if let Ok(entry) = ConflictLogEntry::new(json!({"n": n}), json!("merge"), NOW) {
                let _ = log.append(entry);
            }
        }

        b.iter(|| {
            let entry = ConflictLogEntry::new(json!({"n": 0}), json!("merge"), NOW).unwrap();
            log.append(black_box(entry))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_pair_operations, bench_reconcile, bench_conflict_log);
criterion_main!(benches);
