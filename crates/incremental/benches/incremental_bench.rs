//! Benchmarks for vista-incremental.
//!
//! Target: single item incremental update < 100μs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use vista_core::Value;
use vista_incremental::{Delta, IncrementalMax, IncrementalSum, OrderedIndex};

fn filled_index(size: i64) -> OrderedIndex<i64, i64> {
    OrderedIndex::from_entries((0..size).map(|i| (format!("k{}", i), (i * 7919) % size, Arc::new(i))))
}

fn bench_ordered_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordered_index");

    for size in [100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("insert_remove", size), &size, |b, &size| {
            let mut index = filled_index(size);
            b.iter(|| {
                let at = index.insert("probe".into(), black_box(size / 2), Arc::new(0));
                black_box(at);
                index.remove("probe")
            })
        });

        group.bench_with_input(BenchmarkId::new("update_moved", size), &size, |b, &size| {
            let mut index = filled_index(size);
            let mut rank = 0;
            b.iter(|| {
                rank = (rank + size / 3) % size;
                index.update("k1", black_box(rank), Arc::new(1))
            })
        });

        group.bench_with_input(BenchmarkId::new("rebuild", size), &size, |b, &size| {
            b.iter(|| filled_index(black_box(size)))
        });
    }

    group.finish();
}

fn bench_summaries(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    group.bench_function("sum/single_update", |b| {
        let mut sum = IncrementalSum::new();
        let deltas = [Delta::delete(Value::Int64(5)), Delta::insert(Value::Int64(9))];
        b.iter(|| sum.apply(black_box(&deltas)))
    });

    for size in [100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("max/remove_extreme", size), &size, |b, &size| {
            let mut max = IncrementalMax::new();
            let seed: Vec<Delta<Value>> = (0..size).map(|i| Delta::insert(Value::Int64(i))).collect();
            max.apply(&seed);
            let top = Value::Int64(size - 1);
            b.iter(|| {
                max.apply(&[Delta::delete(top.clone())]);
                let current = max.get();
                max.apply(&[Delta::insert(top.clone())]);
                black_box(current)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ordered_index, bench_summaries);

criterion_main!(benches);
