//! Benchmarks for the merge-on-write path.
//!
//! Every write re-reads and rewrites the whole file, so cost grows with the
//! number of stored rows. These benchmarks track that growth.
//!
//! Run with: `cargo bench -p carebook -- merge`

#![allow(missing_docs, clippy::cast_precision_loss)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use carebook::model::Measurement;
use carebook::registry::StoreRegistry;
use carebook::store::Table;
use tempfile::tempdir;

/// Builds `count` distinct measurements.
fn measurements(count: usize) -> Vec<Measurement> {
    (0..count)
        .map(|i| Measurement::new("1", "heart_rate", 60.0 + (i % 40) as f64, &format!("T{i}")))
        .collect()
}

fn bench_append_one(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge/append_one");

    for existing in [10, 100, 1_000] {
        let temp_dir = tempdir().unwrap();
        let registry = StoreRegistry::new();
        let table: Table<Measurement> = registry.table(temp_dir.path().join("measurements.csv"));
        table.append(&measurements(existing)).unwrap();

        let mut n = 0u64;
        group.bench_with_input(BenchmarkId::from_parameter(existing), &existing, |b, _| {
            b.iter(|| {
                n += 1;
                let m = Measurement::new("2", "spo2", 97.0, &format!("bench-{n}"));
                table.append(black_box(std::slice::from_ref(&m))).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_rewrite_duplicates(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge/rewrite_duplicates");

    for existing in [10, 100, 1_000] {
        let temp_dir = tempdir().unwrap();
        let registry = StoreRegistry::new();
        let table: Table<Measurement> = registry.table(temp_dir.path().join("measurements.csv"));
        let rows = measurements(existing);
        table.append(&rows).unwrap();

        // Read-all, write-all: every incoming row is already stored.
        group.bench_with_input(BenchmarkId::from_parameter(existing), &existing, |b, _| {
            b.iter(|| {
                table.append(black_box(&rows)).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let temp_dir = tempdir().unwrap();
    let registry = StoreRegistry::new();
    let table: Table<Measurement> = registry.table(temp_dir.path().join("measurements.csv"));
    table.append(&measurements(1_000)).unwrap();

    c.bench_function("merge/read_1000", |b| {
        b.iter(|| black_box(table.all().unwrap()));
    });
}

criterion_group!(benches, bench_append_one, bench_rewrite_duplicates, bench_read);
criterion_main!(benches);
