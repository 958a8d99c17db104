//! Diff engine benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pgcompare_core::catalog::{Column, Database, DatabaseBuilder, Namespace, Relation, Type};
use pgcompare_core::diff::{align, diff_databases};

/// A schema of `tables` tables with `columns` columns each. `drift` appends
/// one extra column to every tenth table.
fn schema(tables: usize, columns: usize, drift: bool) -> Database {
    let mut builder = DatabaseBuilder::new("dbname=bench");
    let catalog = builder.add_namespace(Namespace::new("pg_catalog", "postgres"));
    let int4 = builder.add_type(Type::new(catalog, "int4", "postgres"));
    let public = builder.add_namespace(Namespace::new("public", "app"));
    for t in 0..tables {
        let rel = builder.add_relation(Relation::table(public, format!("table_{}", t), "app"));
        let extra = usize::from(drift && t % 10 == 0);
        for c in 0..columns + extra {
            builder.add_column(rel, Column::new(c as i16 + 1, format!("col_{}", c), int4));
        }
    }
    builder.finish().expect("valid schema")
}

fn bench_diff_databases(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff/databases");

    for &tables in &[10usize, 100, 500] {
        let identical = vec![schema(tables, 20, false), schema(tables, 20, false)];
        group.bench_with_input(BenchmarkId::new("identical", tables), &identical, |b, dbs| {
            b.iter(|| black_box(diff_databases(dbs)));
        });

        let drifted = vec![
            schema(tables, 20, false),
            schema(tables, 20, true),
            schema(tables, 20, false),
        ];
        group.bench_with_input(BenchmarkId::new("drift_3way", tables), &drifted, |b, dbs| {
            b.iter(|| black_box(diff_databases(dbs)));
        });
    }

    group.finish();
}

fn bench_align(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff/align");

    for &len in &[16usize, 128, 512] {
        let a: Vec<String> = (0..len).map(|i| format!("c{}", i)).collect();
        let b: Vec<String> = (0..len)
            .filter(|i| i % 7 != 0)
            .map(|i| format!("c{}", i))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(len), &(a, b), |bench, (a, b)| {
            bench.iter(|| black_box(align(a, b)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_diff_databases, bench_align);
criterion_main!(benches);
