//! Benchmarks for condition resolution, bulk assignment and compilation.
//!
//! Run with: cargo bench -p mik-search

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mik_search::{Catalog, EntityDef, Params, Registry, SemanticType, StaticSchema, parse_params};
use std::hint::black_box;
use std::sync::Arc;

fn catalog() -> Arc<Catalog> {
    let schema = StaticSchema::new()
        .entity(
            EntityDef::new("Account")
                .column("id", SemanticType::Integer)
                .column("name", SemanticType::Text)
                .column("created_at", SemanticType::Temporal)
                .relationship("users", "User"),
        )
        .entity(
            EntityDef::new("User")
                .column("first_name", SemanticType::Text)
                .column("age", SemanticType::Integer),
        );
    Arc::new(Catalog::from_schema(Registry::standard().expect("registry"), schema).expect("catalog"))
}

// =============================================================================
// Catalog Benchmarks
// =============================================================================

fn bench_catalog(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog");

    group.bench_function("build_standard", |b| {
        b.iter(catalog);
    });

    group.finish();
}

// =============================================================================
// Name Resolution Benchmarks
// =============================================================================

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    let catalog = catalog();

    let names = [
        ("canonical", "name_contains"),
        ("alias", "id_gt"),
        ("bare_column", "name"),
        ("modifier_chain", "name_trim_downcase_bw"),
        ("date_part", "created_at_day_of_month_gte"),
    ];

    for (label, name) in names {
        group.bench_with_input(BenchmarkId::new("set", label), name, |b, name| {
            let mut tree = catalog.conditions("Account").expect("tree");
            b.iter(|| tree.set(black_box(name), "1").is_ok());
        });
    }

    group.finish();
}

// =============================================================================
// Bulk Assignment + Compilation Benchmarks
// =============================================================================

fn bench_apply_and_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_sanitize");
    let catalog = catalog();
    let params = parse_params(
        r#"{
            "name_contains": "Binary",
            "id_gt": 5,
            "created_after": "2024-01-01",
            "users": {"first_name_like": "Ben", "age_in": [30, 31, 32]}
        }"#,
    )
    .expect("params");

    group.bench_function("parse_params", |b| {
        b.iter(|| parse_params(black_box(r#"{"name_contains": "Binary", "id_in": [1, 2, 3]}"#)));
    });

    group.bench_function("apply_protected", |b| {
        b.iter(|| {
            let mut tree = catalog.protected_conditions("Account").expect("tree");
            tree.apply(black_box(params.clone())).is_ok()
        });
    });

    let mut tree = catalog.conditions("Account").expect("tree");
    tree.apply(params.clone()).expect("apply");
    group.bench_function("sanitize_nested", |b| {
        b.iter(|| black_box(&tree).sanitize());
    });

    group.bench_function("value_roundtrip", |b| {
        b.iter(|| {
            let mut copy = catalog.conditions("Account").expect("tree");
            copy.apply(black_box(&tree).value()).is_ok()
        });
    });

    let empty = Params::empty();
    group.bench_function("apply_empty", |b| {
        b.iter(|| {
            let mut tree = catalog.conditions("Account").expect("tree");
            tree.apply(black_box(empty.clone())).is_ok()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_catalog, bench_resolution, bench_apply_and_sanitize);
criterion_main!(benches);
