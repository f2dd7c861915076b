use criterion::{criterion_group, criterion_main, Criterion};
use json_grammar::{json_value, parse, run};
use std::hint::black_box;

fn document(records: usize) -> String {
    let rows: Vec<String> = (0..records)
        .map(|i| {
            format!(
                r#"{{"id": {i}, "name": "user {i}", "score": {i}.5e-1, "active": {}, "tags": ["a", "b", null]}}"#,
                i % 2 == 0
            )
        })
        .collect();
    format!("{{\"records\": [\n  {}\n]}}", rows.join(",\n  "))
}

fn bench_parse(c: &mut Criterion) {
    let small = document(10);
    let large = document(500);

    c.bench_function("parse_small_document", |b| {
        b.iter(|| parse(black_box(&small)).unwrap())
    });
    c.bench_function("parse_large_document", |b| {
        b.iter(|| parse(black_box(&large)).unwrap())
    });
    c.bench_function("build_and_parse_small_document", |b| {
        b.iter(|| run(&json_value(), black_box(&small)).unwrap().value)
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
