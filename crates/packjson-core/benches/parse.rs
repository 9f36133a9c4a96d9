//! Parse throughput: packjson against serde_json on the same inputs.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use packjson_core::{parse_in, Arena, Document};
use std::hint::black_box;

const SMALL_JSON: &str = r#"{"id": 1, "name": "test", "status": "active"}"#;

fn generate_records(count: usize) -> String {
    let items: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"id":{i},"name":"Item {i}","price":{:.2},"active":{},"tags":["a","b\n","é"],"meta":{{"created":"2024-01-01T10:30:00Z","ratio":{}}}}}"#,
                i as f64 * 1.5 + 10.0,
                i % 2 == 0,
                1.0 / (i as f64 + 1.0)
            )
        })
        .collect();
    format!(r#"{{"data":[{}],"total":{count}}}"#, items.join(","))
}

fn generate_numbers(count: usize) -> String {
    let items: Vec<String> = (0..count)
        .map(|i| format!("{:e}", (i as f64 + 0.5) * 1.0e-3))
        .collect();
    format!("[{}]", items.join(","))
}

fn inputs() -> Vec<(&'static str, String)> {
    vec![
        ("small", SMALL_JSON.to_string()),
        ("records", generate_records(1000)),
        ("numbers", generate_numbers(10_000)),
        ("nested", format!("{}{}", "[".repeat(1000), "]".repeat(1000))),
    ]
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, json) in inputs() {
        group.throughput(Throughput::Bytes(json.len() as u64));

        group.bench_with_input(BenchmarkId::new("packjson", name), &json, |b, json| {
            b.iter(|| Document::parse(black_box(json.as_bytes())).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("packjson_parse_in", name), &json, |b, json| {
            b.iter(|| {
                let arena = Arena::new();
                let parsed = parse_in(&arena, black_box(json.as_bytes())).unwrap();
                black_box(parsed.value.tag());
            })
        });

        if name != "nested" {
            group.bench_with_input(BenchmarkId::new("serde_json", name), &json, |b, json| {
                b.iter(|| serde_json::from_str::<serde_json::Value>(black_box(json)).unwrap())
            });
        }
    }
    group.finish();
}

fn bench_traverse(c: &mut Criterion) {
    let json = generate_records(1000);
    let doc = Document::parse_str(&json).unwrap();

    c.bench_function("traverse/records", |b| {
        b.iter(|| {
            let mut total = 0.0;
            for item in doc.root().get("data").unwrap().as_array().unwrap() {
                total += item.get("price").unwrap().as_number().unwrap();
            }
            black_box(total)
        })
    });
}

criterion_group!(benches, bench_parse, bench_traverse);
criterion_main!(benches);
