//! Bulk Codec Benchmarks
//!
//! Measures NDJSON encoding of typed batches and positional decoding of
//! engine answers.
//!
//! Run benchmarks:
//!   cargo bench --bench bulk_codec

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quarry::prelude::*;
use quarry::{BulkCodec, BulkOperation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Project {
    id: u32,
    name: String,
}

impl Document for Project {
    fn type_tag() -> &'static str {
        "Project"
    }

    fn id(&self) -> Option<String> {
        Some(self.id.to_string())
    }
}

fn operations(size: u32) -> Vec<BulkOperation> {
    let settings = Arc::new(ConnectionSettings::default().with_default_index("bench"));
    let projects: Vec<Project> = (0..size)
        .map(|id| Project {
            id,
            name: format!("project-{}", id),
        })
        .collect();

    let mut bulk = BulkDescriptor::new(settings);
    for project in &projects {
        if project.id % 2 == 0 {
            bulk.index(IndexOperation::new(project)).ok();
        } else {
            bulk.update(
                UpdateOperation::new()
                    .object(project)
                    .document(&json!({"name": "renamed"})),
            )
            .ok();
        }
    }
    bulk.operations().to_vec()
}

fn answer(ops: &[BulkOperation]) -> Vec<u8> {
    let items: Vec<_> = ops
        .iter()
        .map(|op| {
            let mut item = serde_json::Map::new();
            item.insert(
                op.op_type().as_str().to_string(),
                json!({"_index": "bench", "_type": "project", "_id": op.id(), "_version": 1, "ok": true}),
            );
            serde_json::Value::Object(item)
        })
        .collect();
    json!({"took": 5, "items": items}).to_string().into_bytes()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_encode");

    for size in [10u32, 100, 1000] {
        let ops = operations(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &ops, |b, ops| {
            b.iter(|| BulkCodec::encode(black_box(ops)))
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_decode");

    for size in [10u32, 100, 1000] {
        let ops = operations(size);
        let body = answer(&ops);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &body, |b, body| {
            b.iter(|| BulkCodec::decode(black_box(&ops), 200, black_box(body)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
