//! Benchmarks for staging and searching through the in-process server.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use vectorlane_core::prelude::*;
use vectorlane_core::stage;

const DIM: usize = 128;

fn generate_random_vector(dim: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn schema() -> CollectionSchema {
    build_schema(vec![
        FieldSchema::int64("id").primary(),
        FieldSchema::float_vector("embedding", DIM),
        FieldSchema::varchar("subject", 32),
    ])
    .unwrap()
}

fn records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            Record::new()
                .with_field("id", i as i64)
                .with_vector("embedding", generate_random_vector(DIM))
                .with_field("subject", if i % 2 == 0 { "history" } else { "biology" })
        })
        .collect()
}

fn loaded_collection(n: usize) -> Collection {
    let conn = Connection::open("bench", Arc::new(MemoryServer::new())).unwrap();
    let collection = conn.create_collection("bench", schema()).unwrap();
    collection.insert(&records(n), None).unwrap();
    collection
        .create_index("embedding", &IndexSpec::flat(MetricType::L2))
        .unwrap();
    collection.load().unwrap();
    collection
}

fn bench_stage(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage");
    let schema = schema();

    for n in [100, 1_000].iter() {
        let batch = records(*n);
        group.throughput(Throughput::Elements(*n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |bench, _| {
            bench.iter(|| stage(black_box(&batch), &schema, None).unwrap())
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_search");

    for n in [1_000, 10_000].iter() {
        let collection = loaded_collection(*n);
        let request = SearchRequest::new(
            "embedding",
            vec![generate_random_vector(DIM)],
            SearchParams::new(MetricType::L2),
        )
        .limit(10);

        group.throughput(Throughput::Elements(*n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |bench, _| {
            bench.iter(|| collection.search(black_box(&request)).unwrap())
        });
    }

    group.finish();
}

fn bench_filtered_search(c: &mut Criterion) {
    let collection = loaded_collection(10_000);
    let request = SearchRequest::new(
        "embedding",
        vec![generate_random_vector(DIM)],
        SearchParams::new(MetricType::L2),
    )
    .limit(10)
    .filter(r#"subject == "history""#);

    c.bench_function("memory_search_filtered_10000", |bench| {
        bench.iter(|| collection.search(black_box(&request)).unwrap())
    });
}

criterion_group!(benches, bench_stage, bench_search, bench_filtered_search);
criterion_main!(benches);
