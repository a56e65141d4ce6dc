//! Performance benchmarks for folio-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use folio_engine::{
    CollectionSchema, FieldDef, FieldType, MemoryStore, PageRequest, PageResult, Paginator,
    PaginatorConfig, Pipeline, PipelineExecutor, QueryExecutor, QueryParams, Record, Schema,
    SortPolicy,
};
use futures::executor::block_on;
use serde_json::json;

fn create_test_schema() -> Schema {
    let mut schema = Schema::new(1);
    let fields = vec![
        FieldDef::required("name", FieldType::String),
        FieldDef::optional("email", FieldType::String),
        FieldDef::optional("age", FieldType::Int),
        FieldDef::optional("deletedAt", FieldType::Timestamp),
    ];
    schema.add_collection(CollectionSchema::new("users", fields));
    schema
}

fn create_test_store(size: i64) -> MemoryStore {
    let mut store = MemoryStore::new(create_test_schema());
    for i in 1..=size {
        store
            .insert(Record::new(
                i,
                "users",
                json!({"name": format!("User {}", i), "age": 18 + i % 50}),
            ))
            .unwrap();
    }
    store
}

fn page<E: QueryExecutor>(executor: &E, store: &MemoryStore, query: &str) -> PageResult {
    let schema = store.schema().collection("users").unwrap();
    let config = PaginatorConfig::default();
    let request = PageRequest::from_params(
        schema,
        &config,
        QueryParams::parse(query),
        SortPolicy::default(),
        "/users",
    )
    .unwrap();
    block_on(Paginator::new(config).paginate(executor, schema, &request)).unwrap()
}

fn bench_pagination(c: &mut Criterion) {
    let mut group = c.benchmark_group("pagination");

    for size in [100, 1000, 5000].iter() {
        let store = create_test_store(*size);

        group.bench_with_input(BenchmarkId::new("first_page", size), size, |b, _| {
            b.iter(|| page(&store, &store, black_box("limit=20")))
        });

        group.bench_with_input(BenchmarkId::new("starting_after", size), size, |b, &size| {
            let query = format!("order_by=age&limit=20&starting_after={}", size / 2);
            b.iter(|| page(&store, &store, black_box(&query)))
        });

        group.bench_with_input(BenchmarkId::new("ending_before", size), size, |b, &size| {
            let query = format!("order_by=age&order=desc&limit=20&ending_before={}", size / 2);
            b.iter(|| page(&store, &store, black_box(&query)))
        });
    }

    group.finish();
}

fn bench_boundary_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("boundary");

    for size in [100, 1000, 5000].iter() {
        let store = create_test_store(*size);
        let pipeline = PipelineExecutor::new(&store, Pipeline::new());

        // Two limit-1 fetches
        group.bench_with_input(BenchmarkId::new("two_queries", size), size, |b, _| {
            b.iter(|| page(&store, &store, black_box("order_by=age&limit=20")))
        });

        // One accumulating pass
        group.bench_with_input(BenchmarkId::new("single_pass", size), size, |b, _| {
            b.iter(|| page(&pipeline, &store, black_box("order_by=age&limit=20")))
        });
    }

    group.finish();
}

fn bench_request_binding(c: &mut Criterion) {
    let mut group = c.benchmark_group("binding");

    group.bench_function("parse_query", |b| {
        let raw = "filter[age]=30&filter[name]=User%2030&order_by=name&order=desc&limit=25&starting_after=812";
        b.iter(|| QueryParams::parse(black_box(raw)))
    });

    group.bench_function("page_to_json", |b| {
        let store = create_test_store(100);
        let result = page(&store, &store, "limit=50");
        b.iter(|| serde_json::to_string(black_box(&result)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_pagination,
    bench_boundary_strategies,
    bench_request_binding,
);
criterion_main!(benches);
