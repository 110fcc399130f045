// Benchmarks: indexed search vs direct scan, index rebuilds, rating aggregation
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use reviewdex::{RatingAggregator, Record};
use reviewdex_core::{scan, SearchIndex};
use serde_json::json;

const CULTIVARS: &[&str] = &[
    "Strawberry Cough", "Gelato", "Zkittlez", "Wedding Cake", "Runtz", "Purple Punch",
    "Gorilla Glue", "Amnesia Haze", "Lemon Haze", "Northern Lights",
];
const KINDS: &[&str] = &["Fleur", "Hash", "Concentré", "Comestible"];
const SUBSTRATES: &[&str] = &["Coco", "Perlite", "Living soil", "Hydro", "Terreau"];

fn generate_record(id: usize, rng: &mut StdRng) -> Record {
    let name = CULTIVARS.choose(rng).copied().unwrap_or("Gelato");
    Record::from_value(json!({
        "id": id as i64,
        "type": KINDS.choose(rng).copied().unwrap_or("Fleur"),
        "holderName": format!("{} #{}", name, id),
        "cultivars": name,
        "breeder": format!("Breeder {}", rng.random_range(0..50)),
        "substrat": [SUBSTRATES.choose(rng).copied().unwrap_or("Coco")],
        "terpenes": [{"name": "Myrcene"}, {"name": "Limonene"}],
        "densite": rng.random_range(0..=10),
        "montee": rng.random_range(0..=10),
        "extraData": {"intensiteEffet": rng.random_range(0..=10)}
    }))
    .unwrap()
}

fn generate_records(n: usize) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n).map(|i| generate_record(i, &mut rng)).collect()
}

fn benchmark_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for size in [100, 1000, 10000].iter() {
        let records = generate_records(*size);
        let index = SearchIndex::build(&records);

        group.bench_with_input(BenchmarkId::new("index", size), size, |b, _| {
            b.iter(|| index.search(black_box("haze")));
        });
        group.bench_with_input(BenchmarkId::new("scan", size), size, |b, _| {
            b.iter(|| scan(&records, black_box("haze")));
        });
    }

    group.finish();
}

fn benchmark_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");

    for size in [100, 1000, 10000].iter() {
        let records = generate_records(*size);
        group.bench_with_input(BenchmarkId::new("build", size), size, |b, _| {
            b.iter(|| SearchIndex::build(black_box(&records)));
        });
    }

    group.finish();
}

fn benchmark_suggest(c: &mut Criterion) {
    let records = generate_records(10000);
    let index = SearchIndex::build(&records);

    c.bench_function("suggest_prefix", |b| {
        b.iter(|| index.suggest(black_box("str"), 10));
    });
}

fn benchmark_ratings(c: &mut Criterion) {
    let records = generate_records(1000);
    let aggregator = RatingAggregator::default();

    c.bench_function("aggregate_1000", |b| {
        b.iter(|| {
            records
                .iter()
                .map(|r| aggregator.aggregate_record(r).overall())
                .sum::<f64>()
        });
    });
}

criterion_group!(benches, benchmark_search, benchmark_rebuild, benchmark_suggest, benchmark_ratings);
criterion_main!(benches);
