use criterion::{criterion_group, criterion_main, Criterion};
use engine::index::build_index;
use engine::pipeline::rank_queries;
use engine::corpus::Query;
use engine::VectorModel;

fn synthetic_corpus(n: usize) -> Vec<(String, Vec<String>)> {
    (0..n)
        .map(|i| {
            let tokens = (0..40).map(|j| format!("term{}", (i * 31 + j * 17) % 2_000)).collect();
            (format!("doc{i}"), tokens)
        })
        .collect()
}

fn bench_scoring(c: &mut Criterion) {
    let docs = synthetic_corpus(5_000);
    c.bench_function("build_index_5k", |b| b.iter(|| build_index(&docs, true)));

    let model = VectorModel::new(build_index(&docs, true));
    let queries: Vec<Query> = (0..200)
        .map(|q| Query { id: q, tokens: (0..6).map(|j| format!("term{}", (q * 13 + j * 101) % 2_000)).collect() })
        .collect();
    c.bench_function("rank_200_queries", |b| b.iter(|| rank_queries(&model, &queries, 100, true)));
}

criterion_group!(benches, bench_scoring);
criterion_main!(benches);
