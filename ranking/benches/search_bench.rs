use criterion::{criterion_group, criterion_main, Criterion};
use ranking::index::{CorpusIndex, DocumentRecord};
use ranking::search::search;
use ranking::{ModelKind, Query};
use std::collections::HashMap;

fn synthetic_index(num_docs: u32) -> CorpusIndex {
    let docs = (0..num_docs)
        .map(|i| {
            let frequencies: HashMap<u32, u32> = (0..12).map(|j| ((i * 7 + j * 13) % 500, 1 + (i + j) % 5)).collect();
            DocumentRecord::new(format!("doc{i}"), format!("c{}", i % 10), frequencies)
        })
        .collect();
    CorpusIndex::build(docs).expect("non-empty corpus")
}

fn bench_search(c: &mut Criterion) {
    let index = synthetic_index(20_000);
    let query = Query::new(0, HashMap::from([(13, 1), (26, 1), (91, 2)]), 4);
    for kind in [ModelKind::Bm25, ModelKind::Pl2, ModelKind::DirichletPrior] {
        let scorer = kind.build();
        c.bench_function(&format!("search_20k_{}", kind.id()), |b| b.iter(|| search(&index, &query, scorer.as_ref())));
    }
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
