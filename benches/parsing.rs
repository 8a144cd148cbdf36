//! Benchmarks for markdown parsing.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use livemark::document::{Document, parse};

fn bench_parse_simple(c: &mut Criterion) {
    let doc = Document::from_text("# Hello\n\nWorld");
    c.bench_function("parse_simple", |b| b.iter(|| parse(black_box(&doc))));
}

fn bench_parse_medium(c: &mut Criterion) {
    let doc = Document::from_text(include_str!("../tests/fixtures/sample.md"));
    c.bench_function("parse_medium", |b| b.iter(|| parse(black_box(&doc))));
}

criterion_group!(benches, bench_parse_simple, bench_parse_medium);
criterion_main!(benches);
