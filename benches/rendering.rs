//! Benchmarks for overlay builds.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use livemark::prelude::*;

fn options() -> PreviewOptions {
    let mut options = PreviewOptions::default();
    options.image.autoload = false;
    options
}

fn bench_full_build(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/sample.md");
    c.bench_function("full_build", |b| {
        b.iter(|| Session::new(black_box(md), options()).overlays())
    });
}

fn bench_cursor_move(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/sample.md");
    let mut session = Session::new(md, options());
    let len = session.document().len();
    let mut at = 0;
    c.bench_function("cursor_move", |b| {
        b.iter(|| {
            at = (at + 37) % len;
            session.update(Message::Edit(
                EditOperation::new().with_selection(Selection::cursor(black_box(at))),
            ))
        })
    });
}

criterion_group!(benches, bench_full_build, bench_cursor_move);
criterion_main!(benches);
