mod common;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use objax::{lexer, parser};

fn bench_frontend(c: &mut Criterion) {
    for (label, source) in common::workloads() {
        c.bench_function(&format!("frontend_tokenize_{label}"), |b| {
            b.iter(|| {
                for line in black_box(&source).lines() {
                    let out = lexer::tokenize(line).expect("tokenize");
                    black_box(out);
                }
            })
        });

        c.bench_function(&format!("frontend_parse_{label}"), |b| {
            b.iter(|| {
                let out = parser::parse(black_box(&source), &[]);
                black_box(out);
            })
        });
    }
}

criterion_group!(benches, bench_frontend);
criterion_main!(benches);
