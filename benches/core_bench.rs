//! Benchmarks for the two hottest paths in a reasoning cycle: interning
//! a term (every rule conclusion goes through this) and weighted concept
//! sampling (every cycle step starts with this).

use criterion::{criterion_group, criterion_main, Criterion};
use nar::config::{Config, SamplingObjectives};
use nar::memory::Memory;
use nar::task::{Punctuation, TaskBuilder};
use nar::term::{Op, Term};
use nar::truth::Truth;

fn bench_term_interning(c: &mut Criterion) {
    c.bench_function("intern_fresh_atom", |b| {
        let mut counter = 0u64;
        b.iter(|| {
            counter += 1;
            let name = format!("atom_{counter}");
            criterion::black_box(Term::atom(&name))
        });
    });

    c.bench_function("intern_repeated_compound", |b| {
        let bird = Term::atom("bird");
        let flyer = Term::atom("flyer");
        b.iter(|| criterion::black_box(Term::compound(Op::Inheritance, vec![bird.clone(), flyer.clone()]).unwrap()));
    });
}

fn bench_weighted_sampling(c: &mut Criterion) {
    let mut config = Config::default();
    config.seed = Some(7);
    let mut memory = Memory::new(config);
    for i in 0..512 {
        let term = Term::atom(&format!("concept_{i}"));
        let task = TaskBuilder::new()
            .term(term)
            .truth(Truth::new(0.9, 0.8))
            .punctuation(Punctuation::Belief)
            .build()
            .unwrap();
        memory.insert_task(task);
    }

    c.bench_function("sample_concept_weighted_512_concepts", |b| {
        let objectives = SamplingObjectives::default();
        b.iter(|| criterion::black_box(memory.sample_concept_weighted(objectives)));
    });
}

criterion_group!(benches, bench_term_interning, bench_weighted_sampling);
criterion_main!(benches);
