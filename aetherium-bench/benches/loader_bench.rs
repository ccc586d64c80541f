//! Loader and validator benchmarks.

use aetherium_core::{Loader, Validator};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Builds a chain automata with `n` states and `n - 1` transitions.
fn chain_document(n: usize) -> String {
    let mut yaml = String::from("version: 1\nconfig:\n  name: chain\n  type: inline\nautomata:\n");
    yaml.push_str("  variables: [\"step:int\"]\n  states:\n");
    for i in 0..n {
        yaml.push_str(&format!(
            "    state_{}:\n      inputs: [\"go:bool\"]\n      outputs: [\"at:int\"]\n      on_enter: \"at = {}\"\n",
            i, i
        ));
    }
    yaml.push_str("  transitions:\n");
    for i in 0..n.saturating_sub(1) {
        yaml.push_str(&format!(
            "    next_{}:\n      from: state_{}\n      to: state_{}\n      condition: \"go\"\n",
            i,
            i,
            i + 1
        ));
    }
    yaml
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("loader_load");

    for size in [10usize, 100, 500] {
        let yaml = chain_document(size);
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("parsed", size), &doc, |b, doc| {
            b.iter(|| black_box(Loader::load(doc).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("from_str", size), &yaml, |b, yaml| {
            b.iter(|| black_box(Loader::load_str(yaml).unwrap()));
        });
    }

    group.finish();
}

fn bench_reload(c: &mut Criterion) {
    let mut group = c.benchmark_group("loader_reload");

    let doc: serde_yaml::Value = serde_yaml::from_str(&chain_document(100)).unwrap();
    let mut automata = Loader::load(&doc).unwrap();

    group.bench_function("chain_100", |b| {
        b.iter(|| {
            automata.reload(black_box(&doc)).unwrap();
        });
    });

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validator");

    let yaml = chain_document(100);
    group.bench_function("chain_100", |b| {
        b.iter(|| black_box(Validator::check_str(&yaml).is_ok()));
    });

    group.finish();
}

criterion_group!(benches, bench_load, bench_reload, bench_validate);
criterion_main!(benches);
