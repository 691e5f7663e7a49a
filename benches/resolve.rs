use criterion::{criterion_group, criterion_main, Criterion};
use spellscope::{ErrorIndex, MemoryBackend, RelativePath, Scope, ScopeStore, Token};

fn populated_store() -> ScopeStore<MemoryBackend> {
    let mut store = ScopeStore::load(MemoryBackend::new()).unwrap();
    for i in 0..200 {
        store.add_ignore(Scope::Global, &format!("global{}", i)).unwrap();
        store
            .add_ignore(Scope::Extension("rs".to_string()), &format!("ext{}", i))
            .unwrap();
        store
            .add_ignore(Scope::Path(RelativePath::from("src/lib.rs")), &format!("path{}", i))
            .unwrap();
    }
    store
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let store = populated_store();
    let path = RelativePath::from("src/main.rs");

    group.bench_function("is_ignored_miss", |b| {
        b.iter(|| store.is_ignored(std::hint::black_box("missstake"), &path, "en_US"));
    });

    group.bench_function("is_ignored_hit", |b| {
        b.iter(|| store.is_ignored(std::hint::black_box("ext150"), &path, "en_US"));
    });

    let tokens: Vec<Token> = (0..1_000)
        .map(|i| Token::new(format!("ext{}", i % 400), i * 8, i % 3 != 0))
        .collect();
    group.bench_function("compute_index", |b| {
        b.iter(|| {
            let index = ErrorIndex::compute(std::hint::black_box(&tokens), &path, "en", &store);
            std::hint::black_box(index);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_resolution);
criterion_main!(benches);
