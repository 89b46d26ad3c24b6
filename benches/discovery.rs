//! Member discovery benchmarks
//!
//! Measures pattern matching and tree walks over generated project trees,
//! plus the cost of merging a pushed type set into the index.
//!
//! Run with: cargo bench --bench discovery

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

use continuum::{
    FileDiscovery, FilePatterns, HostEnvironment, Result, SymbolIndex, TypeDefinition, TypeIndex,
    TypeSet,
};

/// Tree sizes as (directories, files per directory)
const TREES: &[(&str, usize, usize)] = &[
    ("small", 10, 20),
    ("medium", 50, 40),
    ("large", 200, 50),
];

const EXTENSIONS: &[&str] = &["exe", "dll", "so", "pdb", "txt", "i64"];

/// Generate a tree where one file in three is a member binary
fn generate_tree(dirs: usize, files_per_dir: usize) -> TempDir {
    let temp = tempfile::tempdir().unwrap();
    for d in 0..dirs {
        let dir = temp.path().join(format!("pkg{:03}/bin", d));
        fs::create_dir_all(&dir).unwrap();
        for f in 0..files_per_dir {
            let ext = EXTENSIONS[f % EXTENSIONS.len()];
            fs::write(dir.join(format!("module{:03}.{}", f, ext)), b"MZ").unwrap();
        }
    }
    temp
}

fn bench_discovery_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery_walk");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));

    for (name, dirs, files_per_dir) in TREES {
        let tree = generate_tree(*dirs, *files_per_dir);
        let root: PathBuf = tree.path().to_path_buf();
        let discovery = FileDiscovery::new(&root, FilePatterns::parse("*.exe;*.dll;*.so")).unwrap();
        group.throughput(Throughput::Elements((dirs * files_per_dir) as u64));

        group.bench_with_input(BenchmarkId::new("walk", name), &discovery, |b, discovery| {
            b.iter(|| black_box(discovery.iter().count()));
        });
    }

    group.finish();
}

fn bench_pattern_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_matching");
    let names: Vec<String> = (0..1000)
        .map(|i| format!("module{:04}.{}", i, EXTENSIONS[i % EXTENSIONS.len()]))
        .collect();

    for raw in ["*.exe", "*.exe;*.dll;*.so", "*.exe;*.dll;*.so;lib*.a;*.sys;*.ko"] {
        let discovery = FileDiscovery::new(Path::new("."), FilePatterns::parse(raw)).unwrap();
        group.throughput(Throughput::Elements(names.len() as u64));
        group.bench_with_input(BenchmarkId::new("names", raw), &names, |b, names| {
            b.iter(|| {
                names
                    .iter()
                    .filter(|n| discovery.matches_name(black_box(n)))
                    .count()
            });
        });
    }

    group.finish();
}

/// Host with an empty library that accepts every import
struct NullHost;

impl HostEnvironment for NullHost {
    fn current_binary_path(&self) -> Option<PathBuf> {
        None
    }

    fn auto_analysis_complete(&self) -> bool {
        true
    }

    fn local_types(&self) -> Vec<TypeDefinition> {
        Vec::new()
    }

    fn import_types(&self, _types: &[TypeDefinition]) -> Result<()> {
        Ok(())
    }
}

fn bench_type_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("type_merge");
    group.sample_size(20);

    for count in [100usize, 1_000, 5_000] {
        let set = (0..count).fold(TypeSet::new("/p/peer.dll.i64"), |set, i| {
            set.with_type(format!("T{}", i), format!("typedef int T{};", i))
        });
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("fresh_index", count), &set, |b, set| {
            b.iter(|| {
                let mut index = TypeIndex::open_in_memory("/p/app.exe.i64").unwrap();
                black_box(index.sync_types_into_database(&NullHost, set, true).unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_discovery_walk,
    bench_pattern_matching,
    bench_type_merge
);
criterion_main!(benches);
