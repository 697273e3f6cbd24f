//! Benchmarks du codec d’archives (Criterion)
//!
//! Suites :
//!   1) tokenize   — découpage ligne à ligne seul
//!   2) compile    — listing → octets (tokenize + charset + répertoire)
//!   3) decompile  — octets → listing, limite hex par défaut puis 1
//!
//! Lancement :
//!   cargo bench -p qadam-benches
//!   cargo bench -p qadam-benches -- --save-baseline main

use std::num::NonZeroUsize;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use qadam_benches::synthetic_source;
use qadam_core::CharsetTable;
use qadam_fil::{compile, decompile, decompile_with, DecompileOptions};

/// (sections, lignes par section)
const SIZES: &[(usize, usize)] = &[(1, 16), (16, 64), (64, 256)];

fn bench_tokenize(c: &mut Criterion) {
    let mut g = c.benchmark_group("tokenize");
    for &(sections, lines) in SIZES {
        let src = synthetic_source(sections, lines);
        g.throughput(Throughput::Bytes(src.len() as u64));
        g.bench_with_input(BenchmarkId::from_parameter(sections * lines), &src, |b, src| {
            b.iter(|| {
                let mut n = 0usize;
                for line in qadam_lexer::tokenize(black_box(src)) {
                    n += line.map(|(_, toks)| toks.len()).unwrap_or(0);
                }
                n
            });
        });
    }
    g.finish();
}

fn bench_compile(c: &mut Criterion) {
    let cs = CharsetTable::cp852();
    let mut g = c.benchmark_group("compile");
    for &(sections, lines) in SIZES {
        let src = synthetic_source(sections, lines);
        g.throughput(Throughput::Bytes(src.len() as u64));
        g.bench_with_input(BenchmarkId::from_parameter(sections * lines), &src, |b, src| {
            b.iter(|| compile(black_box(src), &cs).map(|v| v.len()).unwrap_or(0));
        });
    }
    g.finish();
}

fn bench_decompile(c: &mut Criterion) {
    let cs = CharsetTable::cp852();
    let eager = DecompileOptions { hex_run_limit: NonZeroUsize::MIN };
    let mut g = c.benchmark_group("decompile");
    for &(sections, lines) in SIZES {
        let Ok(bytes) = compile(&synthetic_source(sections, lines), &cs) else { continue };
        g.throughput(Throughput::Bytes(bytes.len() as u64));
        g.bench_with_input(BenchmarkId::new("default", bytes.len()), &bytes, |b, bytes| {
            b.iter(|| decompile(black_box(bytes), &cs).map(|s| s.len()).unwrap_or(0));
        });
        g.bench_with_input(BenchmarkId::new("limit=1", bytes.len()), &bytes, |b, bytes| {
            b.iter(|| decompile_with(black_box(bytes), &cs, eager).map(|s| s.len()).unwrap_or(0));
        });
    }
    g.finish();
}

fn config() -> Criterion {
    Criterion::default()
        .sample_size(60)
        .warm_up_time(Duration::from_millis(300))
        .measurement_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = config();
    targets = bench_tokenize, bench_compile, bench_decompile
}
criterion_main!(benches);
