//! Benchmarks for entropy encode and decode throughput.
//!
//! Run with: `cargo bench`
//! Compare with baseline: `cargo bench -- --save-baseline main`
//! Compare against baseline: `cargo bench -- --baseline main`

use ans_stream::{stream, EntropyCode, HybridUintConfig, ParallelConfig, ParallelRunner, Token};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

const VALUES: usize = 1 << 18;

/// Residual-like data: mostly small, occasionally large, three contexts.
fn residual_tokens(len: usize, seed: u32) -> Vec<Token> {
    let mut state = seed;
    (0..len)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let magnitude = match state % 16 {
                0 => state >> 12,
                1..=3 => state % 256,
                _ => state % 8,
            };
            let value = if state & 0x100 != 0 {
                -(magnitude as i32)
            } else {
                magnitude as i32
            };
            Token::signed(i % 3, value)
        })
        .collect()
}

fn contexts_of(tokens: &[Token]) -> Vec<usize> {
    tokens.iter().map(|t| t.context).collect()
}

fn bench_encode(c: &mut Criterion) {
    let tokens = residual_tokens(VALUES, 0x9E37_79B9);
    let code = EntropyCode::from_tokens(HybridUintConfig::default(), 3, &tokens).expect("code");

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(VALUES as u64));
    group.bench_function("tokens", |b| {
        b.iter(|| {
            let bytes = stream::encode_tokens(&code, black_box(&tokens));
            black_box(bytes)
        });
    });
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let tokens = residual_tokens(VALUES, 0x9E37_79B9);
    let code = EntropyCode::from_tokens(HybridUintConfig::default(), 3, &tokens).expect("code");
    let bytes = stream::encode_tokens(&code, &tokens).expect("encode");
    let contexts = contexts_of(&tokens);

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Elements(VALUES as u64));
    group.bench_function("tokens", |b| {
        b.iter(|| {
            let values = stream::decode_tokens(&code, black_box(&bytes), &contexts);
            black_box(values)
        });
    });
    group.finish();
}

fn bench_decode_units(c: &mut Criterion) {
    let units: Vec<Vec<Token>> = (0..16).map(|seed| residual_tokens(VALUES / 16, seed + 1)).collect();
    let all: Vec<Token> = units.iter().flatten().copied().collect();
    let code = EntropyCode::from_tokens(HybridUintConfig::default(), 3, &all).expect("code");
    let encoded: Vec<Vec<u8>> = units
        .iter()
        .map(|unit| stream::encode_tokens(&code, unit).expect("encode"))
        .collect();
    let contexts: Vec<Vec<usize>> = units.iter().map(|unit| contexts_of(unit)).collect();
    let inputs: Vec<(&[u8], &[usize])> = encoded
        .iter()
        .zip(&contexts)
        .map(|(bytes, contexts)| (bytes.as_slice(), contexts.as_slice()))
        .collect();

    let mut group = c.benchmark_group("decode_units");
    group.throughput(Throughput::Elements(all.len() as u64));
    for (name, runner) in [
        ("sequential", ParallelRunner::sequential()),
        ("default", ParallelRunner::new(ParallelConfig::default())),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let results = stream::decode_units(&runner, &code, black_box(&inputs));
                black_box(results)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_decode_units);
criterion_main!(benches);
