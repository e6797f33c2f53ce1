//! benches/derive.rs
//! Argon2d derivation across memory sizes and lane counts
use argon2_native::{derive, Algorithm, Argon2, Inputs, Params};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::time::Duration;

const PASSWORD: &[u8] = b"password";
const SALT: &[u8] = b"somesalt";

fn derive_tag(m_cost: u32, lanes: u32) -> Vec<u8> {
    let tag = derive(2, m_cost, lanes, 32, black_box(PASSWORD), black_box(SALT));
    tag.unwrap()
}

fn memory_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("argon2d_memory");
    group.measurement_time(Duration::from_secs(8));
    group.sample_size(20);

    for &m_cost in &[1024u32, 8192, 65536] {
        let id = BenchmarkId::new("m_cost_kib", m_cost);
        group.bench_with_input(id, &m_cost, |b, &m_cost| {
            b.iter(|| black_box(derive_tag(m_cost, 1)));
        });
    }

    group.finish();
}

fn lane_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("argon2d_lanes");
    group.measurement_time(Duration::from_secs(8));
    group.sample_size(20);

    for &lanes in &[1u32, 2, 4, 8] {
        let id = BenchmarkId::new("lanes", lanes);
        group.bench_with_input(id, &lanes, |b, &lanes| {
            b.iter(|| black_box(derive_tag(16384, lanes)));
        });
    }

    group.finish();
}

fn algorithm_benches(c: &mut Criterion) {
    let params = Params::new(2, 4096, 1, 32).unwrap();
    let inputs = Inputs::new(PASSWORD, SALT);

    for algorithm in [Algorithm::Argon2d, Algorithm::Argon2i, Algorithm::Argon2id] {
        let argon2 = Argon2::new(algorithm, params);
        c.bench_function(algorithm.ident(), |b| {
            b.iter(|| argon2.hash(black_box(&inputs)).unwrap())
        });
    }
}

criterion_group!(benches, memory_benches, lane_benches, algorithm_benches);
criterion_main!(benches);
