//! Benchmarks for indexing and record decoding.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jlv::file::{File, RoleTags};
use std::io::Cursor;

const LINES: usize = 10_000;

fn log_data() -> Vec<u8> {
    let mut data = String::with_capacity(LINES * 64);
    for i in 0..LINES {
        data.push_str(&format!(
            "{{\"time\":\"2026-01-01T00:00:{:02}Z\",\"level\":\"info\",\"msg\":\"message {}\",\"seq\":{}}}\n",
            i % 60,
            i,
            i
        ));
    }
    data.into_bytes()
}

fn bench_open(c: &mut Criterion) {
    let data = log_data();
    c.bench_function("open_10k_lines", |b| {
        b.iter(|| File::open(Cursor::new(black_box(data.clone())), RoleTags::default()))
    });
}

fn bench_record_access(c: &mut Criterion) {
    let mut file = File::open_with_cache(Cursor::new(log_data()), RoleTags::default(), 128);
    c.bench_function("record_access_strided", |b| {
        let mut n = 0usize;
        b.iter(|| {
            let record = file.record(black_box(n % LINES));
            n += 97;
            record
        })
    });
}

criterion_group!(benches, bench_open, bench_record_access);
criterion_main!(benches);
