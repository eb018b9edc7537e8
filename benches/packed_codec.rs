//! Packed-codec throughput benchmarks.
//!
//! ## Benchmarks:
//! - Write throughput for 2-bit and 4-bit packed lanes
//! - Read throughput for 2-bit and 4-bit packed lanes
//!
//! ## Run with:
//! `cargo bench --bench packed_codec`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tablecore::packed;

const LANES_1M: usize = 1_000_000;

fn packed_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("packed_write");
    group.throughput(Throughput::Elements(LANES_1M as u64));

    group.bench_function(BenchmarkId::new("width2", "1M_lanes"), |b| {
        b.iter(|| {
            let mut buf = vec![0u8; packed::byte_len(2, LANES_1M)];
            for i in 0..LANES_1M {
                packed::write2(&mut buf, i, black_box((i % 4) as u8));
            }
            black_box(buf.len())
        });
    });

    group.bench_function(BenchmarkId::new("width4", "1M_lanes"), |b| {
        b.iter(|| {
            let mut buf = vec![0u8; packed::byte_len(4, LANES_1M)];
            for i in 0..LANES_1M {
                packed::write4(&mut buf, i, black_box((i % 16) as u8));
            }
            black_box(buf.len())
        });
    });

    group.finish();
}

fn packed_read(c: &mut Criterion) {
    let mut buf2 = vec![0u8; packed::byte_len(2, LANES_1M)];
    for i in 0..LANES_1M {
        packed::write2(&mut buf2, i, (i % 4) as u8);
    }
    let mut buf4 = vec![0u8; packed::byte_len(4, LANES_1M)];
    for i in 0..LANES_1M {
        packed::write4(&mut buf4, i, (i % 16) as u8);
    }

    let mut group = c.benchmark_group("packed_read");
    group.throughput(Throughput::Elements(LANES_1M as u64));

    group.bench_function(BenchmarkId::new("width2", "1M_lanes"), |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for i in 0..LANES_1M {
                sum += packed::read2(&buf2, black_box(i)) as u64;
            }
            black_box(sum)
        });
    });

    group.bench_function(BenchmarkId::new("width4", "1M_lanes"), |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for i in 0..LANES_1M {
                sum += packed::read4(&buf4, black_box(i)) as u64;
            }
            black_box(sum)
        });
    });

    group.finish();
}

criterion_group!(benches, packed_write, packed_read);
criterion_main!(benches);
