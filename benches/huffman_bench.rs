/*
 * rawspeed - benches/huffman_bench.rs
 *
 * Copyright (C) 2024 The rawspeed-rs authors
 *
 * This library is free software: you can redistribute it and/or
 * modify it under the terms of the GNU Lesser General Public License
 * as published by the Free Software Foundation, either version 3 of
 * the License, or (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
 * Lesser General Public License for more details.
 *
 * You should have received a copy of the GNU Lesser General Public
 * License along with this library.  If not, see
 * <http://www.gnu.org/licenses/>.
 */

//! Benchmarks the prefix-code engine's decode hot path, grounded on the
//! teacher's `benches/the_benchmark.rs` (one `bench_function` per
//! workload, driven by `criterion_group!`/`criterion_main!`).

use criterion::{criterion_group, criterion_main, Criterion};

use rawspeed::bitpump::BitPumpMsb;
use rawspeed::buffer::{ByteBufferView, Endian};
use rawspeed::huffman::{DecodeMode, HuffmanTable};

fn build_table() -> HuffmanTable {
    // One code per length 1..=8, alphabet symbol equal to its own
    // 0-indexed position -- a small but non-trivial canonical table.
    let mut lens = [0u8; 16];
    for l in &mut lens[0..8] {
        *l = 1;
    }
    let values: Vec<u8> = (0..8).collect();
    HuffmanTable::new(&lens, &values, DecodeMode::LengthOnly).unwrap()
}

fn huffman_decode_benchmark(c: &mut Criterion) {
    let table = build_table();
    let data = vec![0xAAu8; 1 << 16];

    c.bench_function("huffman-decode-length-only", |b| {
        b.iter(|| {
            let view = ByteBufferView::new(&data, Endian::Big);
            let mut pump = BitPumpMsb::new(&view);
            let mut total = 0i64;
            for _ in 0..4096 {
                if let Ok(v) = table.decode(&mut pump) {
                    total += v as i64;
                } else {
                    break;
                }
            }
            total
        });
    });
}

criterion_group!(benches, huffman_decode_benchmark);
criterion_main!(benches);
