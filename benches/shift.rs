use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::prelude::*;
use range_selection::RangeSelection;

const SET_SIZE: usize = 1000;
const OPS: usize = 500;

/// 底层序列插入/删除时的下标平移
fn shift_benchmark(c: &mut Criterion) {
    let base: RangeSelection = (0..SET_SIZE).map(|i| (i * 10, i * 10 + 5)).collect();
    let len = SET_SIZE * 10;

    let mut rng = StdRng::seed_from_u64(42);
    let positions: Vec<usize> = (0..OPS).map(|_| rng.random_range(0..len)).collect();

    let mut group = c.benchmark_group("Index Shift");

    group.bench_function("insert_index - Random", |b| {
        b.iter(|| {
            let mut set = base.clone();
            for &at in black_box(&positions) {
                set.insert_index(at);
            }
        })
    });

    group.bench_function("insert_index - Front", |b| {
        b.iter(|| {
            let mut set = base.clone();
            for _ in 0..OPS {
                set.insert_index(black_box(0));
            }
        })
    });

    group.bench_function("remove_indexes - Random", |b| {
        b.iter(|| {
            let mut set = base.clone();
            for &at in black_box(&positions) {
                set.remove_indexes(at / 2, 3);
            }
        })
    });

    group.finish();
}

criterion_group!(benches, shift_benchmark);
criterion_main!(benches);
