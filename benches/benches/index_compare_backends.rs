// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use canopy_index::{Aabb, Backend, FlatVec, Key, RTree, SpatialIndex};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Aabb> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            out.push(Aabb::from_xywh(x0, y0, cell, cell));
        }
    }
    out
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_random_rects(count: usize, extent: f64, size: f64) -> Vec<Aabb> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| {
            let x0 = rng.next_f64() * (extent - size).max(1.0);
            let y0 = rng.next_f64() * (extent - size).max(1.0);
            Aabb::from_xywh(x0, y0, size, size)
        })
        .collect()
}

fn insert_then_search<B: Backend>(mut idx: SpatialIndex<u32, B>, rects: &[Aabb], query: Aabb) {
    for (i, r) in rects.iter().copied().enumerate() {
        let _ = idx.insert(r, i as u32);
    }
    let hits = idx.search(query).count();
    black_box(hits);
}

fn bench_insert_search(c: &mut Criterion) {
    let query = Aabb::from_xywh(100.0, 100.0, 200.0, 200.0);
    for &n in &[16usize, 32, 64] {
        let rects = gen_grid_rects(n, 10.0);
        let mut group = c.benchmark_group(format!("insert_search_n{}", n));
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function("flatvec", |b| {
            b.iter_batched(
                SpatialIndex::<u32, FlatVec>::new,
                |idx| insert_then_search(idx, &rects, query),
                BatchSize::SmallInput,
            )
        });
        group.bench_function("rtree", |b| {
            b.iter_batched(
                SpatialIndex::<u32, RTree>::with_rtree,
                |idx| insert_then_search(idx, &rects, query),
                BatchSize::SmallInput,
            )
        });
        group.finish();
    }
}

fn bench_bulk_load(c: &mut Criterion) {
    let rects = gen_random_rects(4096, 2000.0, 12.0);
    let items: Vec<(Aabb, u32)> = rects
        .iter()
        .copied()
        .enumerate()
        .map(|(i, r)| (r, i as u32))
        .collect();
    let mut group = c.benchmark_group("rtree_build");
    group.throughput(Throughput::Elements(items.len() as u64));
    group.bench_function("incremental", |b| {
        b.iter_batched(
            SpatialIndex::<u32, RTree>::with_rtree,
            |idx| insert_then_search(idx, &rects, Aabb::from_xywh(800.0, 800.0, 400.0, 400.0)),
            BatchSize::SmallInput,
        )
    });
    group.bench_function("bulk", |b| {
        b.iter(|| {
            let (idx, keys) = SpatialIndex::<u32, RTree>::with_rtree_bulk(&items);
            black_box((idx.len(), keys.len()));
        })
    });
    group.finish();
}

/// Move a tenth of the boxes per iteration, the way a frame re-indexes dirty nodes.
fn move_some<B: Backend>(idx: &mut SpatialIndex<u32, B>, keys: &mut [Key], rng: &mut Rng) {
    for key in keys.iter_mut().step_by(10) {
        if let Some((aabb, payload)) = idx.remove(*key) {
            let [x, y] = aabb.min();
            let dx = (rng.next_f64() - 0.5) * 8.0;
            let dy = (rng.next_f64() - 0.5) * 8.0;
            *key = idx.insert(Aabb::from_xywh(x + dx, y + dy, aabb.width(), aabb.height()), payload);
        }
    }
    let hits = idx
        .search(Aabb::from_xywh(400.0, 400.0, 200.0, 200.0))
        .count();
    black_box(hits);
}

fn bench_update_heavy(c: &mut Criterion) {
    let rects = gen_random_rects(2048, 2000.0, 12.0);
    let mut group = c.benchmark_group("update_heavy");

    let mut flat = SpatialIndex::<u32, FlatVec>::new();
    let mut flat_keys: Vec<_> = rects
        .iter()
        .enumerate()
        .map(|(i, r)| flat.insert(*r, i as u32))
        .collect();
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    group.bench_function("flatvec", |b| {
        b.iter(|| move_some(&mut flat, &mut flat_keys, &mut rng))
    });

    let mut tree = SpatialIndex::<u32, RTree>::with_rtree();
    let mut tree_keys: Vec<_> = rects
        .iter()
        .enumerate()
        .map(|(i, r)| tree.insert(*r, i as u32))
        .collect();
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    group.bench_function("rtree", |b| {
        b.iter(|| move_some(&mut tree, &mut tree_keys, &mut rng))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_insert_search,
    bench_bulk_load,
    bench_update_heavy
);
criterion_main!(benches);
