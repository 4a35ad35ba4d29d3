// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use canopy_render::{
    Canvas, Color, EngineConfig, NodeId, PaintStyle, RecordingContext, Resource, ResourceCache,
    ResourceError, ResourceKey, ResourceLoader, SceneNode, Shape,
};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use futures::future::{self, FutureExt, LocalBoxFuture};
use kurbo::{Affine, Rect};

struct NoImages;

impl ResourceLoader<ResourceKey, Resource> for NoImages {
    fn load(&self, key: &ResourceKey) -> LocalBoxFuture<'static, Result<Resource, ResourceError>> {
        let key = key.to_string();
        future::ready(Err(ResourceError::Fetch {
            key,
            reason: "benchmarks load nothing".into(),
        }))
        .boxed_local()
    }
}

/// An `n` x `n` grid of 8px squares on a 10px pitch, rendered once.
fn grid(n: usize, immediate: bool) -> (Canvas, Vec<NodeId>, RecordingContext) {
    let side = n as f64 * 10.0;
    let config = EngineConfig::new(side, side).with_immediate_mode(immediate);
    let mut canvas = Canvas::new(config, ResourceCache::new(NoImages));
    let mut ids = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let (x0, y0) = (x as f64 * 10.0, y as f64 * 10.0);
            let node = SceneNode::new(
                Shape::Rect(Rect::new(x0, y0, x0 + 8.0, y0 + 8.0)),
                PaintStyle::filled(Color::rgb8((x * 7) as u8, (y * 5) as u8, 128)),
            );
            ids.push(canvas.add(None, node));
        }
    }
    let mut ctx = RecordingContext::new();
    let _ = canvas.render(&mut ctx);
    ctx.take();
    (canvas, ids, ctx)
}

fn bench_single_move(c: &mut Criterion) {
    for &n in &[16usize, 32, 64] {
        let mut group = c.benchmark_group(format!("move_one_node_n{}", n));
        group.throughput(Throughput::Elements(1));
        for (name, immediate) in [("incremental", false), ("immediate", true)] {
            group.bench_function(name, |b| {
                b.iter_batched(
                    || grid(n, immediate),
                    |(mut canvas, ids, mut ctx)| {
                        let target = ids[ids.len() / 2];
                        canvas.set_transform(target, Affine::translate((3.0, 0.0)));
                        let stats = canvas.render(&mut ctx);
                        black_box((stats.map(|s| s.drawn.len()), ctx.len()));
                    },
                    BatchSize::LargeInput,
                )
            });
        }
        group.finish();
    }
}

fn bench_steady_animation(c: &mut Criterion) {
    let n = 32;
    let mut group = c.benchmark_group("animate_row_n32");
    group.throughput(Throughput::Elements(n as u64));
    for (name, immediate) in [("incremental", false), ("immediate", true)] {
        let (mut canvas, ids, mut ctx) = grid(n, immediate);
        let row: Vec<NodeId> = ids[..n].to_vec();
        let mut phase = 0.0_f64;
        group.bench_function(name, |b| {
            b.iter(|| {
                phase += 0.25;
                let dy = phase.sin();
                for &id in &row {
                    canvas.set_transform(id, Affine::translate((0.0, dy)));
                }
                let stats = canvas.render(&mut ctx);
                black_box(stats.map(|s| s.drawn.len()));
                ctx.take();
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_move, bench_steady_animation);
criterion_main!(benches);
