// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental frames.
//!
//! Build a small scene, then move, restyle, hide, and remove nodes and print what each
//! frame had to redraw.
//!
//! Run:
//! - `RUST_LOG=canopy_render=debug cargo run -p canopy_demos --example incremental_frames`

use canopy_render::{
    Canvas, Color, EngineConfig, FrameStats, PaintStyle, RecordingContext, Resource,
    ResourceCache, ResourceError, ResourceKey, ResourceLoader, SceneNode, Shadow, Shape,
};
use futures::future::{self, FutureExt, LocalBoxFuture};
use kurbo::{Affine, Circle, Rect, Vec2};

struct NoImages;

impl ResourceLoader<ResourceKey, Resource> for NoImages {
    fn load(&self, key: &ResourceKey) -> LocalBoxFuture<'static, Result<Resource, ResourceError>> {
        let key = key.to_string();
        future::ready(Err(ResourceError::Fetch {
            key,
            reason: "this demo has no images".into(),
        }))
        .boxed_local()
    }
}

fn report(label: &str, stats: &FrameStats, ctx: &mut RecordingContext) {
    println!(
        "{label:>10}: frame {} {:?}, {} dirty, region {:?}, drew {} nodes, {} state writes, {} calls",
        stats.frame,
        stats.mode,
        stats.dirty_nodes,
        stats.region,
        stats.drawn.len(),
        stats.state_mutations,
        ctx.take().len(),
    );
}

fn main() {
    env_logger::init();

    let mut canvas = Canvas::new(EngineConfig::new(400.0, 300.0), ResourceCache::new(NoImages));
    let mut ctx = RecordingContext::new();

    let panel = canvas.add(
        None,
        SceneNode::new(
            Shape::Rect(Rect::new(20.0, 20.0, 180.0, 140.0)),
            PaintStyle::filled(Color::rgb8(240, 240, 240)).with_stroke(Color::rgb8(90, 90, 90), 2.0),
        ),
    );
    let badge = canvas.add(
        Some(panel),
        SceneNode::new(
            Shape::Circle(Circle::new((60.0, 60.0), 16.0)),
            PaintStyle::filled(Color::rgb8(220, 60, 60)).with_shadow(Shadow {
                color: Color::rgba8(0, 0, 0, 96),
                blur: 4.0,
                offset: Vec2::new(2.0, 2.0),
            }),
        )
        .with_z_index(1),
    );
    let mut bars = Vec::new();
    for i in 0..8_u8 {
        let x = 220.0 + f64::from(i) * 20.0;
        bars.push(canvas.add(
            None,
            SceneNode::new(
                Shape::Rect(Rect::new(x, 200.0, x + 12.0, 280.0)),
                PaintStyle::filled(Color::rgb8(40, 120 + i * 16, 200)),
            ),
        ));
    }

    let stats = canvas.render(&mut ctx).expect("first frame");
    report("initial", &stats, &mut ctx);

    let stats = canvas.render(&mut ctx).expect("idle frame");
    report("idle", &stats, &mut ctx);

    // Moving the panel drags the badge along.
    canvas.set_transform(panel, Affine::translate((10.0, 15.0)));
    let stats = canvas.render(&mut ctx).expect("move");
    report("move", &stats, &mut ctx);

    // A single bar changes color; its neighbours are left alone.
    canvas.set_style(bars[3], PaintStyle::filled(Color::rgb8(250, 200, 40)));
    let stats = canvas.render(&mut ctx).expect("restyle");
    report("restyle", &stats, &mut ctx);

    // Redraw requests can also come in through the notifier, e.g. from a timer.
    let notifier = canvas.notifier();
    notifier.notify(bars[0]);
    notifier.notify(bars[7]);
    let stats = canvas.render(&mut ctx).expect("notify");
    report("notify", &stats, &mut ctx);

    canvas.set_visible(badge, false);
    let stats = canvas.render(&mut ctx).expect("hide");
    report("hide", &stats, &mut ctx);

    canvas.remove(panel);
    let stats = canvas.render(&mut ctx).expect("remove");
    report("remove", &stats, &mut ctx);

    canvas.set_immediate_mode(true);
    canvas.set_z_index(bars[0], 5);
    let stats = canvas.render(&mut ctx).expect("immediate");
    report("immediate", &stats, &mut ctx);
}
