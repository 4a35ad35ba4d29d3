// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raster output.
//!
//! Draw a scene into a tiny-skia pixmap, update part of it incrementally, and write both
//! frames as PNG files to the system temp directory.
//!
//! Run:
//! - `cargo run -p canopy_demos --example raster_png`

use canopy_render::{
    Canvas, Color, EngineConfig, Filter, LineCap, PaintStyle, PixmapContext, Resource,
    ResourceCache, ResourceError, ResourceKey, ResourceLoader, SceneNode, Shape,
};
use futures::future::{self, FutureExt, LocalBoxFuture};
use kurbo::{Affine, Circle, Ellipse, Line, Point, Rect};

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

fn main() {
    env_logger::init();

    let (w, h) = (256, 160);
    let mut canvas = Canvas::new(
        EngineConfig::new(f64::from(w), f64::from(h)),
        ResourceCache::new(NoImages),
    );
    let Some(mut ctx) = PixmapContext::new(w, h) else {
        eprintln!("could not allocate a {w}x{h} pixmap");
        return;
    };

    canvas.add(
        None,
        SceneNode::new(
            Shape::Rect(Rect::new(0.0, 0.0, 256.0, 160.0)),
            PaintStyle::filled(Color::rgb8(250, 248, 240)),
        )
        .with_z_index(-1),
    );
    let sun = canvas.add(
        None,
        SceneNode::new(
            Shape::Circle(Circle::new((60.0, 50.0), 24.0)),
            PaintStyle::filled(Color::rgb8(250, 190, 40)),
        ),
    );
    canvas.add(
        None,
        SceneNode::new(
            Shape::Ellipse(Ellipse::new((170.0, 110.0), (60.0, 22.0), 0.0)),
            PaintStyle::filled(Color::rgb8(70, 140, 90)).with_filter(Filter::Grayscale(0.3)),
        ),
    );
    let mut horizon = PaintStyle::stroked(Color::rgb8(40, 40, 60), 3.0);
    horizon.line_cap = LineCap::Round;
    canvas.add(
        None,
        SceneNode::new(
            Shape::Line(Line::new(Point::new(10.0, 130.0), Point::new(246.0, 130.0))),
            horizon,
        ),
    );

    let stats = canvas.render(&mut ctx).expect("first frame");
    println!("frame {}: drew {} nodes", stats.frame, stats.drawn.len());
    let first = std::env::temp_dir().join("canopy_frame_1.png");
    if let Err(err) = ctx.pixmap().save_png(&first) {
        eprintln!("failed to write {}: {err}", first.display());
    }

    canvas.set_transform(sun, Affine::translate((80.0, 20.0)));
    let stats = canvas.render(&mut ctx).expect("second frame");
    println!(
        "frame {}: redrew {} nodes inside {:?}",
        stats.frame,
        stats.drawn.len(),
        stats.region
    );
    let second = std::env::temp_dir().join("canopy_frame_2.png");
    if let Err(err) = ctx.pixmap().save_png(&second) {
        eprintln!("failed to write {}: {err}", second.display());
    }
    println!("wrote {} and {}", first.display(), second.display());
}
