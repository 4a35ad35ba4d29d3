// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared images.
//!
//! Several nodes fill with the same image. The image is fetched once, nodes draw without it
//! until it arrives, and every owner is redrawn when it resolves or is replaced.
//!
//! Run:
//! - `RUST_LOG=canopy_render=trace cargo run -p canopy_demos --example shared_images`

use std::cell::RefCell;
use std::rc::Rc;

use canopy_render::{
    Bitmap, Canvas, Color, EngineConfig, Paint, PaintStyle, RecordingContext, Resource,
    ResourceCache, ResourceError, ResourceKey, ResourceLoader, SceneNode, Shape,
};
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::{FutureExt, LocalBoxFuture};
use kurbo::{Rect, RoundedRect};

/// Pending fetches, completed by hand to stand in for the network.
type Inbox = Rc<RefCell<Vec<(ResourceKey, oneshot::Sender<Bitmap>)>>>;

struct SlowNetwork {
    inbox: Inbox,
}

impl ResourceLoader<ResourceKey, Resource> for SlowNetwork {
    fn load(&self, key: &ResourceKey) -> LocalBoxFuture<'static, Result<Resource, ResourceError>> {
        println!("  fetching {key}");
        let (tx, rx) = oneshot::channel();
        self.inbox.borrow_mut().push((key.clone(), tx));
        let key = key.to_string();
        async move {
            rx.await.map(Resource::Bitmap).map_err(|_| ResourceError::Fetch {
                key,
                reason: "connection dropped".into(),
            })
        }
        .boxed_local()
    }

    fn dispose(&self, key: &ResourceKey, _value: &Resource) {
        println!("  disposing {key}");
    }
}

fn main() {
    env_logger::init();

    let inbox = Inbox::default();
    let mut pool = LocalPool::new();
    let resources = ResourceCache::new(SlowNetwork {
        inbox: inbox.clone(),
    })
    .with_spawner(pool.spawner());
    let mut canvas = Canvas::new(EngineConfig::new(320.0, 120.0), resources);
    let mut ctx = RecordingContext::new();

    let avatar = ResourceKey::image("avatar.png");
    let mut cards = Vec::new();
    for i in 0..4_u8 {
        let x = 10.0 + f64::from(i) * 76.0;
        cards.push(canvas.add(
            None,
            SceneNode::new(
                Shape::RoundedRect(RoundedRect::from_rect(Rect::new(x, 10.0, x + 64.0, 74.0), 8.0)),
                PaintStyle::filled(Paint::Resource(avatar.clone()))
                    .with_stroke(Color::rgb8(60, 60, 60), 1.0),
            ),
        ));
    }

    println!("frame 1: every card asks for the avatar");
    let stats = canvas.render(&mut ctx).expect("frame 1");
    println!(
        "  drew {} cards, {} fetch(es) started",
        stats.drawn.len(),
        canvas.scheduler().resources().fetch_count()
    );

    println!("network delivers the avatar");
    for (_, tx) in inbox.borrow_mut().drain(..) {
        let _ = tx.send(Bitmap::solid(64, 64, Color::rgb8(30, 160, 90)));
    }
    pool.run_until_stalled();

    let stats = canvas.render(&mut ctx).expect("frame 2");
    println!("frame 2: {} owners redrawn, region {:?}", stats.drawn.len(), stats.region);

    println!("the avatar changes in place");
    canvas
        .scheduler()
        .resources()
        .update(&avatar, Resource::Bitmap(Bitmap::solid(64, 64, Color::rgb8(200, 80, 20))));
    let stats = canvas.render(&mut ctx).expect("frame 3");
    println!("frame 3: {} owners redrawn", stats.drawn.len());

    println!("removing every card releases the last reference");
    for card in cards {
        canvas.remove(card);
    }
    println!(
        "  cached resources left: {}",
        canvas.scheduler().resources().len()
    );
}
