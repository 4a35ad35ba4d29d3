// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Render: incremental dirty-rectangle rendering for retained 2D scenes.
//!
//! - [`FrameScheduler`]: batches node changes into frames, unions their old and new bounds into a
//!   single [`DirtyRegion`], and redraws only the indexed nodes that overlap it.
//! - [`StateCache`]: remembers the last value written for each [`StateKey`] so redundant
//!   context writes are skipped.
//! - [`ResourceCache`]: reference-counted shared resources (images, gradients, patterns) with
//!   deduplicated asynchronous loading.
//! - [`Scene`] and [`Canvas`]: a small retained scene graph wired to the scheduler.
//!
//! The engine draws through the [`DrawingContext`] trait. [`RecordingContext`] captures calls for
//! inspection; with the `tiny-skia` feature, `PixmapContext` rasterizes into a pixmap.
//!
//! # Example
//!
//! ```rust
//! use canopy_render::{
//!     Canvas, Color, EngineConfig, PaintStyle, RecordingContext, Resource, ResourceCache,
//!     ResourceError, ResourceKey, ResourceLoader, SceneNode, Shape,
//! };
//! use futures::future::{self, FutureExt, LocalBoxFuture};
//! use kurbo::{Affine, Rect};
//!
//! struct NoImages;
//!
//! impl ResourceLoader<ResourceKey, Resource> for NoImages {
//!     fn load(&self, key: &ResourceKey) -> LocalBoxFuture<'static, Result<Resource, ResourceError>> {
//!         let key = key.to_string();
//!         future::ready(Err(ResourceError::Fetch { key, reason: "offline".into() })).boxed_local()
//!     }
//! }
//!
//! let mut canvas = Canvas::new(EngineConfig::new(100.0, 100.0), ResourceCache::new(NoImages));
//! let mut ctx = RecordingContext::new();
//!
//! let a = canvas.add(
//!     None,
//!     SceneNode::new(
//!         Shape::Rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
//!         PaintStyle::filled(Color::rgb8(255, 0, 0)),
//!     ),
//! );
//! let _b = canvas.add(
//!     None,
//!     SceneNode::new(
//!         Shape::Rect(Rect::new(60.0, 60.0, 70.0, 70.0)),
//!         PaintStyle::filled(Color::rgb8(0, 0, 255)),
//!     ),
//! );
//! assert_eq!(canvas.render(&mut ctx).unwrap().drawn.len(), 2);
//!
//! // Move one square: only its old and new footprint is redrawn.
//! canvas.set_transform(a, Affine::translate((5.0, 0.0)));
//! let stats = canvas.render(&mut ctx).unwrap();
//! assert_eq!(stats.drawn, [a]);
//! assert_eq!(stats.region, Some(Rect::new(0.0, 0.0, 15.0, 11.0)));
//! ```
//!
//! ## Frames
//!
//! A frame is [`FrameScheduler::begin_frame`] followed by [`FrameScheduler::end_frame`].
//! Dirty notifications that arrive while a frame is flushing are queued on a [`DirtyNotifier`]
//! and picked up by the next frame.

pub mod backends;
pub mod canvas;
pub mod config;
pub mod context;
pub mod dirty_region;
pub mod error;
pub mod pipeline;
pub mod render_state;
pub mod resource_cache;
pub mod resources;
pub mod scene;
pub mod scheduler;
pub mod shape;
pub mod state_cache;
pub mod style;
pub mod types;

mod util;

pub use canopy_index::{Aabb, Backend, FlatVec, RTree};

pub use canvas::Canvas;
pub use config::{DEFAULT_BASELINE_PADDING, EngineConfig};
pub use context::{Brush, DrawCall, DrawingContext, RecordingContext};
pub use dirty_region::DirtyRegion;
pub use error::{FrameError, GeometryError, ResourceError};
pub use pipeline::ScenePipeline;
pub use render_state::{RecordFlags, RenderRecord};
pub use resource_cache::{ResourceCache, ResourceHandle, ResourceLoader};
pub use resources::{
    Bitmap, BitmapTile, ColorStop, Gradient, GradientKind, Pattern, PatternRepeat, Resource,
    ResourceKey, ResourceKind, SharedResources,
};
pub use scene::{NodeFlags, Scene, SceneNode};
pub use scheduler::{
    DirtyNotifier, FrameMode, FramePhase, FrameScheduler, FrameStats, sort_by_paint_order,
};
pub use shape::Shape;
pub use state_cache::{ContextState, StateCache, StateKey};
pub use style::{Color, Filter, LineCap, LineDash, LineJoin, Paint, PaintStyle, Shadow};
pub use types::{NodeId, PaintOrder};

#[cfg(feature = "tiny-skia")]
pub use backends::pixmap::PixmapContext;
