// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The immediate-mode drawing surface the engine renders into.

use std::sync::Arc;

use kurbo::{Affine, Point, Rect, Vec2};

use crate::resource_cache::ResourceHandle;
use crate::resources::Resource;
use crate::state_cache::ContextState;
use crate::style::{Color, Filter, LineCap, LineJoin};

/// A resolved fill or stroke source.
#[derive(Clone, Debug)]
pub enum Brush {
    /// A solid color.
    Solid(Color),
    /// A shared resource from the resource cache.
    Shared(ResourceHandle<Resource>),
}

impl Default for Brush {
    fn default() -> Self {
        Self::Solid(Color::BLACK)
    }
}

impl From<Color> for Brush {
    fn from(c: Color) -> Self {
        Self::Solid(c)
    }
}

/// Shared brushes compare by identity, so a cached resource used by many nodes
/// is set on the context once.
impl PartialEq for Brush {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Solid(a), Self::Solid(b)) => a == b,
            (Self::Shared(a), Self::Shared(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// A 2-D immediate-mode drawing surface.
///
/// The engine assumes a freshly saved context starts from the initial values
/// reported by [`StateKey::initial`](crate::StateKey::initial), and brackets
/// every pass in `save`/`restore` so that stays true between passes.
pub trait DrawingContext {
    /// Push the current state.
    fn save(&mut self);
    /// Pop the last saved state.
    fn restore(&mut self);
    /// Clear `rect` (device space) to transparent.
    fn clear_rect(&mut self, rect: Rect);
    /// Intersect the clip region with the current path.
    fn clip(&mut self);
    /// Replace the current transform.
    fn set_transform(&mut self, transform: Affine);

    /// Start a new path.
    fn begin_path(&mut self);
    /// Close the current subpath.
    fn close_path(&mut self);
    /// Start a subpath at `p`.
    fn move_to(&mut self, p: Point);
    /// Straight segment to `p`.
    fn line_to(&mut self, p: Point);
    /// Quadratic segment.
    fn quad_to(&mut self, p1: Point, p2: Point);
    /// Cubic segment.
    fn bezier_curve_to(&mut self, p1: Point, p2: Point, p3: Point);
    /// Circular arc around `center`, angles in radians.
    fn arc(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64);
    /// Closed rectangular subpath.
    fn rect(&mut self, rect: Rect) {
        self.move_to(Point::new(rect.x0, rect.y0));
        self.line_to(Point::new(rect.x1, rect.y0));
        self.line_to(Point::new(rect.x1, rect.y1));
        self.line_to(Point::new(rect.x0, rect.y1));
        self.close_path();
    }

    /// Fill the current path.
    fn fill(&mut self);
    /// Stroke the current path.
    fn stroke(&mut self);

    /// Set the fill source.
    fn set_fill_style(&mut self, brush: &Brush);
    /// Set the stroke source.
    fn set_stroke_style(&mut self, brush: &Brush);
    /// Set the stroke width.
    fn set_line_width(&mut self, width: f64);
    /// Set the dash pattern. Empty means solid.
    fn set_line_dash(&mut self, dash: &[f64]);
    /// Set the end cap.
    fn set_line_cap(&mut self, cap: LineCap);
    /// Set the corner join.
    fn set_line_join(&mut self, join: LineJoin);
    /// Set the miter limit.
    fn set_miter_limit(&mut self, limit: f64);
    /// Set the global alpha.
    fn set_global_alpha(&mut self, alpha: f64);
    /// Set the shadow color.
    fn set_shadow_color(&mut self, color: Color);
    /// Set the shadow blur radius.
    fn set_shadow_blur(&mut self, blur: f64);
    /// Set the shadow offset.
    fn set_shadow_offset(&mut self, offset: Vec2);
    /// Set or clear the filter.
    fn set_filter(&mut self, filter: Option<Filter>);
}

/// One call made on a [`RecordingContext`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    /// `save`
    Save,
    /// `restore`
    Restore,
    /// `clear_rect`
    ClearRect(Rect),
    /// `clip`
    Clip,
    /// `set_transform`
    SetTransform(Affine),
    /// `begin_path`
    BeginPath,
    /// `close_path`
    ClosePath,
    /// `move_to`
    MoveTo(Point),
    /// `line_to`
    LineTo(Point),
    /// `quad_to`
    QuadTo(Point, Point),
    /// `bezier_curve_to`
    CurveTo(Point, Point, Point),
    /// `arc`
    Arc {
        /// Center.
        center: Point,
        /// Radius.
        radius: f64,
        /// Start angle.
        start_angle: f64,
        /// End angle.
        end_angle: f64,
    },
    /// `fill`
    Fill,
    /// `stroke`
    Stroke,
    /// Any property setter.
    Set(ContextState),
}

/// A [`DrawingContext`] that records every call instead of drawing.
#[derive(Clone, Debug, Default)]
pub struct RecordingContext {
    calls: Vec<DrawCall>,
}

impl RecordingContext {
    /// Create an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded so far.
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Take the recorded calls, leaving the recording empty.
    pub fn take(&mut self) -> Vec<DrawCall> {
        core::mem::take(&mut self.calls)
    }

    /// Number of recorded calls.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Number of property setter calls.
    pub fn state_changes(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Set(_)))
            .count()
    }

    /// Rectangles passed to `clear_rect`.
    pub fn cleared(&self) -> Vec<Rect> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::ClearRect(r) => Some(*r),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, call: DrawCall) {
        self.calls.push(call);
    }
}

impl DrawingContext for RecordingContext {
    fn save(&mut self) {
        self.push(DrawCall::Save);
    }

    fn restore(&mut self) {
        self.push(DrawCall::Restore);
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.push(DrawCall::ClearRect(rect));
    }

    fn clip(&mut self) {
        self.push(DrawCall::Clip);
    }

    fn set_transform(&mut self, transform: Affine) {
        self.push(DrawCall::SetTransform(transform));
    }

    fn begin_path(&mut self) {
        self.push(DrawCall::BeginPath);
    }

    fn close_path(&mut self) {
        self.push(DrawCall::ClosePath);
    }

    fn move_to(&mut self, p: Point) {
        self.push(DrawCall::MoveTo(p));
    }

    fn line_to(&mut self, p: Point) {
        self.push(DrawCall::LineTo(p));
    }

    fn quad_to(&mut self, p1: Point, p2: Point) {
        self.push(DrawCall::QuadTo(p1, p2));
    }

    fn bezier_curve_to(&mut self, p1: Point, p2: Point, p3: Point) {
        self.push(DrawCall::CurveTo(p1, p2, p3));
    }

    fn arc(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64) {
        self.push(DrawCall::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        });
    }

    fn fill(&mut self) {
        self.push(DrawCall::Fill);
    }

    fn stroke(&mut self) {
        self.push(DrawCall::Stroke);
    }

    fn set_fill_style(&mut self, brush: &Brush) {
        self.push(DrawCall::Set(ContextState::FillStyle(brush.clone())));
    }

    fn set_stroke_style(&mut self, brush: &Brush) {
        self.push(DrawCall::Set(ContextState::StrokeStyle(brush.clone())));
    }

    fn set_line_width(&mut self, width: f64) {
        self.push(DrawCall::Set(ContextState::LineWidth(width)));
    }

    fn set_line_dash(&mut self, dash: &[f64]) {
        let dash = (!dash.is_empty()).then(|| Arc::<[f64]>::from(dash));
        self.push(DrawCall::Set(ContextState::LineDash(dash)));
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.push(DrawCall::Set(ContextState::LineCap(cap)));
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.push(DrawCall::Set(ContextState::LineJoin(join)));
    }

    fn set_miter_limit(&mut self, limit: f64) {
        self.push(DrawCall::Set(ContextState::MiterLimit(limit)));
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.push(DrawCall::Set(ContextState::GlobalAlpha(alpha)));
    }

    fn set_shadow_color(&mut self, color: Color) {
        self.push(DrawCall::Set(ContextState::ShadowColor(color)));
    }

    fn set_shadow_blur(&mut self, blur: f64) {
        self.push(DrawCall::Set(ContextState::ShadowBlur(blur)));
    }

    fn set_shadow_offset(&mut self, offset: Vec2) {
        self.push(DrawCall::Set(ContextState::ShadowOffset(offset)));
    }

    fn set_filter(&mut self, filter: Option<Filter>) {
        self.push(DrawCall::Set(ContextState::Filter(filter)));
    }
}
