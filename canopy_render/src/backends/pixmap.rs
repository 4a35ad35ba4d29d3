// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`DrawingContext`] rasterizing into a tiny-skia pixmap.
//!
//! Paths are kept in local coordinates and transformed when filled, stroked, or
//! clipped. Shadows are drawn as hard offset copies; blur is not rasterized.

use core::fmt;

use kurbo::{Affine, BezPath, PathEl, Point, Rect, Vec2};
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, GradientStop, IntSize, LinearGradient, Mask, Pixmap,
    RadialGradient, Shader, SpreadMode, Stroke, StrokeDash, Transform,
};

use crate::context::{Brush, DrawingContext};
use crate::resources::{Bitmap, Gradient, GradientKind, PatternRepeat, Resource};
use crate::style::{Color, Filter, LineCap, LineJoin};

/// Tolerance used when flattening arcs into cubic segments.
const ARC_TOLERANCE: f64 = 0.1;

#[derive(Clone)]
struct DrawState {
    transform: Affine,
    mask: Option<Mask>,
    fill: Brush,
    stroke: Brush,
    line_width: f64,
    line_dash: Vec<f64>,
    line_cap: LineCap,
    line_join: LineJoin,
    miter_limit: f64,
    alpha: f64,
    shadow_color: Color,
    shadow_offset: Vec2,
    filter: Option<Filter>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            mask: None,
            fill: Brush::default(),
            stroke: Brush::default(),
            line_width: 1.0,
            line_dash: Vec::new(),
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            alpha: 1.0,
            shadow_color: Color::TRANSPARENT,
            shadow_offset: Vec2::ZERO,
            filter: None,
        }
    }
}

impl DrawState {
    /// Shadow color and offset to draw under the next fill or stroke, if any.
    fn shadow(&self) -> Option<(Color, Vec2)> {
        if !self.shadow_color.is_transparent() {
            return Some((self.shadow_color, self.shadow_offset));
        }
        match self.filter {
            Some(Filter::DropShadow(s)) if !s.color.is_transparent() => Some((s.color, s.offset)),
            _ => None,
        }
    }

    fn stroke(&self) -> Stroke {
        let mut stroke = Stroke {
            width: f32_of(self.line_width),
            miter_limit: f32_of(self.miter_limit),
            line_cap: match self.line_cap {
                LineCap::Butt => tiny_skia::LineCap::Butt,
                LineCap::Round => tiny_skia::LineCap::Round,
                LineCap::Square => tiny_skia::LineCap::Square,
            },
            line_join: match self.line_join {
                LineJoin::Miter => tiny_skia::LineJoin::Miter,
                LineJoin::Round => tiny_skia::LineJoin::Round,
                LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
            },
            dash: None,
        };
        if !self.line_dash.is_empty() {
            let mut dash: Vec<f32> = self.line_dash.iter().map(|&d| f32_of(d)).collect();
            // An odd-length pattern repeats once to become even.
            if dash.len() % 2 == 1 {
                dash.extend_from_within(..);
            }
            stroke.dash = StrokeDash::new(dash, 0.0);
        }
        stroke
    }
}

/// A [`DrawingContext`] that rasterizes into a [`Pixmap`].
pub struct PixmapContext {
    pixmap: Pixmap,
    path: BezPath,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl fmt::Debug for PixmapContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixmapContext")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("depth", &self.stack.len())
            .finish_non_exhaustive()
    }
}

impl PixmapContext {
    /// Create a transparent surface. Returns `None` for a zero or oversized area.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Pixmap::new(width, height).map(Self::from_pixmap)
    }

    /// Draw into an existing pixmap.
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self {
            pixmap,
            path: BezPath::new(),
            state: DrawState::default(),
            stack: Vec::new(),
        }
    }

    /// The rendered pixels.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Give back the pixmap.
    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// Un-premultiplied color at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color::rgba8(c.red(), c.green(), c.blue(), c.alpha()))
    }

    fn paint_path(&mut self, stroke: Option<Stroke>) {
        let Some(path) = to_skia_path(&self.path) else {
            return;
        };
        let transform = to_skia_transform(self.state.transform);
        let brush = if stroke.is_some() {
            self.state.stroke.clone()
        } else {
            self.state.fill.clone()
        };
        let shadow = self.state.shadow().map(|(color, offset)| {
            (
                Brush::Solid(color),
                transform.post_translate(f32_of(offset.x), f32_of(offset.y)),
            )
        });

        let mut layers = Vec::with_capacity(2);
        layers.extend(shadow);
        layers.push((brush, transform));
        for (brush, transform) in layers {
            with_paint(&brush, &self.state, |paint| {
                let mask = self.state.mask.as_ref();
                match &stroke {
                    Some(stroke) => {
                        self.pixmap
                            .stroke_path(&path, paint, stroke, transform, mask);
                    }
                    None => {
                        self.pixmap
                            .fill_path(&path, paint, FillRule::Winding, transform, mask);
                    }
                }
            });
        }
    }
}

impl DrawingContext for PixmapContext {
    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn clear_rect(&mut self, rect: Rect) {
        let Some(r) = tiny_skia::Rect::from_ltrb(
            f32_of(rect.x0),
            f32_of(rect.y0),
            f32_of(rect.x1),
            f32_of(rect.y1),
        ) else {
            return;
        };
        let paint = tiny_skia::Paint {
            blend_mode: BlendMode::Clear,
            anti_alias: false,
            ..tiny_skia::Paint::default()
        };
        self.pixmap
            .fill_rect(r, &paint, Transform::identity(), self.state.mask.as_ref());
    }

    fn clip(&mut self) {
        let transform = to_skia_transform(self.state.transform);
        let path = to_skia_path(&self.path);
        match (&mut self.state.mask, path) {
            (Some(mask), Some(path)) => {
                mask.intersect_path(&path, FillRule::Winding, false, transform);
            }
            (slot, path) => {
                let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
                    return;
                };
                // An empty path leaves the mask clear, hiding everything.
                if let Some(path) = path {
                    mask.fill_path(&path, FillRule::Winding, false, transform);
                }
                *slot = Some(mask);
            }
        }
    }

    fn set_transform(&mut self, transform: Affine) {
        self.state.transform = transform;
    }

    fn begin_path(&mut self) {
        self.path = BezPath::new();
    }

    fn close_path(&mut self) {
        self.path.close_path();
    }

    fn move_to(&mut self, p: Point) {
        self.path.move_to(p);
    }

    fn line_to(&mut self, p: Point) {
        if self.path.elements().is_empty() {
            self.path.move_to(p);
        } else {
            self.path.line_to(p);
        }
    }

    fn quad_to(&mut self, p1: Point, p2: Point) {
        if self.path.elements().is_empty() {
            self.path.move_to(p1);
        }
        self.path.quad_to(p1, p2);
    }

    fn bezier_curve_to(&mut self, p1: Point, p2: Point, p3: Point) {
        if self.path.elements().is_empty() {
            self.path.move_to(p1);
        }
        self.path.curve_to(p1, p2, p3);
    }

    fn arc(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64) {
        let arc = kurbo::Arc {
            center,
            radii: Vec2::new(radius, radius),
            start_angle,
            sweep_angle: end_angle - start_angle,
            x_rotation: 0.0,
        };
        self.line_to(center + Vec2::from_angle(start_angle) * radius);
        arc.to_cubic_beziers(ARC_TOLERANCE, |p1, p2, p3| self.path.curve_to(p1, p2, p3));
    }

    fn fill(&mut self) {
        self.paint_path(None);
    }

    fn stroke(&mut self) {
        let stroke = self.state.stroke();
        self.paint_path(Some(stroke));
    }

    fn set_fill_style(&mut self, brush: &Brush) {
        self.state.fill = brush.clone();
    }

    fn set_stroke_style(&mut self, brush: &Brush) {
        self.state.stroke = brush.clone();
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    fn set_line_dash(&mut self, dash: &[f64]) {
        self.state.line_dash = dash.to_vec();
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.state.line_join = join;
    }

    fn set_miter_limit(&mut self, limit: f64) {
        self.state.miter_limit = limit;
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    fn set_shadow_color(&mut self, color: Color) {
        self.state.shadow_color = color;
    }

    fn set_shadow_blur(&mut self, _blur: f64) {}

    fn set_shadow_offset(&mut self, offset: Vec2) {
        self.state.shadow_offset = offset;
    }

    fn set_filter(&mut self, filter: Option<Filter>) {
        self.state.filter = filter;
    }
}

/// Build a tiny-skia paint for `brush` under `state` and hand it to `draw`.
///
/// Resources that cannot be turned into a shader draw nothing.
fn with_paint(brush: &Brush, state: &DrawState, draw: impl FnOnce(&tiny_skia::Paint<'_>)) {
    match brush {
        Brush::Solid(color) => {
            let color = apply_color_filter(*color, state.filter);
            let mut paint = tiny_skia::Paint::default();
            paint.set_color(to_skia_color(color, state.alpha));
            draw(&paint);
        }
        Brush::Shared(handle) => {
            let resource = handle.borrow();
            let (tile, spread, quality) = match &*resource {
                Resource::Bitmap(bitmap) => (bitmap, SpreadMode::Repeat, FilterQuality::Bilinear),
                Resource::Pattern(pattern) => {
                    let spread = match pattern.repeat {
                        PatternRepeat::Repeat => SpreadMode::Repeat,
                        PatternRepeat::RepeatX | PatternRepeat::RepeatY | PatternRepeat::NoRepeat => {
                            SpreadMode::Pad
                        }
                    };
                    (&pattern.tile, spread, FilterQuality::Nearest)
                }
                Resource::Gradient(gradient) => {
                    if let Some(shader) = gradient_shader(gradient, state.alpha) {
                        draw(&paint_with(shader));
                    }
                    return;
                }
            };
            let Some(pixmap) = to_pixmap(tile) else {
                return;
            };
            let shader = tiny_skia::Pattern::new(
                pixmap.as_ref(),
                spread,
                quality,
                f32_of(state.alpha),
                Transform::identity(),
            );
            draw(&paint_with(shader));
        }
    }
}

fn paint_with(shader: Shader<'_>) -> tiny_skia::Paint<'_> {
    tiny_skia::Paint {
        shader,
        ..tiny_skia::Paint::default()
    }
}

fn gradient_shader(gradient: &Gradient, alpha: f64) -> Option<Shader<'static>> {
    let stops = gradient
        .stops
        .iter()
        .map(|s| GradientStop::new(s.offset, to_skia_color(s.color, alpha)))
        .collect();
    match gradient.kind {
        GradientKind::Linear { start, end } => LinearGradient::new(
            to_skia_point(start),
            to_skia_point(end),
            stops,
            SpreadMode::Pad,
            Transform::identity(),
        ),
        GradientKind::Radial { center, radius } => RadialGradient::new(
            to_skia_point(center),
            to_skia_point(center),
            f32_of(radius),
            stops,
            SpreadMode::Pad,
            Transform::identity(),
        ),
    }
}

/// Brightness and grayscale act on solid colors; other filters leave the color alone.
fn apply_color_filter(color: Color, filter: Option<Filter>) -> Color {
    let (r, g, b) = (f64::from(color.r), f64::from(color.g), f64::from(color.b));
    match filter {
        Some(Filter::Brightness(k)) => {
            Color::rgba8(channel(r * k), channel(g * k), channel(b * k), color.a)
        }
        Some(Filter::Grayscale(amount)) => {
            let t = amount.clamp(0.0, 1.0);
            let luma = 0.2126 * r + 0.7152 * g + 0.0722 * b;
            let mix = |c: f64| channel(c + (luma - c) * t);
            Color::rgba8(mix(r), mix(g), mix(b), color.a)
        }
        _ => color,
    }
}

fn to_pixmap(bitmap: &Bitmap) -> Option<Pixmap> {
    let size = IntSize::from_wh(bitmap.width, bitmap.height)?;
    Pixmap::from_vec(bitmap.pixels.to_vec(), size)
}

fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = tiny_skia::PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(f32_of(p.x), f32_of(p.y)),
            PathEl::LineTo(p) => pb.line_to(f32_of(p.x), f32_of(p.y)),
            PathEl::QuadTo(p1, p2) => {
                pb.quad_to(f32_of(p1.x), f32_of(p1.y), f32_of(p2.x), f32_of(p2.y));
            }
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                f32_of(p1.x),
                f32_of(p1.y),
                f32_of(p2.x),
                f32_of(p2.y),
                f32_of(p3.x),
                f32_of(p3.y),
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn to_skia_transform(t: Affine) -> Transform {
    let [a, b, c, d, e, f] = t.as_coeffs();
    Transform::from_row(
        f32_of(a),
        f32_of(b),
        f32_of(c),
        f32_of(d),
        f32_of(e),
        f32_of(f),
    )
}

fn to_skia_point(p: Point) -> tiny_skia::Point {
    tiny_skia::Point::from_xy(f32_of(p.x), f32_of(p.y))
}

fn to_skia_color(color: Color, alpha: f64) -> tiny_skia::Color {
    let a = channel(f64::from(color.a) * alpha.clamp(0.0, 1.0));
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, a)
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "tiny-skia works in f32; scene coordinates fit comfortably."
)]
fn f32_of(v: f64) -> f32 {
    v as f32
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Clamped to 0..=255 before the cast."
)]
fn channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::config::EngineConfig;
    use crate::error::ResourceError;
    use crate::resource_cache::{ResourceCache, ResourceHandle, ResourceLoader};
    use crate::resources::ResourceKey;
    use crate::scene::SceneNode;
    use crate::shape::Shape;
    use crate::style::PaintStyle;
    use futures::future::{self, FutureExt, LocalBoxFuture};

    const RED: Color = Color::rgb8(255, 0, 0);
    const BLUE: Color = Color::rgb8(0, 0, 255);

    struct NoImages;

    impl ResourceLoader<ResourceKey, Resource> for NoImages {
        fn load(&self, key: &ResourceKey) -> LocalBoxFuture<'static, Result<Resource, ResourceError>> {
            future::ready(Err(ResourceError::Fetch {
                key: key.to_string(),
                reason: "offline".into(),
            }))
            .boxed_local()
        }
    }

    fn square(x: f64, y: f64, color: Color) -> SceneNode {
        SceneNode::new(
            Shape::Rect(Rect::new(x, y, x + 10.0, y + 10.0)),
            PaintStyle::filled(color),
        )
    }

    #[test]
    fn moving_a_square_clears_only_the_damaged_pixels() {
        let mut canvas = Canvas::new(EngineConfig::new(64.0, 64.0), ResourceCache::new(NoImages));
        let mut ctx = PixmapContext::new(64, 64).unwrap();
        let red = canvas.add(None, square(0.0, 0.0, RED));
        canvas.add(None, square(40.0, 40.0, BLUE));
        canvas.render(&mut ctx).unwrap();
        assert_eq!(ctx.pixel(5, 5), Some(RED));
        assert_eq!(ctx.pixel(45, 45), Some(BLUE));

        canvas.set_transform(red, Affine::translate((20.0, 0.0)));
        canvas.render(&mut ctx).unwrap();
        assert_eq!(ctx.pixel(5, 5), Some(Color::TRANSPARENT));
        assert_eq!(ctx.pixel(25, 5), Some(RED));
        assert_eq!(ctx.pixel(45, 45), Some(BLUE));
    }

    #[test]
    fn clip_confines_fills_until_restore() {
        let mut ctx = PixmapContext::new(32, 32).unwrap();
        ctx.save();
        ctx.begin_path();
        ctx.rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        ctx.clip();
        ctx.set_fill_style(&Brush::Solid(RED));
        ctx.begin_path();
        ctx.rect(Rect::new(0.0, 0.0, 32.0, 32.0));
        ctx.fill();
        ctx.restore();
        assert_eq!(ctx.pixel(5, 5), Some(RED));
        assert_eq!(ctx.pixel(20, 20), Some(Color::TRANSPARENT));

        // After restore the fill style and clip are back to their initial values.
        ctx.begin_path();
        ctx.rect(Rect::new(16.0, 16.0, 32.0, 32.0));
        ctx.fill();
        assert_eq!(ctx.pixel(20, 20), Some(Color::BLACK));
    }

    #[test]
    fn bitmap_brush_fills_with_its_pixels() {
        let mut ctx = PixmapContext::new(16, 16).unwrap();
        let green = Color::rgb8(0, 255, 0);
        let handle = ResourceHandle::new(Resource::Bitmap(Bitmap::solid(2, 2, green)));
        ctx.set_fill_style(&Brush::Shared(handle));
        ctx.begin_path();
        ctx.rect(Rect::new(0.0, 0.0, 16.0, 16.0));
        ctx.fill();
        assert_eq!(ctx.pixel(7, 9), Some(green));
    }

    #[test]
    fn global_alpha_and_grayscale_apply_to_solid_fills() {
        let mut ctx = PixmapContext::new(16, 16).unwrap();
        ctx.set_fill_style(&Brush::Solid(RED));
        ctx.set_filter(Some(Filter::Grayscale(1.0)));
        ctx.begin_path();
        ctx.rect(Rect::new(0.0, 0.0, 8.0, 16.0));
        ctx.fill();
        let gray = ctx.pixel(2, 2).unwrap();
        assert_eq!((gray.r, gray.g, gray.b), (54, 54, 54));

        ctx.set_filter(None);
        ctx.set_global_alpha(0.5);
        ctx.begin_path();
        ctx.rect(Rect::new(8.0, 0.0, 16.0, 16.0));
        ctx.fill();
        let half = ctx.pixel(12, 2).unwrap();
        assert!((127..=128).contains(&half.a), "alpha was {}", half.a);
    }

    #[test]
    fn shadow_is_drawn_offset_under_the_fill() {
        let mut ctx = PixmapContext::new(32, 32).unwrap();
        ctx.set_fill_style(&Brush::Solid(RED));
        ctx.set_shadow_color(BLUE);
        ctx.set_shadow_offset(Vec2::new(10.0, 0.0));
        ctx.begin_path();
        ctx.rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        ctx.fill();
        assert_eq!(ctx.pixel(5, 5), Some(RED));
        assert_eq!(ctx.pixel(15, 5), Some(BLUE));
        assert_eq!(ctx.pixel(25, 5), Some(Color::TRANSPARENT));
    }
}
