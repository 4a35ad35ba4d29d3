// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolved paint style consumed by the draw routine.
//!
//! Style parsing and cascading happen upstream; this module only holds the
//! resolved values and knows how far each of them spills past the geometry.

use std::sync::Arc;

use kurbo::{Affine, Rect, Vec2};

use crate::resources::ResourceKey;

/// An 8-bit RGBA color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha. `0` is fully transparent.
    pub a: u8,
}

impl Color {
    /// Opaque black, the initial fill and stroke of a drawing context.
    pub const BLACK: Self = Self::rgb8(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb8(255, 255, 255);
    /// Fully transparent black, the initial shadow color.
    pub const TRANSPARENT: Self = Self::rgba8(0, 0, 0, 0);

    /// Create a color from RGBA components.
    pub const fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color.
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba8(r, g, b, 255)
    }

    /// True if the color has zero alpha.
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }
}

/// Dash pattern. Compared by identity in the render-state cache, so never mutate one in place.
pub type LineDash = Arc<[f64]>;

/// What a fill or stroke is painted with.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    /// A solid color.
    Solid(Color),
    /// A shared resource (image, gradient, or pattern) looked up in the resource cache.
    Resource(ResourceKey),
}

impl From<Color> for Paint {
    fn from(c: Color) -> Self {
        Self::Solid(c)
    }
}

/// Stroke end cap.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum LineCap {
    /// Flat end at the endpoint.
    #[default]
    Butt,
    /// Semicircular end.
    Round,
    /// Square end extending half the line width.
    Square,
}

/// Stroke corner join.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum LineJoin {
    /// Sharp corner, limited by the miter limit.
    #[default]
    Miter,
    /// Rounded corner.
    Round,
    /// Cut-off corner.
    Bevel,
}

/// A drop shadow drawn under fills.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Shadow {
    /// Shadow color.
    pub color: Color,
    /// Blur radius in device pixels.
    pub blur: f64,
    /// Offset in device pixels.
    pub offset: Vec2,
}

impl Shadow {
    /// Distance the shadow reaches past the geometry on each side.
    pub fn padding(&self) -> (f64, f64) {
        let blur = self.blur.max(0.0);
        (blur + self.offset.x.abs(), blur + self.offset.y.abs())
    }
}

/// A single post-processing filter.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Filter {
    /// Gaussian blur with the given standard deviation in pixels.
    Blur(f64),
    /// Drop shadow applied to the rendered result.
    DropShadow(Shadow),
    /// Brightness multiplier. `1.0` is unchanged.
    Brightness(f64),
    /// Grayscale amount in `0.0..=1.0`.
    Grayscale(f64),
}

impl Filter {
    /// Distance the filter output reaches past its input on each side.
    pub fn padding(&self) -> (f64, f64) {
        match self {
            // Two standard deviations covers what is visibly non-zero.
            Self::Blur(sigma) => {
                let p = 2.0 * sigma.max(0.0);
                (p, p)
            }
            Self::DropShadow(shadow) => shadow.padding(),
            Self::Brightness(_) | Self::Grayscale(_) => (0.0, 0.0),
        }
    }
}

/// Resolved paint state for one node.
#[derive(Clone, Debug, PartialEq)]
pub struct PaintStyle {
    /// Fill paint, if the node is filled.
    pub fill: Option<Paint>,
    /// Stroke paint, if the node is stroked.
    pub stroke: Option<Paint>,
    /// Stroke width in local units.
    pub line_width: f64,
    /// Dash pattern; `None` draws solid lines.
    pub line_dash: Option<LineDash>,
    /// Stroke end cap.
    pub line_cap: LineCap,
    /// Stroke corner join.
    pub line_join: LineJoin,
    /// Miter length limit relative to the line width.
    pub miter_limit: f64,
    /// Opacity applied to the whole node.
    pub opacity: f64,
    /// Shadow drawn under the fill.
    pub shadow: Option<Shadow>,
    /// Filter applied to the node.
    pub filter: Option<Filter>,
}

impl Default for PaintStyle {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            line_width: 1.0,
            line_dash: None,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            miter_limit: 10.0,
            opacity: 1.0,
            shadow: None,
            filter: None,
        }
    }
}

impl PaintStyle {
    /// A style that only fills.
    pub fn filled(paint: impl Into<Paint>) -> Self {
        Self {
            fill: Some(paint.into()),
            ..Default::default()
        }
    }

    /// A style that only strokes.
    pub fn stroked(paint: impl Into<Paint>, line_width: f64) -> Self {
        Self {
            stroke: Some(paint.into()),
            line_width,
            ..Default::default()
        }
    }

    /// Add a stroke to this style.
    #[must_use]
    pub fn with_stroke(mut self, paint: impl Into<Paint>, line_width: f64) -> Self {
        self.stroke = Some(paint.into());
        self.line_width = line_width;
        self
    }

    /// Add a shadow to this style.
    #[must_use]
    pub fn with_shadow(mut self, shadow: Shadow) -> Self {
        self.shadow = Some(shadow);
        self
    }

    /// Add a filter to this style.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Resources painted by the fill and stroke.
    pub fn resource_keys(&self) -> impl Iterator<Item = &ResourceKey> {
        [&self.fill, &self.stroke]
            .into_iter()
            .flatten()
            .filter_map(|paint| match paint {
                Paint::Resource(key) => Some(key),
                Paint::Solid(_) => None,
            })
    }

    /// True if drawing this style can produce any pixels.
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0 && (self.fill.is_some() || self.has_stroke())
    }

    fn has_stroke(&self) -> bool {
        self.stroke.is_some() && self.line_width > 0.0
    }

    /// Half the stroke width, in local units, with a miter allowance for sharp joins.
    fn stroke_padding(&self) -> f64 {
        if !self.has_stroke() {
            return 0.0;
        }
        let half = 0.5 * self.line_width;
        match self.line_join {
            LineJoin::Miter => half * self.miter_limit.max(1.0),
            LineJoin::Round | LineJoin::Bevel => half,
        }
    }

    /// World-space area this style can touch when painting `local_bounds` under `transform`.
    ///
    /// Stroke padding is applied in local space (it scales with the node); shadow and
    /// filter padding are applied in device space.
    pub fn render_bounds(&self, local_bounds: Rect, transform: Affine) -> Rect {
        let s = self.stroke_padding();
        let world = transform.transform_rect_bbox(local_bounds.inflate(s, s));
        let (mut px, mut py) = (0.0, 0.0);
        if let Some(shadow) = &self.shadow {
            let (x, y) = shadow.padding();
            px += x;
            py += y;
        }
        if let Some(filter) = &self.filter {
            let (x, y) = filter.padding();
            px += x;
            py += y;
        }
        world.inflate(px, py)
    }
}
