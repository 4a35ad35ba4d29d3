// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared paint resources: decoded bitmaps, gradients, and patterns.

use core::fmt;
use std::sync::Arc;

use kurbo::Point;

use crate::resource_cache::ResourceCache;
use crate::style::Color;
use crate::types::NodeId;

/// The kind of a shared resource.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// A decoded raster image.
    Image,
    /// A computed gradient.
    Gradient,
    /// A compiled repeating pattern.
    Pattern,
}

/// Identity of a shared resource: its kind plus a source identifier (URL, gradient definition, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Source identifier, unique within `kind`.
    pub id: Arc<str>,
}

impl ResourceKey {
    /// Key for an image source.
    pub fn image(id: impl Into<Arc<str>>) -> Self {
        Self {
            kind: ResourceKind::Image,
            id: id.into(),
        }
    }

    /// Key for a gradient definition.
    pub fn gradient(id: impl Into<Arc<str>>) -> Self {
        Self {
            kind: ResourceKind::Gradient,
            id: id.into(),
        }
    }

    /// Key for a pattern definition.
    pub fn pattern(id: impl Into<Arc<str>>) -> Self {
        Self {
            kind: ResourceKind::Pattern,
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ResourceKind::Image => "image",
            ResourceKind::Gradient => "gradient",
            ResourceKind::Pattern => "pattern",
        };
        write!(f, "{kind}:{}", self.id)
    }
}

/// One tile of a sliced bitmap, in source pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct BitmapTile {
    /// Left edge in source pixels.
    pub x: u32,
    /// Top edge in source pixels.
    pub y: u32,
    /// Tile pixels.
    pub bitmap: Bitmap,
}

/// A decoded RGBA8 image (premultiplied), plus variants attached after decoding.
#[derive(Clone, PartialEq)]
pub struct Bitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes, row major.
    pub pixels: Arc<[u8]>,
    /// Half-resolution variant for drawing at small scales.
    pub downsampled: Option<Arc<Bitmap>>,
    /// Tile slices for very large images.
    pub tiles: Vec<BitmapTile>,
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("downsampled", &self.downsampled.is_some())
            .field("tiles", &self.tiles.len())
            .finish_non_exhaustive()
    }
}

impl Bitmap {
    /// Wrap raw RGBA8 pixels. Returns `None` if the buffer length does not match the size.
    pub fn from_rgba8(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Option<Self> {
        let pixels = pixels.into();
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
            downsampled: None,
            tiles: Vec::new(),
        })
    }

    /// A bitmap filled with one color.
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let px = [color.r, color.g, color.b, color.a];
        let pixels: Vec<u8> = px
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels: pixels.into(),
            downsampled: None,
            tiles: Vec::new(),
        }
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Half-resolution copy using a 2x2 box filter. Odd edges clamp to the last row/column.
    pub fn downsample(&self) -> Self {
        let w = self.width.div_ceil(2).max(1);
        let h = self.height.div_ceil(2).max(1);
        if self.width == 0 || self.height == 0 {
            return Self::solid(0, 0, Color::TRANSPARENT);
        }
        let mut out = Vec::with_capacity(w as usize * h as usize * 4);
        for y in 0..h {
            for x in 0..w {
                let x0 = (2 * x).min(self.width - 1);
                let y0 = (2 * y).min(self.height - 1);
                let x1 = (x0 + 1).min(self.width - 1);
                let y1 = (y0 + 1).min(self.height - 1);
                let samples = [
                    self.pixel(x0, y0),
                    self.pixel(x1, y0),
                    self.pixel(x0, y1),
                    self.pixel(x1, y1),
                ];
                for c in 0..4 {
                    let sum: u32 = samples.iter().map(|s| u32::from(s[c])).sum();
                    #[allow(
                        clippy::cast_possible_truncation,
                        reason = "average of four u8 samples fits in u8"
                    )]
                    out.push(((sum + 2) / 4) as u8);
                }
            }
        }
        Self {
            width: w,
            height: h,
            pixels: out.into(),
            downsampled: None,
            tiles: Vec::new(),
        }
    }

    /// Cut the bitmap into `size x size` tiles. Edge tiles are smaller.
    pub fn slice_tiles(&self, size: u32) -> Vec<BitmapTile> {
        let size = size.max(1);
        let mut tiles = Vec::new();
        for ty in (0..self.height).step_by(size as usize) {
            for tx in (0..self.width).step_by(size as usize) {
                let tw = size.min(self.width - tx);
                let th = size.min(self.height - ty);
                let mut px = Vec::with_capacity(tw as usize * th as usize * 4);
                for y in ty..ty + th {
                    let start = (y as usize * self.width as usize + tx as usize) * 4;
                    px.extend_from_slice(&self.pixels[start..start + tw as usize * 4]);
                }
                tiles.push(BitmapTile {
                    x: tx,
                    y: ty,
                    bitmap: Self {
                        width: tw,
                        height: th,
                        pixels: px.into(),
                        downsampled: None,
                        tiles: Vec::new(),
                    },
                });
            }
        }
        tiles
    }
}

/// A color stop along a gradient.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColorStop {
    /// Position in `0.0..=1.0`.
    pub offset: f32,
    /// Color at this stop.
    pub color: Color,
}

/// Gradient geometry.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GradientKind {
    /// Linear gradient between two points.
    Linear {
        /// Start point.
        start: Point,
        /// End point.
        end: Point,
    },
    /// Radial gradient around a center.
    Radial {
        /// Center point.
        center: Point,
        /// Outer radius.
        radius: f64,
    },
}

/// A computed gradient.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    /// Geometry.
    pub kind: GradientKind,
    /// Color stops sorted by offset.
    pub stops: Vec<ColorStop>,
}

impl Gradient {
    /// Build a gradient, sorting the stops by offset.
    pub fn new(kind: GradientKind, mut stops: Vec<ColorStop>) -> Self {
        stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Self { kind, stops }
    }
}

/// How a pattern tile repeats.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PatternRepeat {
    /// Repeat in both directions.
    #[default]
    Repeat,
    /// Repeat horizontally only.
    RepeatX,
    /// Repeat vertically only.
    RepeatY,
    /// Draw once.
    NoRepeat,
}

/// A compiled repeating pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    /// The rendered tile.
    pub tile: Bitmap,
    /// Repeat mode.
    pub repeat: PatternRepeat,
}

/// A shared paint resource.
#[derive(Clone, Debug, PartialEq)]
pub enum Resource {
    /// Decoded image.
    Bitmap(Bitmap),
    /// Computed gradient.
    Gradient(Gradient),
    /// Compiled pattern.
    Pattern(Pattern),
}

impl Resource {
    /// The bitmap, if this is an image resource.
    pub fn as_bitmap(&self) -> Option<&Bitmap> {
        match self {
            Self::Bitmap(b) => Some(b),
            _ => None,
        }
    }

    /// The bitmap, mutably, if this is an image resource.
    pub fn as_bitmap_mut(&mut self) -> Option<&mut Bitmap> {
        match self {
            Self::Bitmap(b) => Some(b),
            _ => None,
        }
    }
}

/// The engine's resource cache: shared resources keyed by source, owned by scene nodes.
pub type SharedResources = ResourceCache<ResourceKey, Resource, NodeId>;
