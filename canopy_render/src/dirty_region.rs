// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accumulator for the area that must be cleared and redrawn.

use canopy_index::Aabb;
use kurbo::Rect;

use crate::util::aabb_to_rect;

/// Union of every box that changed since the last flush.
///
/// A single rectangle: spatially separated changes are merged and the gap between
/// them is redrawn too.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DirtyRegion {
    bounds: Option<Aabb>,
}

impl DirtyRegion {
    /// An empty region.
    pub const fn new() -> Self {
        Self { bounds: None }
    }

    /// Fold `aabb` into the region. `None` and empty boxes contribute nothing.
    pub fn include(&mut self, aabb: Option<Aabb>) {
        let Some(aabb) = aabb.filter(|a| !a.is_empty()) else {
            return;
        };
        match &mut self.bounds {
            Some(b) => b.add(&aabb),
            None => self.bounds = Some(aabb),
        }
    }

    /// Union so far.
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// True if nothing has been included.
    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    /// Forget the accumulated area.
    pub fn clear(&mut self) {
        self.bounds = None;
    }

    /// Take the accumulated region, leaving this one empty.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// Snap the region outward to whole pixels, grow the bottom edge by
    /// `baseline_pad`, and clamp to `view`.
    ///
    /// Returns `None` if the region is empty or lies outside the view.
    pub fn to_pixel_rect(&self, view: Rect, baseline_pad: f64) -> Option<Rect> {
        let r = aabb_to_rect(self.bounds?);
        let snapped = Rect::new(
            r.x0.floor(),
            r.y0.floor(),
            r.x1.ceil(),
            r.y1.ceil() + baseline_pad,
        );
        let clamped = snapped.intersect(view);
        (clamped.width() > 0.0 && clamped.height() > 0.0).then_some(clamped)
    }
}
