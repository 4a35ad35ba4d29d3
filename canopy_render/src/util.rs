// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions between kurbo rectangles and index boxes.

use canopy_index::Aabb;
use kurbo::Rect;

pub(crate) fn rect_to_aabb(r: Rect) -> Aabb {
    let r = r.abs();
    Aabb::from_min_max([r.x0, r.y0], [r.x1, r.y1])
}

pub(crate) fn aabb_to_rect(a: Aabb) -> Rect {
    let (min, max) = (a.min(), a.max());
    Rect::new(min[0], min[1], max[0], max[1])
}

pub(crate) fn rect_is_finite(r: Rect) -> bool {
    r.x0.is_finite() && r.y0.is_finite() && r.x1.is_finite() && r.y1.is_finite()
}
