// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned bounding box in center/half-extents form.

/// Axis-aligned bounding box stored as a center and non-negative half extents.
///
/// Degenerate boxes (a half extent of zero) are valid and considered empty.
/// Inputs are assumed to be finite; NaN coordinates are a caller error and are not checked.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    /// Center point `[x, y]`.
    pub center: [f64; 2],
    /// Half width and half height. Expected to be `>= 0` on both axes.
    pub half_extents: [f64; 2],
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// A zero-sized box at the origin.
    pub const EMPTY: Self = Self {
        center: [0.0, 0.0],
        half_extents: [0.0, 0.0],
    };

    /// Create a box from its center and half extents.
    pub const fn new(center: [f64; 2], half_extents: [f64; 2]) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Create a box from its min and max corners.
    pub fn from_min_max(min: [f64; 2], max: [f64; 2]) -> Self {
        let mut out = Self::EMPTY;
        out.set_min_max(min, max);
        out
    }

    /// Create a box from an origin and a size.
    pub fn from_xywh(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self::from_min_max([x, y], [x + w, y + h])
    }

    /// Replace the extents of this box with the given corners.
    pub fn set_min_max(&mut self, min: [f64; 2], max: [f64; 2]) {
        self.center = [0.5 * (min[0] + max[0]), 0.5 * (min[1] + max[1])];
        self.half_extents = [0.5 * (max[0] - min[0]), 0.5 * (max[1] - min[1])];
    }

    /// Minimum corner (`center - half_extents`).
    #[inline]
    pub fn min(&self) -> [f64; 2] {
        [
            self.center[0] - self.half_extents[0],
            self.center[1] - self.half_extents[1],
        ]
    }

    /// Maximum corner (`center + half_extents`).
    #[inline]
    pub fn max(&self) -> [f64; 2] {
        [
            self.center[0] + self.half_extents[0],
            self.center[1] + self.half_extents[1],
        ]
    }

    /// Full width.
    #[inline]
    pub fn width(&self) -> f64 {
        2.0 * self.half_extents[0]
    }

    /// Full height.
    #[inline]
    pub fn height(&self) -> f64 {
        2.0 * self.half_extents[1]
    }

    /// True if the box has no area.
    pub fn is_empty(&self) -> bool {
        !(self.half_extents[0] > 0.0 && self.half_extents[1] > 0.0)
    }

    /// Grow this box in place so it also covers `other`.
    pub fn add(&mut self, other: &Self) {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        self.set_min_max(
            [a_min[0].min(b_min[0]), a_min[1].min(b_min[1])],
            [a_max[0].max(b_max[0]), a_max[1].max(b_max[1])],
        );
    }

    /// The union of two boxes.
    pub fn union(mut self, other: &Self) -> Self {
        self.add(other);
        self
    }

    /// Separating-axis overlap test. Boxes that only touch along an edge intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min[0] <= b_max[0] && b_min[0] <= a_max[0] && a_min[1] <= b_max[1] && b_min[1] <= a_max[1]
    }

    /// True if `other` lies entirely inside this box.
    pub fn contains(&self, other: &Self) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min[0] <= b_min[0] && a_min[1] <= b_min[1] && b_max[0] <= a_max[0] && b_max[1] <= a_max[1]
    }

    /// True if the point lies inside or on the boundary of the box.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let (min, max) = (self.min(), self.max());
        min[0] <= x && x <= max[0] && min[1] <= y && y <= max[1]
    }
}

/// Union of two optional boxes, skipping `None` operands.
pub fn union_opt(a: Option<Aabb>, b: Option<Aabb>) -> Option<Aabb> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(&b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_max_roundtrip_through_center_form() {
        let b = Aabb::from_min_max([10.0, 20.0], [30.0, 60.0]);
        assert_eq!(b.center, [20.0, 40.0]);
        assert_eq!(b.half_extents, [10.0, 20.0]);
        assert_eq!(b.min(), [10.0, 20.0]);
        assert_eq!(b.max(), [30.0, 60.0]);
    }

    #[test]
    fn add_expands_in_place() {
        let mut a = Aabb::from_xywh(0.0, 0.0, 10.0, 10.0);
        a.add(&Aabb::from_xywh(20.0, -5.0, 5.0, 5.0));
        assert_eq!(a.min(), [0.0, -5.0]);
        assert_eq!(a.max(), [25.0, 10.0]);
    }

    #[test]
    fn intersects_is_inclusive_on_edges() {
        let a = Aabb::from_xywh(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Aabb::from_xywh(10.0, 0.0, 5.0, 5.0)));
        assert!(!a.intersects(&Aabb::from_xywh(10.5, 0.0, 5.0, 5.0)));
        assert!(!a.intersects(&Aabb::from_xywh(0.0, 11.0, 5.0, 5.0)));
    }

    #[test]
    fn degenerate_boxes_are_empty() {
        assert!(Aabb::EMPTY.is_empty());
        assert!(Aabb::from_xywh(5.0, 5.0, 0.0, 10.0).is_empty());
        assert!(!Aabb::from_xywh(5.0, 5.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn union_opt_skips_none() {
        let a = Aabb::from_xywh(0.0, 0.0, 1.0, 1.0);
        assert_eq!(union_opt(None, None), None);
        assert_eq!(union_opt(Some(a), None), Some(a));
        assert_eq!(union_opt(None, Some(a)), Some(a));
        let u = union_opt(Some(a), Some(Aabb::from_xywh(3.0, 3.0, 1.0, 1.0))).unwrap();
        assert!(u.contains(&a));
        assert_eq!(u.max(), [4.0, 4.0]);
    }
}
