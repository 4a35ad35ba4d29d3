// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Closed set of supported shape kinds and their path generators.

use core::f64::consts::TAU;

use kurbo::{BezPath, Circle, Ellipse, Line, PathEl, Point, Rect, RoundedRect, Shape as _};

use crate::context::DrawingContext;

/// Flattening tolerance used when a shape is emitted as path elements.
const TOLERANCE: f64 = 0.1;

/// Geometry of a scene node in its local coordinate space.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Axis-aligned rectangle.
    Rect(Rect),
    /// Rectangle with rounded corners.
    RoundedRect(RoundedRect),
    /// Circle.
    Circle(Circle),
    /// Axis-aligned or rotated ellipse.
    Ellipse(Ellipse),
    /// Single line segment.
    Line(Line),
    /// Open polyline through the points.
    Polyline(Vec<Point>),
    /// Closed polygon through the points.
    Polygon(Vec<Point>),
    /// Arbitrary path.
    Path(BezPath),
}

impl Shape {
    /// Local-space geometry bounds, without stroke or effects. `None` for an empty point list or path.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Rect(r) => Some(r.abs()),
            Self::RoundedRect(r) => Some(r.bounding_box()),
            Self::Circle(c) => Some(c.bounding_box()),
            Self::Ellipse(e) => Some(e.bounding_box()),
            Self::Line(l) => Some(l.bounding_box()),
            Self::Polyline(pts) | Self::Polygon(pts) => points_bounds(pts),
            Self::Path(p) => (!p.elements().is_empty()).then(|| p.bounding_box()),
        }
    }

    /// Emit this shape's outline as path commands on `ctx`.
    ///
    /// Does not call `begin_path`; the draw routine owns path lifetime.
    pub fn build_path(&self, ctx: &mut dyn DrawingContext) {
        match self {
            Self::Rect(r) => ctx.rect(*r),
            Self::Circle(c) => {
                ctx.arc(c.center, c.radius, 0.0, TAU);
                ctx.close_path();
            }
            Self::Line(l) => {
                ctx.move_to(l.p0);
                ctx.line_to(l.p1);
            }
            Self::Polyline(pts) => emit_points(ctx, pts, false),
            Self::Polygon(pts) => emit_points(ctx, pts, true),
            Self::RoundedRect(r) => emit_elements(ctx, r.path_elements(TOLERANCE)),
            Self::Ellipse(e) => emit_elements(ctx, e.path_elements(TOLERANCE)),
            Self::Path(p) => emit_elements(ctx, p.elements().iter().copied()),
        }
    }
}

fn points_bounds(pts: &[Point]) -> Option<Rect> {
    let (first, rest) = pts.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

fn emit_points(ctx: &mut dyn DrawingContext, pts: &[Point], close: bool) {
    let Some((first, rest)) = pts.split_first() else {
        return;
    };
    ctx.move_to(*first);
    for p in rest {
        ctx.line_to(*p);
    }
    if close {
        ctx.close_path();
    }
}

fn emit_elements(ctx: &mut dyn DrawingContext, elements: impl IntoIterator<Item = PathEl>) {
    for el in elements {
        match el {
            PathEl::MoveTo(p) => ctx.move_to(p),
            PathEl::LineTo(p) => ctx.line_to(p),
            PathEl::QuadTo(p1, p2) => ctx.quad_to(p1, p2),
            PathEl::CurveTo(p1, p2, p3) => ctx.bezier_curve_to(p1, p2, p3),
            PathEl::ClosePath => ctx.close_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DrawCall, RecordingContext};

    #[test]
    fn polygon_bounds_and_path() {
        let s = Shape::Polygon(vec![
            Point::new(1.0, 5.0),
            Point::new(4.0, -2.0),
            Point::new(9.0, 3.0),
        ]);
        assert_eq!(s.bounds(), Some(Rect::new(1.0, -2.0, 9.0, 5.0)));
        let mut ctx = RecordingContext::new();
        s.build_path(&mut ctx);
        assert_eq!(ctx.len(), 4);
        assert_eq!(ctx.calls().last(), Some(&DrawCall::ClosePath));
    }

    #[test]
    fn open_shapes_do_not_close() {
        let mut ctx = RecordingContext::new();
        Shape::Polyline(vec![Point::ZERO, Point::new(1.0, 1.0)]).build_path(&mut ctx);
        Shape::Line(Line::new((0.0, 0.0), (2.0, 0.0))).build_path(&mut ctx);
        assert!(!ctx.calls().contains(&DrawCall::ClosePath));
    }

    #[test]
    fn empty_geometry_has_no_bounds() {
        assert_eq!(Shape::Polyline(Vec::new()).bounds(), None);
        assert_eq!(Shape::Path(BezPath::new()).bounds(), None);
    }

    #[test]
    fn circle_uses_arc() {
        let mut ctx = RecordingContext::new();
        let c = Circle::new((5.0, 5.0), 2.0);
        Shape::Circle(c).build_path(&mut ctx);
        assert!(matches!(ctx.calls()[0], DrawCall::Arc { radius, .. } if radius == 2.0));
        assert_eq!(
            Shape::Circle(c).bounds(),
            Some(Rect::new(3.0, 3.0, 7.0, 7.0))
        );
    }

    #[test]
    fn curves_are_forwarded() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.quad_to((5.0, 10.0), (10.0, 0.0));
        path.curve_to((12.0, 2.0), (14.0, 2.0), (16.0, 0.0));
        let mut ctx = RecordingContext::new();
        Shape::Path(path).build_path(&mut ctx);
        assert!(matches!(ctx.calls()[1], DrawCall::QuadTo(..)));
        assert!(matches!(ctx.calls()[2], DrawCall::CurveTo(..)));
    }
}
