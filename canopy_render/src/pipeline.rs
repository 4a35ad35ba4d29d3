// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The style/geometry pipeline the scheduler draws through.

use canopy_index::Aabb;
use kurbo::Affine;

use crate::context::DrawingContext;
use crate::error::GeometryError;
use crate::style::PaintStyle;
use crate::types::{NodeId, PaintOrder};

/// Per-node geometry, style, and ordering, provided by the scene graph.
///
/// Passed into [`FrameScheduler::end_frame`](crate::FrameScheduler::end_frame)
/// for the duration of one flush; the scheduler holds no reference to it.
pub trait ScenePipeline {
    /// World-space render bounds (geometry plus stroke, shadow, and filter padding).
    ///
    /// `Ok(None)` means the node currently draws nothing.
    fn compute_render_aabb(&self, node: NodeId) -> Result<Option<Aabb>, GeometryError>;

    /// Local-to-world transform.
    fn world_transform(&self, node: NodeId) -> Affine;

    /// Emit the node's path in local coordinates.
    fn generate_path(&self, node: NodeId, ctx: &mut dyn DrawingContext);

    /// Resolved paint style, or `None` if the node has none.
    fn paint_style(&self, node: NodeId) -> Option<&PaintStyle>;

    /// Sort key for painting.
    fn paint_order(&self, node: NodeId) -> PaintOrder;
}
