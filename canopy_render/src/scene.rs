// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained scene graph that feeds the scheduler.

use kurbo::Affine;

use canopy_index::Aabb;

use crate::context::DrawingContext;
use crate::error::GeometryError;
use crate::pipeline::ScenePipeline;
use crate::shape::Shape;
use crate::style::PaintStyle;
use crate::types::{NodeId, PaintOrder};
use crate::util::{rect_is_finite, rect_to_aabb};

bitflags::bitflags! {
    /// Node flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node and its descendants are drawn.
        const VISIBLE = 0b0000_0001;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// Content of one scene node.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    /// Geometry in local space.
    pub shape: Shape,
    /// Resolved paint style.
    pub style: PaintStyle,
    /// Transform relative to the parent.
    pub transform: Affine,
    /// Stacking order. Higher is drawn on top; ties fall back to insertion order.
    pub z_index: i32,
    /// Visibility flags.
    pub flags: NodeFlags,
}

impl SceneNode {
    /// A visible node at the parent's origin.
    pub fn new(shape: Shape, style: PaintStyle) -> Self {
        Self {
            shape,
            style,
            transform: Affine::IDENTITY,
            z_index: 0,
            flags: NodeFlags::default(),
        }
    }

    /// Set the local transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    /// Set the z-index.
    #[must_use]
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    document_order: u64,
    node: SceneNode,
}

/// Generational store of scene nodes with parent/child links.
#[derive(Default)]
pub struct Scene {
    slots: Vec<Option<Slot>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    next_order: u64,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scene")
            .field("nodes_total", &self.slots.len())
            .field("nodes_alive", &self.len())
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `node` under `parent`, or as a root if `parent` is `None` or stale.
    pub fn insert(&mut self, parent: Option<NodeId>, node: SceneNode) -> NodeId {
        let document_order = self.next_order;
        self.next_order += 1;
        let parent = parent.filter(|p| self.is_alive(*p));
        let slot = |generation| Slot {
            generation,
            parent,
            children: Vec::new(),
            document_order,
            node,
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(slot(generation));
            (idx, generation)
        } else {
            self.slots.push(Some(slot(1)));
            self.generations.push(1);
            (self.slots.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices."
        )]
        let id = NodeId::new(idx as u32, generation);
        if let Some(p) = parent.and_then(|p| self.slot_mut(p)) {
            p.children.push(id);
        }
        id
    }

    /// Remove `id` and its subtree. Returns the removed ids, children before parents.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        if !self.is_alive(id) {
            return Vec::new();
        }
        if let Some(parent) = self.parent(id) {
            if let Some(p) = self.slot_mut(parent) {
                p.children.retain(|c| *c != id);
            }
        }
        let mut removed = self.subtree(id);
        removed.reverse();
        for n in &removed {
            self.slots[n.idx()] = None;
            self.free_list.push(n.idx());
        }
        removed
    }

    /// Move `id` under `new_parent` (or to the root). Refuses to create a cycle.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        if let Some(p) = new_parent {
            if !self.is_alive(p) || self.ancestors(p).any(|a| a == id) {
                return false;
            }
        }
        if let Some(old) = self.parent(id) {
            if let Some(p) = self.slot_mut(old) {
                p.children.retain(|c| *c != id);
            }
        }
        if let Some(p) = new_parent.and_then(|p| self.slot_mut(p)) {
            p.children.push(id);
        }
        if let Some(s) = self.slot_mut(id) {
            s.parent = new_parent;
        }
        true
    }

    /// True if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    /// Node content.
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.slot(id).map(|s| &s.node)
    }

    /// Node content, mutably. Callers must report the change to the scheduler.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.slot_mut(id).map(|s| &mut s.node)
    }

    /// Parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id)?.parent
    }

    /// Children of `id` in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map_or(&[], |s| &s.children)
    }

    /// `id` and all its descendants, parents before children.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if !self.is_alive(n) {
                continue;
            }
            out.push(n);
            stack.extend(self.children(n).iter().rev());
        }
        out
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// True if the scene has no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live node ids in slot order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices."
            )]
            s.as_ref().map(|s| NodeId::new(i as u32, s.generation))
        })
    }

    /// True if `id` and all its ancestors are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.is_alive(id)
            && core::iter::once(id)
                .chain(self.ancestors(id))
                .all(|n| self.get(n).is_some_and(|s| s.flags.contains(NodeFlags::VISIBLE)))
    }

    fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        core::iter::successors(self.parent(id), |p| self.parent(*p))
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        let s = self.slots.get(id.idx())?.as_ref()?;
        (s.generation == id.1).then_some(s)
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        let s = self.slots.get_mut(id.idx())?.as_mut()?;
        (s.generation == id.1).then_some(s)
    }
}

impl ScenePipeline for Scene {
    fn compute_render_aabb(&self, node: NodeId) -> Result<Option<Aabb>, GeometryError> {
        let n = self.get(node).ok_or(GeometryError::UnknownNode(node))?;
        if !self.is_visible(node) || !n.style.is_visible() {
            return Ok(None);
        }
        let Some(bounds) = n.shape.bounds() else {
            return Ok(None);
        };
        let world = n.style.render_bounds(bounds, self.world_transform(node));
        if !rect_is_finite(world) {
            return Err(GeometryError::NonFinite(node));
        }
        Ok(Some(rect_to_aabb(world)))
    }

    fn world_transform(&self, node: NodeId) -> Affine {
        let mut tf = Affine::IDENTITY;
        let mut cur = Some(node);
        while let Some(id) = cur {
            let Some(slot) = self.slot(id) else {
                break;
            };
            tf = slot.node.transform * tf;
            cur = slot.parent;
        }
        tf
    }

    fn generate_path(&self, node: NodeId, ctx: &mut dyn DrawingContext) {
        if let Some(n) = self.get(node) {
            n.shape.build_path(ctx);
        }
    }

    fn paint_style(&self, node: NodeId) -> Option<&PaintStyle> {
        self.get(node).map(|n| &n.style)
    }

    fn paint_order(&self, node: NodeId) -> PaintOrder {
        self.slot(node)
            .map(|s| PaintOrder::new(s.node.z_index, s.document_order))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;
    use kurbo::{Rect, Vec2};

    fn rect_node(r: Rect) -> SceneNode {
        SceneNode::new(Shape::Rect(r), PaintStyle::filled(Color::BLACK))
    }

    #[test]
    fn world_transform_composes_parent_first() {
        let mut scene = Scene::new();
        let root = scene.insert(
            None,
            rect_node(Rect::new(0.0, 0.0, 10.0, 10.0)).with_transform(Affine::translate((100.0, 0.0))),
        );
        let child = scene.insert(
            Some(root),
            rect_node(Rect::new(0.0, 0.0, 10.0, 10.0)).with_transform(Affine::scale(2.0)),
        );
        let aabb = scene.compute_render_aabb(child).unwrap().unwrap();
        assert_eq!(aabb.min(), [100.0, 0.0]);
        assert_eq!(aabb.max(), [120.0, 20.0]);
        assert_eq!(
            scene.world_transform(child) * kurbo::Point::new(1.0, 1.0),
            kurbo::Point::new(102.0, 2.0)
        );
    }

    #[test]
    fn remove_returns_subtree_and_stales_ids() {
        let mut scene = Scene::new();
        let a = scene.insert(None, rect_node(Rect::ZERO));
        let b = scene.insert(Some(a), rect_node(Rect::ZERO));
        let c = scene.insert(Some(b), rect_node(Rect::ZERO));
        let d = scene.insert(None, rect_node(Rect::ZERO));
        assert_eq!(scene.subtree(a), [a, b, c]);

        let removed = scene.remove(a);
        assert_eq!(removed, [c, b, a]);
        assert!(!scene.is_alive(b));
        assert_eq!(scene.len(), 1);

        let e = scene.insert(None, rect_node(Rect::ZERO));
        assert!(scene.is_alive(e) && scene.is_alive(d));
        assert!(!scene.is_alive(a), "reused slot must not revive the old id");
    }

    #[test]
    fn removing_a_deep_chain_frees_every_node() {
        let mut scene = Scene::new();
        let root = scene.insert(None, rect_node(Rect::ZERO));
        let mut tip = root;
        for _ in 0..100_000 {
            tip = scene.insert(Some(tip), rect_node(Rect::ZERO));
        }
        let removed = scene.remove(root);
        assert_eq!(removed.len(), 100_001);
        assert_eq!(removed.first(), Some(&tip));
        assert_eq!(removed.last(), Some(&root));
        assert!(scene.is_empty());
    }

    #[test]
    fn hidden_ancestors_hide_descendants() {
        let mut scene = Scene::new();
        let a = scene.insert(None, rect_node(Rect::new(0.0, 0.0, 5.0, 5.0)));
        let b = scene.insert(Some(a), rect_node(Rect::new(0.0, 0.0, 5.0, 5.0)));
        scene.get_mut(a).unwrap().flags = NodeFlags::empty();
        assert!(!scene.is_visible(b));
        assert_eq!(scene.compute_render_aabb(b), Ok(None));
    }

    #[test]
    fn non_finite_geometry_is_an_error() {
        let mut scene = Scene::new();
        let a = scene.insert(
            None,
            rect_node(Rect::new(0.0, 0.0, 5.0, 5.0))
                .with_transform(Affine::translate(Vec2::new(f64::NAN, 0.0))),
        );
        assert_eq!(
            scene.compute_render_aabb(a),
            Err(GeometryError::NonFinite(a))
        );
        let stale = NodeId::new(99, 1);
        assert_eq!(
            scene.compute_render_aabb(stale),
            Err(GeometryError::UnknownNode(stale))
        );
    }

    #[test]
    fn paint_order_uses_insertion_order_for_ties() {
        let mut scene = Scene::new();
        let a = scene.insert(None, rect_node(Rect::ZERO));
        let b = scene.insert(None, rect_node(Rect::ZERO).with_z_index(-1));
        let c = scene.insert(None, rect_node(Rect::ZERO));
        let mut ids = vec![c, a, b];
        crate::scheduler::sort_by_paint_order(&mut ids, &scene);
        assert_eq!(ids, [b, a, c]);
    }

    #[test]
    fn reparent_refuses_cycles() {
        let mut scene = Scene::new();
        let a = scene.insert(None, rect_node(Rect::ZERO));
        let b = scene.insert(Some(a), rect_node(Rect::ZERO));
        assert!(!scene.reparent(a, Some(b)));
        assert!(scene.reparent(b, None));
        assert_eq!(scene.parent(b), None);
        assert!(scene.children(a).is_empty());
    }
}
