// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A scene wired to a scheduler: every edit fires the matching lifecycle hook.

use canopy_index::{Backend, RTree};
use kurbo::Affine;

use crate::config::EngineConfig;
use crate::context::DrawingContext;
use crate::error::FrameError;
use crate::resources::{ResourceKey, SharedResources};
use crate::scene::{NodeFlags, Scene, SceneNode};
use crate::scheduler::{DirtyNotifier, FrameScheduler, FrameStats};
use crate::shape::Shape;
use crate::style::PaintStyle;
use crate::types::NodeId;

/// Owns a [`Scene`] and the [`FrameScheduler`] that draws it.
#[derive(Debug)]
pub struct Canvas<B: Backend = RTree> {
    scene: Scene,
    scheduler: FrameScheduler<B>,
}

impl Canvas<RTree> {
    /// Create an empty canvas with an R-tree index.
    pub fn new(config: EngineConfig, resources: SharedResources) -> Self {
        Self::with_scheduler(FrameScheduler::new(config, resources))
    }
}

impl<B: Backend> Canvas<B> {
    /// Create an empty canvas around an existing scheduler.
    pub fn with_scheduler(scheduler: FrameScheduler<B>) -> Self {
        Self {
            scene: Scene::new(),
            scheduler,
        }
    }

    /// The scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &FrameScheduler<B> {
        &self.scheduler
    }

    /// Handle for requesting redraws from outside a `&mut` borrow.
    pub fn notifier(&self) -> DirtyNotifier {
        self.scheduler.notifier()
    }

    /// Switch between incremental and full-surface redraws.
    pub fn set_immediate_mode(&mut self, immediate: bool) {
        self.scheduler.set_immediate_mode(immediate);
    }

    /// Add a node and mount it.
    pub fn add(&mut self, parent: Option<NodeId>, node: SceneNode) -> NodeId {
        let id = self.scene.insert(parent, node);
        self.scheduler.on_mount(id);
        id
    }

    /// Remove a node and its subtree, unmounting and releasing resources of each.
    pub fn remove(&mut self, id: NodeId) {
        for node in self.scene.remove(id) {
            self.scheduler.on_destroy(node);
        }
    }

    /// Move a node under a new parent.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> bool {
        let moved = self.scene.reparent(id, new_parent);
        if moved {
            self.dirty_subtree(id);
        }
        moved
    }

    /// Replace a node's geometry.
    pub fn set_shape(&mut self, id: NodeId, shape: Shape) -> bool {
        self.edit(id, |n| n.shape = shape)
    }

    /// Replace a node's paint style.
    pub fn set_style(&mut self, id: NodeId, style: PaintStyle) -> bool {
        self.edit(id, |n| n.style = style)
    }

    /// Change a node's z-index.
    pub fn set_z_index(&mut self, id: NodeId, z_index: i32) -> bool {
        self.edit(id, |n| n.z_index = z_index)
    }

    /// Replace a node's local transform. Descendants move with it.
    pub fn set_transform(&mut self, id: NodeId, transform: Affine) -> bool {
        self.update(id, |n| n.transform = transform)
    }

    /// Show or hide a node and its descendants.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> bool {
        self.update(id, |n| n.flags.set(NodeFlags::VISIBLE, visible))
    }

    /// Apply an arbitrary edit, then dirty the node and its descendants.
    pub fn update(&mut self, id: NodeId, f: impl FnOnce(&mut SceneNode)) -> bool {
        let before = self.resource_keys(id);
        let Some(node) = self.scene.get_mut(id) else {
            return false;
        };
        f(node);
        self.release_unused(id, &before);
        self.dirty_subtree(id);
        true
    }

    fn edit(&mut self, id: NodeId, f: impl FnOnce(&mut SceneNode)) -> bool {
        let before = self.resource_keys(id);
        let Some(node) = self.scene.get_mut(id) else {
            return false;
        };
        f(node);
        self.release_unused(id, &before);
        self.scheduler.on_attribute_changed(id);
        true
    }

    fn resource_keys(&self, id: NodeId) -> Vec<ResourceKey> {
        self.scene
            .get(id)
            .map(|n| n.style.resource_keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop `id`'s claim on every key in `before` its style no longer paints with.
    fn release_unused(&self, id: NodeId, before: &[ResourceKey]) {
        if before.is_empty() {
            return;
        }
        let now = self.resource_keys(id);
        for key in before {
            if !now.contains(key) {
                self.scheduler.resources().release(key, id);
            }
        }
    }

    fn dirty_subtree(&mut self, id: NodeId) {
        for node in self.scene.subtree(id) {
            self.scheduler.on_attribute_changed(node);
        }
    }

    /// Run one frame into `ctx`.
    pub fn render(&mut self, ctx: &mut dyn DrawingContext) -> Result<FrameStats, FrameError> {
        self.scheduler.begin_frame()?;
        self.scheduler.end_frame(&self.scene, ctx)
    }

    /// Draw `nodes` into another context, e.g. a pattern tile, without touching frame state.
    pub fn render_offscreen(&self, ctx: &mut dyn DrawingContext, nodes: &[NodeId]) -> FrameStats {
        self.scheduler.render_offscreen(&self.scene, ctx, nodes)
    }
}
