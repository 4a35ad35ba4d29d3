// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-region frame scheduler.
//!
//! ## Frame lifecycle
//!
//! `Idle → Accumulating → Flushing → Idle`
//!
//! - [`FrameScheduler::begin_frame`] starts accumulating and folds in deferred
//!   notifications: nodes reported through a [`DirtyNotifier`] and owners of
//!   resources that finished loading.
//! - [`FrameScheduler::notify_dirty`] marks a mounted node dirty and queues it
//!   once, however many times it is called.
//! - [`FrameScheduler::end_frame`] recomputes the render bounds of every queued
//!   node, keeps the spatial index in sync (remove, then reinsert), clears and
//!   clips the union of old and new bounds, then redraws every indexed node that
//!   overlaps it in paint order.
//!
//! A frame with nothing queued and nothing unmounted makes no drawing-context
//! calls at all.
//!
//! ## Invariants
//!
//! - A mounted node with render bounds has exactly one index entry; unmounted
//!   and invisible nodes have none.
//! - Index entries are removed in [`FrameScheduler::on_unmount`], so searches
//!   never yield a node the scheduler no longer tracks.
//! - Every property write goes through the [`StateCache`], which is reset at the
//!   start and end of each pass.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use canopy_index::{Aabb, Backend, RTree, SpatialIndex};
use kurbo::Rect;

use crate::config::EngineConfig;
use crate::context::{Brush, DrawingContext};
use crate::dirty_region::DirtyRegion;
use crate::error::FrameError;
use crate::pipeline::ScenePipeline;
use crate::render_state::{RecordFlags, RenderRecord};
use crate::resources::SharedResources;
use crate::state_cache::{ContextState, StateCache};
use crate::style::{Color, Paint};
use crate::types::NodeId;
use crate::util::rect_to_aabb;

/// Where the scheduler is in its frame state machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum FramePhase {
    /// Between frames.
    #[default]
    Idle,
    /// After `begin_frame`, collecting dirty nodes.
    Accumulating,
    /// Inside `end_frame`.
    Flushing,
}

/// Clonable handle for requesting redraws from outside the scheduler's borrow,
/// for example from a draw callback or an async completion.
///
/// Notifications are applied at the next [`FrameScheduler::begin_frame`], never mid-flush.
#[derive(Clone, Debug, Default)]
pub struct DirtyNotifier(Rc<RefCell<Vec<NodeId>>>);

impl DirtyNotifier {
    /// Request a redraw of `node` in the next frame.
    pub fn notify(&self, node: NodeId) {
        self.0.borrow_mut().push(node);
    }

    /// Number of notifications waiting.
    pub fn pending(&self) -> usize {
        self.0.borrow().len()
    }

    fn drain(&self) -> Vec<NodeId> {
        core::mem::take(&mut *self.0.borrow_mut())
    }
}

/// How a frame was rendered.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameMode {
    /// Nothing changed; the context was not touched.
    Skipped,
    /// Only the dirty region was redrawn.
    Incremental,
    /// The whole surface was redrawn.
    Immediate,
    /// A sub-render pass outside the frame cycle.
    Offscreen,
}

/// Summary of one flush.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameStats {
    /// Frame number (`0` for offscreen passes).
    pub frame: u64,
    /// How the frame was rendered.
    pub mode: FrameMode,
    /// Dirty nodes whose bounds were recomputed.
    pub dirty_nodes: usize,
    /// The cleared and clipped rectangle, if anything was drawn.
    pub region: Option<Rect>,
    /// Nodes drawn, in paint order.
    pub drawn: Vec<NodeId>,
    /// Nodes whose bounds could not be computed; they stay dirty.
    pub failed: Vec<NodeId>,
    /// Drawing-context property writes issued.
    pub state_mutations: u64,
}

impl FrameStats {
    fn new(frame: u64, mode: FrameMode) -> Self {
        Self {
            frame,
            mode,
            dirty_nodes: 0,
            region: None,
            drawn: Vec::new(),
            failed: Vec::new(),
            state_mutations: 0,
        }
    }
}

/// Result of recomputing the bounds of the queued nodes.
struct Sync {
    region: DirtyRegion,
    processed: Vec<NodeId>,
    failed: Vec<NodeId>,
}

/// Incremental frame scheduler over a spatial backend `B`.
#[derive(Debug)]
pub struct FrameScheduler<B: Backend = RTree> {
    config: EngineConfig,
    phase: FramePhase,
    frame: u64,
    records: HashMap<NodeId, RenderRecord>,
    queue: Vec<NodeId>,
    pending_damage: DirtyRegion,
    index: SpatialIndex<NodeId, B>,
    state: StateCache,
    resources: SharedResources,
    notifier: DirtyNotifier,
}

impl FrameScheduler<RTree> {
    /// Create a scheduler backed by an R-tree.
    pub fn new(config: EngineConfig, resources: SharedResources) -> Self {
        Self::with_backend(config, resources, RTree::default())
    }
}

impl<B: Backend> FrameScheduler<B> {
    /// Create a scheduler over an explicit spatial backend.
    pub fn with_backend(config: EngineConfig, resources: SharedResources, backend: B) -> Self {
        Self {
            config,
            phase: FramePhase::Idle,
            frame: 0,
            records: HashMap::new(),
            queue: Vec::new(),
            pending_damage: DirtyRegion::new(),
            index: SpatialIndex::with_backend(backend),
            state: StateCache::new(),
            resources,
            notifier: DirtyNotifier::default(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Number of frames begun so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared resource cache draws resolve paints through.
    pub fn resources(&self) -> &SharedResources {
        &self.resources
    }

    /// A handle for deferred dirty notifications.
    pub fn notifier(&self) -> DirtyNotifier {
        self.notifier.clone()
    }

    /// Switch between incremental and full-surface redraws.
    pub fn set_immediate_mode(&mut self, immediate: bool) {
        self.config.immediate_mode = immediate;
    }

    /// True if every frame redraws the whole surface.
    pub fn immediate_mode(&self) -> bool {
        self.config.immediate_mode
    }

    /// True if `node` is mounted.
    pub fn is_mounted(&self, node: NodeId) -> bool {
        self.records.contains_key(&node)
    }

    /// Render state of a mounted node.
    pub fn record(&self, node: NodeId) -> Option<&RenderRecord> {
        self.records.get(&node)
    }

    /// Number of mounted nodes.
    pub fn mounted_len(&self) -> usize {
        self.records.len()
    }

    /// Number of nodes with an index entry.
    pub fn indexed_len(&self) -> usize {
        self.index.len()
    }

    /// Indexed nodes whose render bounds intersect `rect`, in no particular order.
    pub fn search(&self, rect: Rect) -> impl Iterator<Item = NodeId> + '_ {
        self.index.search(rect_to_aabb(rect)).map(|(_, node)| node)
    }

    /// Start tracking `node`. It is drawn in the next flush.
    pub fn on_mount(&mut self, node: NodeId) {
        if self.records.contains_key(&node) {
            log::debug!("{node:?} is already mounted");
            return;
        }
        self.records.insert(node, RenderRecord::default());
        self.mark_dirty(node);
    }

    /// Stop tracking `node`, removing its index entry.
    ///
    /// The area it was last drawn in is cleared by the next flush.
    pub fn on_unmount(&mut self, node: NodeId) {
        let Some(record) = self.records.remove(&node) else {
            return;
        };
        if let Some(key) = record.index_key {
            self.index.remove(key);
        }
        self.pending_damage.include(record.last_drawn_aabb);
    }

    /// Unmount `node` and drop every resource reference it holds.
    pub fn on_destroy(&mut self, node: NodeId) {
        self.on_unmount(node);
        self.resources.release_all(node);
    }

    /// Geometry or style of `node` changed.
    pub fn on_attribute_changed(&mut self, node: NodeId) {
        self.mark_dirty(node);
    }

    /// Mark `node` dirty. Idempotent within a frame; ignored for unmounted nodes.
    pub fn notify_dirty(&mut self, node: NodeId) {
        self.mark_dirty(node);
    }

    fn mark_dirty(&mut self, node: NodeId) -> bool {
        let Some(record) = self.records.get_mut(&node) else {
            log::trace!("ignoring dirty notification for unmounted {node:?}");
            return false;
        };
        record.flags.insert(RecordFlags::DIRTY);
        if !record.flags.contains(RecordFlags::QUEUED) {
            record.flags.insert(RecordFlags::QUEUED);
            self.queue.push(node);
        }
        true
    }

    /// Start a frame and apply deferred notifications.
    pub fn begin_frame(&mut self) -> Result<(), FrameError> {
        if self.phase != FramePhase::Idle {
            return Err(FrameError::AlreadyAccumulating(self.frame));
        }
        self.phase = FramePhase::Accumulating;
        self.frame += 1;

        self.resources.drive();
        for node in self.resources.take_ready_owners() {
            self.mark_dirty(node);
        }
        for node in self.notifier.drain() {
            self.mark_dirty(node);
        }
        Ok(())
    }

    /// Flush the frame into `ctx`.
    pub fn end_frame<P: ScenePipeline + ?Sized>(
        &mut self,
        pipeline: &P,
        ctx: &mut dyn DrawingContext,
    ) -> Result<FrameStats, FrameError> {
        if self.phase != FramePhase::Accumulating {
            return Err(FrameError::NotAccumulating);
        }
        self.phase = FramePhase::Flushing;
        let before = self.state.mutations();
        let mut stats = if self.config.immediate_mode {
            self.flush_immediate(pipeline, ctx)
        } else {
            self.flush_incremental(pipeline, ctx)
        };
        stats.state_mutations = self.state.mutations() - before;
        self.phase = FramePhase::Idle;
        log::debug!(
            "frame {}: {:?}, {} dirty, {} drawn, {} failed, region {:?}",
            stats.frame,
            stats.mode,
            stats.dirty_nodes,
            stats.drawn.len(),
            stats.failed.len(),
            stats.region
        );
        Ok(stats)
    }

    fn flush_incremental<P: ScenePipeline + ?Sized>(
        &mut self,
        pipeline: &P,
        ctx: &mut dyn DrawingContext,
    ) -> FrameStats {
        if self.queue.is_empty() && self.pending_damage.is_empty() {
            return FrameStats::new(self.frame, FrameMode::Skipped);
        }
        let sync = self.sync_queued(pipeline);
        let mut stats = FrameStats::new(self.frame, FrameMode::Incremental);
        stats.dirty_nodes = sync.processed.len();

        if let Some(rect) = sync
            .region
            .to_pixel_rect(self.config.view, self.config.baseline_padding)
        {
            ctx.save();
            ctx.clear_rect(rect);
            ctx.begin_path();
            ctx.rect(rect);
            ctx.clip();

            let mut hits: Vec<NodeId> = self.search(rect).collect();
            sort_by_paint_order(&mut hits, pipeline);
            self.draw_pass(pipeline, ctx, &hits);
            ctx.restore();

            stats.region = Some(rect);
            stats.drawn = hits;
        }
        self.finish(sync.processed, &sync.failed);
        stats.failed = sync.failed;
        stats
    }

    fn flush_immediate<P: ScenePipeline + ?Sized>(
        &mut self,
        pipeline: &P,
        ctx: &mut dyn DrawingContext,
    ) -> FrameStats {
        let sync = self.sync_queued(pipeline);
        let mut stats = FrameStats::new(self.frame, FrameMode::Immediate);
        stats.dirty_nodes = sync.processed.len();

        let view = self.config.view;
        ctx.save();
        ctx.clear_rect(view);
        let mut nodes: Vec<NodeId> = self
            .records
            .iter()
            .filter(|(_, r)| r.render_aabb.is_some())
            .map(|(node, _)| *node)
            .collect();
        sort_by_paint_order(&mut nodes, pipeline);
        self.draw_pass(pipeline, ctx, &nodes);
        ctx.restore();

        stats.region = Some(view);
        stats.drawn = nodes;
        self.finish(sync.processed, &sync.failed);
        stats.failed = sync.failed;
        stats
    }

    /// Recompute bounds of queued nodes, reindex them, and fold old and new bounds into a region.
    fn sync_queued<P: ScenePipeline + ?Sized>(&mut self, pipeline: &P) -> Sync {
        let mut region = self.pending_damage.take();
        let mut processed = Vec::new();
        let mut failed = Vec::new();
        for node in core::mem::take(&mut self.queue) {
            let Some(record) = self.records.get_mut(&node) else {
                continue;
            };
            // A node unmounted and remounted within one frame can appear twice.
            if !record.flags.contains(RecordFlags::QUEUED) {
                continue;
            }
            record.flags.remove(RecordFlags::QUEUED);
            match pipeline.compute_render_aabb(node) {
                Ok(aabb) => {
                    reindex(&mut self.index, record, node, aabb);
                    region.include(record.last_drawn_aabb);
                    region.include(aabb);
                    processed.push(node);
                }
                Err(err) => {
                    log::warn!("render bounds of {node:?} unavailable, retrying next frame: {err}");
                    reindex(&mut self.index, record, node, None);
                    // Treated as invisible: whatever it drew last must go.
                    region.include(record.last_drawn_aabb);
                    failed.push(node);
                }
            }
        }
        Sync {
            region,
            processed,
            failed,
        }
    }

    fn finish(&mut self, processed: Vec<NodeId>, failed: &[NodeId]) {
        for node in processed {
            if let Some(record) = self.records.get_mut(&node) {
                record.last_drawn_aabb = record.render_aabb;
                record.flags.remove(RecordFlags::DIRTY);
            }
        }
        for node in failed {
            if let Some(record) = self.records.get_mut(node) {
                record.last_drawn_aabb = None;
            }
            self.mark_dirty(*node);
        }
    }

    fn draw_pass<P: ScenePipeline + ?Sized>(
        &mut self,
        pipeline: &P,
        ctx: &mut dyn DrawingContext,
        nodes: &[NodeId],
    ) {
        self.state.reset();
        for node in nodes {
            draw_node(pipeline, ctx, &mut self.state, &self.resources, *node);
        }
        self.state.reset();
    }

    /// Draw `nodes` into `ctx` outside the frame cycle, e.g. to render a pattern tile.
    ///
    /// Uses its own state baseline and leaves render records untouched.
    pub fn render_offscreen<P: ScenePipeline + ?Sized>(
        &self,
        pipeline: &P,
        ctx: &mut dyn DrawingContext,
        nodes: &[NodeId],
    ) -> FrameStats {
        let mut state = StateCache::new();
        let mut order = nodes.to_vec();
        sort_by_paint_order(&mut order, pipeline);
        ctx.save();
        for node in &order {
            draw_node(pipeline, ctx, &mut state, &self.resources, *node);
        }
        ctx.restore();
        let mut stats = FrameStats::new(0, FrameMode::Offscreen);
        stats.drawn = order;
        stats.state_mutations = state.mutations();
        stats
    }
}

/// Replace a node's index entry with one for `aabb` (or none).
fn reindex<B: Backend>(
    index: &mut SpatialIndex<NodeId, B>,
    record: &mut RenderRecord,
    node: NodeId,
    aabb: Option<Aabb>,
) {
    if record.index_key.is_some() && record.render_aabb == aabb {
        return;
    }
    if let Some(key) = record.index_key.take() {
        index.remove(key);
    }
    record.render_aabb = aabb;
    record.index_key = aabb.map(|a| index.insert(a, node));
}

/// Stable sort by z-index, then document order.
pub fn sort_by_paint_order<P: ScenePipeline + ?Sized>(nodes: &mut [NodeId], pipeline: &P) {
    nodes.sort_by_key(|n| pipeline.paint_order(*n));
}

fn resolve_brush(paint: &Paint, node: NodeId, resources: &SharedResources) -> Option<Brush> {
    match paint {
        Paint::Solid(color) => Some(Brush::Solid(*color)),
        Paint::Resource(key) => match resources.request(key, node) {
            Ok(Some(handle)) => Some(Brush::Shared(handle)),
            Ok(None) => {
                log::trace!("{key} not ready for {node:?}");
                None
            }
            Err(err) => {
                log::warn!("{key} unavailable for {node:?}: {err}");
                None
            }
        },
    }
}

/// Draw one node. Shared by every pass kind.
fn draw_node<P: ScenePipeline + ?Sized>(
    pipeline: &P,
    ctx: &mut dyn DrawingContext,
    state: &mut StateCache,
    resources: &SharedResources,
    node: NodeId,
) {
    let Some(style) = pipeline.paint_style(node) else {
        return;
    };
    if !style.is_visible() {
        return;
    }
    log::trace!("drawing {node:?}");

    ctx.set_transform(pipeline.world_transform(node));
    ctx.begin_path();
    pipeline.generate_path(node, ctx);

    state.update(ctx, ContextState::GlobalAlpha(style.opacity));
    state.update(ctx, ContextState::Filter(style.filter));
    let (shadow_color, shadow_blur, shadow_offset) = match style.shadow {
        Some(s) => (s.color, s.blur, s.offset),
        None => (Color::TRANSPARENT, 0.0, kurbo::Vec2::ZERO),
    };
    state.update(ctx, ContextState::ShadowColor(shadow_color));
    state.update(ctx, ContextState::ShadowBlur(shadow_blur));
    state.update(ctx, ContextState::ShadowOffset(shadow_offset));

    let mut filled = false;
    if let Some(brush) = style
        .fill
        .as_ref()
        .and_then(|p| resolve_brush(p, node, resources))
    {
        state.update(ctx, ContextState::FillStyle(brush));
        ctx.fill();
        filled = true;
    }

    if style.line_width <= 0.0 {
        return;
    }
    let Some(brush) = style
        .stroke
        .as_ref()
        .and_then(|p| resolve_brush(p, node, resources))
    else {
        return;
    };
    // The fill already cast the shadow.
    let restore_shadow = (filled && style.shadow.is_some())
        .then(|| state.update(ctx, ContextState::ShadowColor(Color::TRANSPARENT)));
    state.update(ctx, ContextState::StrokeStyle(brush));
    state.update(ctx, ContextState::LineWidth(style.line_width));
    state.update(ctx, ContextState::LineDash(style.line_dash.clone()));
    state.update(ctx, ContextState::LineCap(style.line_cap));
    state.update(ctx, ContextState::LineJoin(style.line_join));
    state.update(ctx, ContextState::MiterLimit(style.miter_limit));
    ctx.stroke();
    if let Some(previous) = restore_shadow {
        state.update(ctx, previous);
    }
}
