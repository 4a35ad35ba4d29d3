// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node render bookkeeping owned by the scheduler.

use canopy_index::{Aabb, Key};

bitflags::bitflags! {
    /// Scheduling flags for a node.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct RecordFlags: u8 {
        /// Geometry or paint changed since the node was last drawn.
        const DIRTY = 1 << 0;
        /// The node is in the dirty queue.
        const QUEUED = 1 << 1;
    }
}

/// Render state of one mounted node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderRecord {
    pub(crate) flags: RecordFlags,
    /// Bounds from the latest successful computation.
    pub(crate) render_aabb: Option<Aabb>,
    /// Bounds the node was last drawn with.
    pub(crate) last_drawn_aabb: Option<Aabb>,
    /// The node's spatial index entry, present iff `render_aabb` is.
    pub(crate) index_key: Option<Key>,
}

impl RenderRecord {
    /// True if the node changed since it was last drawn.
    pub fn is_dirty(&self) -> bool {
        self.flags.contains(RecordFlags::DIRTY)
    }

    /// True if the node is waiting in the dirty queue.
    pub fn is_queued(&self) -> bool {
        self.flags.contains(RecordFlags::QUEUED)
    }

    /// Current render bounds, if visible.
    pub fn render_aabb(&self) -> Option<Aabb> {
        self.render_aabb
    }

    /// Bounds used the last time the node was drawn.
    pub fn last_drawn_aabb(&self) -> Option<Aabb> {
        self.last_drawn_aabb
    }

    /// Spatial index key, if the node is indexed.
    pub fn index_key(&self) -> Option<Key> {
        self.index_key
    }
}
