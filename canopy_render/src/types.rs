// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identifiers and ordering keys shared by the scene and the scheduler.

/// Identifier for a scene node.
///
/// A small, copyable handle consisting of a slot index and a generation counter.
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed and any existing `NodeId` for it becomes stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// Stale ids never alias a different live node because the generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Slot index, useful for debugging output.
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Generation of the slot when this id was issued.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

/// Paint order key: ascending z-index first, then ascending document order.
///
/// Field order matters: the derived `Ord` compares `z_index` before `document_order`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PaintOrder {
    /// Stacking order. Higher is drawn on top.
    pub z_index: i32,
    /// Position in document order, used to break z ties.
    pub document_order: u64,
}

impl PaintOrder {
    /// Create a paint order key.
    pub const fn new(z_index: i32, document_order: u64) -> Self {
        Self {
            z_index,
            document_order,
        }
    }
}
