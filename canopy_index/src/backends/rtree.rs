// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! R-tree backend on top of [`rstar`].
//!
//! Each live slot is stored as a slot-tagged rectangle. Removal goes through
//! [`rstar::RTree::remove`], which descends by envelope, so the backend keeps a
//! side table of the exact box each slot was inserted with.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use rstar::{AABB, RTreeObject};

use crate::backend::Backend;
use crate::types::Aabb;

#[derive(Copy, Clone, Debug, PartialEq)]
struct SlotRect {
    slot: usize,
    min: [f64; 2],
    max: [f64; 2],
}

impl SlotRect {
    fn new(slot: usize, aabb: Aabb) -> Self {
        Self {
            slot,
            min: aabb.min(),
            max: aabb.max(),
        }
    }
}

impl RTreeObject for SlotRect {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// Dynamic R-tree backend.
pub struct RTree {
    tree: rstar::RTree<SlotRect>,
    slots: Vec<Option<SlotRect>>,
}

impl Default for RTree {
    fn default() -> Self {
        Self {
            tree: rstar::RTree::new(),
            slots: Vec::new(),
        }
    }
}

impl RTree {
    /// Build a tree in one pass from `(slot, box)` pairs using `rstar`'s bulk loader.
    pub fn bulk_load(pairs: &[(usize, Aabb)]) -> Self {
        let mut slots: Vec<Option<SlotRect>> = Vec::new();
        let mut items = Vec::with_capacity(pairs.len());
        for (slot, aabb) in pairs.iter().copied() {
            if slots.len() <= slot {
                slots.resize_with(slot + 1, || None);
            }
            let r = SlotRect::new(slot, aabb);
            slots[slot] = Some(r);
            items.push(r);
        }
        Self {
            tree: rstar::RTree::bulk_load(items),
            slots,
        }
    }
}

impl Backend for RTree {
    fn insert(&mut self, slot: usize, aabb: Aabb) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
        let r = SlotRect::new(slot, aabb);
        if let Some(old) = self.slots[slot].replace(r) {
            self.tree.remove(&old);
        }
        self.tree.insert(r);
    }

    fn remove(&mut self, slot: usize) {
        if let Some(old) = self.slots.get_mut(slot).and_then(Option::take) {
            let removed = self.tree.remove(&old);
            debug_assert!(removed.is_some(), "slot {slot} missing from the R-tree");
        }
    }

    fn clear(&mut self) {
        self.tree = rstar::RTree::new();
        self.slots.clear();
    }

    fn len(&self) -> usize {
        self.tree.size()
    }

    fn query_rect<'a>(&'a self, rect: Aabb) -> Box<dyn Iterator<Item = usize> + 'a> {
        let envelope = AABB::from_corners(rect.min(), rect.max());
        Box::new(
            self.tree
                .locate_in_envelope_intersecting(&envelope)
                .map(|r| r.slot),
        )
    }
}

impl Debug for RTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RTree")
            .field("total_slots", &self.slots.len())
            .field("alive", &self.tree.size())
            .finish_non_exhaustive()
    }
}
