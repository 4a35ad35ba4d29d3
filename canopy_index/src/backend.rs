// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait for spatial indexing implementations.

use alloc::boxed::Box;

use crate::types::Aabb;

/// Spatial backend abstraction used by [`SpatialIndex`](crate::SpatialIndex).
///
/// Backends only see opaque slot numbers; payloads and key generations live in the index.
/// There is no in-place update: a moved box is removed and inserted again.
pub trait Backend {
    /// Insert a slot with its box. The slot must not already be present.
    fn insert(&mut self, slot: usize, aabb: Aabb);

    /// Remove a slot. Unknown slots are ignored.
    fn remove(&mut self, slot: usize);

    /// Clear all spatial structures.
    fn clear(&mut self);

    /// Number of live slots.
    fn len(&self) -> usize;

    /// True if no slots are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Query slots whose box intersects the rectangle.
    fn query_rect<'a>(&'a self, rect: Aabb) -> Box<dyn Iterator<Item = usize> + 'a>;
}
