// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `SpatialIndex` API over a pluggable backend.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::backends::flatvec::FlatVec;
use crate::backends::rtree::RTree;
use crate::types::Aabb;

/// Generational handle for entries.
///
/// A key stays valid until its entry is removed. Slots are recycled, but a
/// recycled slot gets a higher generation, so stale keys never alias a new entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(u32, u32);

impl Key {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Index keys are intentionally 32-bit; higher bits are truncated by design."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Entry<P> {
    generation: u32,
    aabb: Aabb,
    payload: P,
}

/// An AABB index holding one live entry per key, parameterized by a spatial backend.
///
/// Mutations are applied to the backend immediately, so [`SpatialIndex::search`]
/// always reflects the latest insert/remove.
#[derive(Debug)]
pub struct SpatialIndex<P: Copy + Debug, B: Backend = FlatVec> {
    entries: Vec<Option<Entry<P>>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    backend: B,
}

impl<P: Copy + Debug> SpatialIndex<P, FlatVec> {
    /// Create an empty index backed by a flat vector.
    pub fn new() -> Self {
        Self::with_backend(FlatVec::default())
    }
}

impl<P: Copy + Debug> Default for SpatialIndex<P, FlatVec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Copy + Debug> SpatialIndex<P, RTree> {
    /// Create an empty R-tree-backed index.
    pub fn with_rtree() -> Self {
        Self::with_backend(RTree::default())
    }

    /// Build an R-tree-backed index in bulk. Keys are returned in input order.
    pub fn with_rtree_bulk(items: &[(Aabb, P)]) -> (Self, Vec<Key>) {
        let mut entries = Vec::with_capacity(items.len());
        let mut pairs = Vec::with_capacity(items.len());
        let mut keys = Vec::with_capacity(items.len());
        for (i, (aabb, payload)) in items.iter().copied().enumerate() {
            entries.push(Some(Entry {
                generation: 1,
                aabb,
                payload,
            }));
            pairs.push((i, aabb));
            keys.push(Key::new(i, 1));
        }
        let idx = Self {
            entries,
            generations: alloc::vec![1; items.len()],
            free_list: Vec::new(),
            backend: RTree::bulk_load(&pairs),
        };
        (idx, keys)
    }
}

impl<P: Copy + Debug, B: Backend> SpatialIndex<P, B> {
    /// Create an empty index over an explicit backend instance.
    pub fn with_backend(backend: B) -> Self {
        Self {
            entries: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            backend,
        }
    }

    /// Reserve space for at least `n` additional entries.
    pub fn reserve(&mut self, n: usize) {
        self.entries.reserve(n);
    }

    /// Insert a box with payload and return its handle.
    pub fn insert(&mut self, aabb: Aabb, payload: P) -> Key {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.entries[idx] = Some(Entry {
                generation,
                aabb,
                payload,
            });
            (idx, generation)
        } else {
            self.entries.push(Some(Entry {
                generation: 1,
                aabb,
                payload,
            }));
            self.generations.push(1);
            (self.entries.len() - 1, 1)
        };
        self.backend.insert(idx, aabb);
        Key::new(idx, generation)
    }

    /// Remove an entry, returning its box and payload. Stale keys return `None`.
    pub fn remove(&mut self, key: Key) -> Option<(Aabb, P)> {
        self.get(key)?;
        let entry = self.entries[key.idx()].take()?;
        self.backend.remove(key.idx());
        self.free_list.push(key.idx());
        Some((entry.aabb, entry.payload))
    }

    /// Look up the box and payload for a live key.
    pub fn get(&self, key: Key) -> Option<(Aabb, P)> {
        let e = self.entries.get(key.idx())?.as_ref()?;
        (e.generation == key.1).then_some((e.aabb, e.payload))
    }

    /// True if the key refers to a live entry.
    pub fn contains_key(&self, key: Key) -> bool {
        self.get(key).is_some()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    /// True if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generations.clear();
        self.free_list.clear();
        self.backend.clear();
    }

    /// Entries whose box intersects `rect`, in backend order.
    pub fn search(&self, rect: Aabb) -> impl Iterator<Item = (Key, P)> + '_ {
        self.backend.query_rect(rect).filter_map(move |i| {
            let e = self.entries.get(i)?.as_ref()?;
            Some((Key::new(i, e.generation), e.payload))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn payloads<B: Backend>(idx: &SpatialIndex<u32, B>, rect: Aabb) -> Vec<u32> {
        let mut v: Vec<u32> = idx.search(rect).map(|(_, p)| p).collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn insert_remove_and_search() {
        let mut idx: SpatialIndex<u32> = SpatialIndex::new();
        let k1 = idx.insert(Aabb::from_xywh(0.0, 0.0, 10.0, 10.0), 1);
        let _k2 = idx.insert(Aabb::from_xywh(5.0, 5.0, 10.0, 10.0), 2);
        assert_eq!(payloads(&idx, Aabb::from_xywh(6.0, 6.0, 1.0, 1.0)), [1, 2]);

        let removed = idx.remove(k1);
        assert_eq!(removed.map(|(_, p)| p), Some(1));
        assert_eq!(payloads(&idx, Aabb::from_xywh(6.0, 6.0, 1.0, 1.0)), [2]);
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn stale_key_does_not_alias_reused_slot() {
        let mut idx = SpatialIndex::<u32, RTree>::with_rtree();
        let old = idx.insert(Aabb::from_xywh(0.0, 0.0, 1.0, 1.0), 1);
        idx.remove(old);
        let new = idx.insert(Aabb::from_xywh(0.0, 0.0, 1.0, 1.0), 2);
        assert_ne!(old, new);
        assert!(idx.remove(old).is_none(), "stale key must be ignored");
        assert!(idx.contains_key(new));
        assert_eq!(payloads(&idx, Aabb::from_xywh(0.0, 0.0, 1.0, 1.0)), [2]);
    }

    #[test]
    fn move_by_remove_then_insert() {
        let mut idx = SpatialIndex::<u32, RTree>::with_rtree();
        let k = idx.insert(Aabb::from_xywh(0.0, 0.0, 10.0, 10.0), 7);
        let (old, payload) = idx.remove(k).unwrap();
        let moved = Aabb::from_xywh(100.0, 100.0, 10.0, 10.0);
        let _k = idx.insert(moved, payload);
        assert!(payloads(&idx, old).is_empty());
        assert_eq!(payloads(&idx, moved), [7]);
    }

    #[test]
    fn backends_agree_on_searches() {
        let mut flat: SpatialIndex<u32> = SpatialIndex::new();
        let mut tree = SpatialIndex::<u32, RTree>::with_rtree();
        for i in 0..100_u32 {
            let x = f64::from(i % 10) * 15.0;
            let y = f64::from(i / 10) * 15.0;
            let r = Aabb::from_xywh(x, y, 12.0, 12.0);
            flat.insert(r, i);
            tree.insert(r, i);
        }
        for q in [
            Aabb::from_xywh(0.0, 0.0, 1.0, 1.0),
            Aabb::from_xywh(20.0, 20.0, 40.0, 10.0),
            Aabb::from_xywh(500.0, 500.0, 10.0, 10.0),
        ] {
            assert_eq!(payloads(&flat, q), payloads(&tree, q));
        }
    }

    #[test]
    fn bulk_keys_are_usable() {
        let items: Vec<(Aabb, u32)> = (0..16_u32)
            .map(|i| (Aabb::from_xywh(f64::from(i) * 10.0, 0.0, 5.0, 5.0), i))
            .collect();
        let (mut idx, keys) = SpatialIndex::with_rtree_bulk(&items);
        assert_eq!(idx.len(), 16);
        idx.remove(keys[3]);
        assert!(payloads(&idx, Aabb::from_xywh(30.0, 0.0, 1.0, 1.0)).is_empty());
        assert_eq!(idx.len(), 15);
    }
}
