// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Canopy Index: insert, move by remove+insert, and search.

use canopy_index::{Aabb, RTree, SpatialIndex};

fn main() {
    let mut idx = SpatialIndex::<u32, RTree>::with_rtree();
    let k1 = idx.insert(Aabb::from_xywh(0.0, 0.0, 10.0, 10.0), 1);
    let _k2 = idx.insert(Aabb::from_xywh(5.0, 5.0, 10.0, 10.0), 2);

    // Move box 1
    if let Some((old, payload)) = idx.remove(k1) {
        let new = Aabb::from_xywh(20.0, 0.0, 10.0, 10.0);
        idx.insert(new, payload);
        println!("moved {payload}: {:?} -> {:?}", old.min(), new.min());
    }

    let hits: Vec<_> = idx.search(Aabb::from_xywh(6.0, 6.0, 0.0, 0.0)).collect();
    println!("hits at (6,6): {:?}", hits);
}
