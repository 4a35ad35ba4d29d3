// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Index: a 2D AABB spatial index for incremental redraw.
//!
//! - [`Aabb`]: center/half-extents box with union ([`Aabb::add`]) and overlap ([`Aabb::intersects`]) tests.
//! - [`SpatialIndex`]: one live entry per generational [`Key`], applied to the backend immediately.
//! - [`Backend`]: the seam between the index and the spatial strategy.
//!
//! The index never updates a box in place. A caller that moves an entry removes it and inserts
//! it again, which keeps every backend honest about stale geometry.
//!
//! # Example
//!
//! ```rust
//! use canopy_index::{Aabb, SpatialIndex, RTree};
//!
//! let mut idx = SpatialIndex::<u32, RTree>::with_rtree();
//! let a = idx.insert(Aabb::from_xywh(0.0, 0.0, 10.0, 10.0), 1);
//! let _b = idx.insert(Aabb::from_xywh(5.0, 5.0, 10.0, 10.0), 2);
//!
//! // Move the first box.
//! let (_, payload) = idx.remove(a).unwrap();
//! idx.insert(Aabb::from_xywh(40.0, 0.0, 10.0, 10.0), payload);
//!
//! let hits: Vec<_> = idx.search(Aabb::from_xywh(6.0, 6.0, 1.0, 1.0)).collect();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].1, 2);
//! ```
//!
//! ## Choosing a backend
//!
//! - [`FlatVec`] (default): linear scans. Good for a few dozen boxes.
//! - [`RTree`]: a dynamic R-tree from [`rstar`]. Good for thousands of boxes that move every frame.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs. Boxes that only touch along an edge are reported as intersecting.

#![no_std]

extern crate alloc;

pub mod backend;
pub mod backends;
pub mod index;
pub mod types;

pub use backend::Backend;
pub use backends::flatvec::FlatVec;
pub use backends::rtree::RTree;
pub use index::{Key, SpatialIndex};
pub use types::{Aabb, union_opt};
