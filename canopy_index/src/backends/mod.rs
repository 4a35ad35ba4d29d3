// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different spatial strategies.
//!
//! - `flatvec`: flat vector with linear scans (small, simple).
//! - `rtree`: dynamic R-tree built on [`rstar`], good for thousands of moving boxes.

pub mod flatvec;
pub mod rtree;
