// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing contexts that produce pixels.
//!
//! - `pixmap` (feature `tiny-skia`): CPU rasterization into a [`tiny_skia::Pixmap`].

#[cfg(feature = "tiny-skia")]
pub mod pixmap;
