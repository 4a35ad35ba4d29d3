// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.

use kurbo::Rect;

/// Extra pixels added below the dirty rectangle to absorb text baseline rounding.
pub const DEFAULT_BASELINE_PADDING: f64 = 1.0;

/// Configuration handed to [`FrameScheduler`](crate::FrameScheduler) at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// The drawing surface's view rectangle in device pixels. Dirty rectangles are clamped to it.
    pub view: Rect,
    /// Redraw the whole surface every frame instead of only the dirty region.
    pub immediate_mode: bool,
    /// Pixels added to the bottom edge of every dirty rectangle.
    pub baseline_padding: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl EngineConfig {
    /// Configuration for a `width` x `height` surface anchored at the origin.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            view: Rect::new(0.0, 0.0, width, height),
            immediate_mode: false,
            baseline_padding: DEFAULT_BASELINE_PADDING,
        }
    }

    /// Use an explicit view rectangle.
    #[must_use]
    pub fn with_view(mut self, view: Rect) -> Self {
        self.view = view;
        self
    }

    /// Start in immediate (full redraw) mode.
    #[must_use]
    pub fn with_immediate_mode(mut self, immediate: bool) -> Self {
        self.immediate_mode = immediate;
        self
    }

    /// Override the bottom padding of dirty rectangles.
    #[must_use]
    pub fn with_baseline_padding(mut self, padding: f64) -> Self {
        self.baseline_padding = padding;
        self
    }
}
