// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Memo of the last value written to each drawing-context property.
//!
//! Every property mutation during a pass goes through [`StateCache::update`],
//! which skips the context call when the value is unchanged. Dash patterns
//! compare by pointer, shared brushes by handle identity, so the check is O(1)
//! and callers must not mutate a dash array they have already handed out.

use kurbo::Vec2;

use crate::context::{Brush, DrawingContext};
use crate::style::{Color, Filter, LineCap, LineDash, LineJoin};

/// A drawing-context property tracked by the cache.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// Fill source.
    FillStyle,
    /// Stroke source.
    StrokeStyle,
    /// Stroke width.
    LineWidth,
    /// Dash pattern.
    LineDash,
    /// End cap.
    LineCap,
    /// Corner join.
    LineJoin,
    /// Miter limit.
    MiterLimit,
    /// Global alpha.
    GlobalAlpha,
    /// Shadow color.
    ShadowColor,
    /// Shadow blur.
    ShadowBlur,
    /// Shadow offset.
    ShadowOffset,
    /// Filter.
    Filter,
}

impl StateKey {
    /// Number of tracked properties.
    pub const COUNT: usize = 12;

    /// Every key, in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::FillStyle,
        Self::StrokeStyle,
        Self::LineWidth,
        Self::LineDash,
        Self::LineCap,
        Self::LineJoin,
        Self::MiterLimit,
        Self::GlobalAlpha,
        Self::ShadowColor,
        Self::ShadowBlur,
        Self::ShadowOffset,
        Self::Filter,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    /// The value a freshly created context reports for this property.
    pub fn initial(self) -> ContextState {
        match self {
            Self::FillStyle => ContextState::FillStyle(Brush::default()),
            Self::StrokeStyle => ContextState::StrokeStyle(Brush::default()),
            Self::LineWidth => ContextState::LineWidth(1.0),
            Self::LineDash => ContextState::LineDash(None),
            Self::LineCap => ContextState::LineCap(LineCap::default()),
            Self::LineJoin => ContextState::LineJoin(LineJoin::default()),
            Self::MiterLimit => ContextState::MiterLimit(10.0),
            Self::GlobalAlpha => ContextState::GlobalAlpha(1.0),
            Self::ShadowColor => ContextState::ShadowColor(Color::TRANSPARENT),
            Self::ShadowBlur => ContextState::ShadowBlur(0.0),
            Self::ShadowOffset => ContextState::ShadowOffset(Vec2::ZERO),
            Self::Filter => ContextState::Filter(None),
        }
    }
}

/// A property paired with its value.
#[derive(Clone, Debug)]
pub enum ContextState {
    /// Fill source.
    FillStyle(Brush),
    /// Stroke source.
    StrokeStyle(Brush),
    /// Stroke width.
    LineWidth(f64),
    /// Dash pattern; `None` is solid.
    LineDash(Option<LineDash>),
    /// End cap.
    LineCap(LineCap),
    /// Corner join.
    LineJoin(LineJoin),
    /// Miter limit.
    MiterLimit(f64),
    /// Global alpha.
    GlobalAlpha(f64),
    /// Shadow color.
    ShadowColor(Color),
    /// Shadow blur.
    ShadowBlur(f64),
    /// Shadow offset.
    ShadowOffset(Vec2),
    /// Filter.
    Filter(Option<Filter>),
}

impl PartialEq for ContextState {
    fn eq(&self, other: &Self) -> bool {
        use ContextState as S;
        match (self, other) {
            (S::FillStyle(a), S::FillStyle(b)) | (S::StrokeStyle(a), S::StrokeStyle(b)) => a == b,
            (S::LineDash(a), S::LineDash(b)) => match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => LineDash::ptr_eq(a, b),
                _ => false,
            },
            (S::LineCap(a), S::LineCap(b)) => a == b,
            (S::LineJoin(a), S::LineJoin(b)) => a == b,
            (S::LineWidth(a), S::LineWidth(b))
            | (S::MiterLimit(a), S::MiterLimit(b))
            | (S::GlobalAlpha(a), S::GlobalAlpha(b))
            | (S::ShadowBlur(a), S::ShadowBlur(b)) => a == b,
            (S::ShadowColor(a), S::ShadowColor(b)) => a == b,
            (S::ShadowOffset(a), S::ShadowOffset(b)) => a == b,
            (S::Filter(a), S::Filter(b)) => a == b,
            _ => false,
        }
    }
}

impl ContextState {
    /// The property this value is for.
    pub fn key(&self) -> StateKey {
        match self {
            Self::FillStyle(_) => StateKey::FillStyle,
            Self::StrokeStyle(_) => StateKey::StrokeStyle,
            Self::LineWidth(_) => StateKey::LineWidth,
            Self::LineDash(_) => StateKey::LineDash,
            Self::LineCap(_) => StateKey::LineCap,
            Self::LineJoin(_) => StateKey::LineJoin,
            Self::MiterLimit(_) => StateKey::MiterLimit,
            Self::GlobalAlpha(_) => StateKey::GlobalAlpha,
            Self::ShadowColor(_) => StateKey::ShadowColor,
            Self::ShadowBlur(_) => StateKey::ShadowBlur,
            Self::ShadowOffset(_) => StateKey::ShadowOffset,
            Self::Filter(_) => StateKey::Filter,
        }
    }

    /// Write this value to `ctx` unconditionally.
    pub fn apply(&self, ctx: &mut dyn DrawingContext) {
        match self {
            Self::FillStyle(b) => ctx.set_fill_style(b),
            Self::StrokeStyle(b) => ctx.set_stroke_style(b),
            Self::LineWidth(w) => ctx.set_line_width(*w),
            Self::LineDash(d) => ctx.set_line_dash(d.as_deref().unwrap_or(&[])),
            Self::LineCap(c) => ctx.set_line_cap(*c),
            Self::LineJoin(j) => ctx.set_line_join(*j),
            Self::MiterLimit(m) => ctx.set_miter_limit(*m),
            Self::GlobalAlpha(a) => ctx.set_global_alpha(*a),
            Self::ShadowColor(c) => ctx.set_shadow_color(*c),
            Self::ShadowBlur(b) => ctx.set_shadow_blur(*b),
            Self::ShadowOffset(o) => ctx.set_shadow_offset(*o),
            Self::Filter(f) => ctx.set_filter(*f),
        }
    }
}

/// Per-pass memo of drawing-context properties.
#[derive(Clone, Debug, Default)]
pub struct StateCache {
    slots: [Option<ContextState>; StateKey::COUNT],
    mutations: u64,
}

impl StateCache {
    /// Create a cache at the initial baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, calling the context only if the value differs from the cached one.
    ///
    /// Returns the previous value (the initial value if the property has not been
    /// written this pass), so a caller can restore it with a second `update`.
    pub fn update(&mut self, ctx: &mut dyn DrawingContext, state: ContextState) -> ContextState {
        let key = state.key();
        let slot = &mut self.slots[key.index()];
        let previous = slot.take().unwrap_or_else(|| key.initial());
        if previous != state {
            state.apply(ctx);
            self.mutations += 1;
        }
        *slot = Some(state);
        previous
    }

    /// Current cached value for `key`.
    pub fn get(&self, key: StateKey) -> ContextState {
        self.slots[key.index()]
            .clone()
            .unwrap_or_else(|| key.initial())
    }

    /// Forget every cached value. Call at the start and end of each pass.
    pub fn reset(&mut self) {
        self.slots = Default::default();
    }

    /// Total context mutations issued through this cache.
    pub fn mutations(&self) -> u64 {
        self.mutations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DrawCall, RecordingContext};
    use std::sync::Arc;

    #[test]
    fn equal_values_are_elided() {
        let mut ctx = RecordingContext::new();
        let mut cache = StateCache::new();
        cache.update(&mut ctx, ContextState::LineWidth(3.0));
        cache.update(&mut ctx, ContextState::LineWidth(3.0));
        assert_eq!(ctx.state_changes(), 1);
        assert_eq!(cache.mutations(), 1);
    }

    #[test]
    fn initial_value_is_not_written() {
        let mut ctx = RecordingContext::new();
        let mut cache = StateCache::new();
        for key in StateKey::ALL {
            let prev = cache.update(&mut ctx, key.initial());
            assert_eq!(prev, key.initial());
        }
        assert!(ctx.is_empty());
    }

    #[test]
    fn previous_values_follow_what_was_set() {
        let mut ctx = RecordingContext::new();
        let mut cache = StateCache::new();
        let values = [0.5, 0.5, 0.25, 1.0, 1.0, 0.75];
        let mut previous = Vec::new();
        for v in values {
            previous.push(cache.update(&mut ctx, ContextState::GlobalAlpha(v)));
        }
        let expected: Vec<ContextState> = [1.0, 0.5, 0.5, 0.25, 1.0, 1.0]
            .into_iter()
            .map(ContextState::GlobalAlpha)
            .collect();
        assert_eq!(previous, expected);
        let written: Vec<&DrawCall> = ctx.calls().iter().collect();
        assert_eq!(
            written,
            [
                &DrawCall::Set(ContextState::GlobalAlpha(0.5)),
                &DrawCall::Set(ContextState::GlobalAlpha(0.25)),
                &DrawCall::Set(ContextState::GlobalAlpha(1.0)),
                &DrawCall::Set(ContextState::GlobalAlpha(0.75)),
            ]
        );
    }

    #[test]
    fn dashes_compare_by_identity() {
        let mut ctx = RecordingContext::new();
        let mut cache = StateCache::new();
        let a: LineDash = Arc::from([4.0, 2.0]);
        let b: LineDash = Arc::from([4.0, 2.0]);
        cache.update(&mut ctx, ContextState::LineDash(Some(a.clone())));
        cache.update(&mut ctx, ContextState::LineDash(Some(a)));
        assert_eq!(ctx.state_changes(), 1);
        cache.update(&mut ctx, ContextState::LineDash(Some(b)));
        assert_eq!(ctx.state_changes(), 2, "equal contents, different array");
    }

    #[test]
    fn swap_and_restore() {
        let mut ctx = RecordingContext::new();
        let mut cache = StateCache::new();
        cache.update(&mut ctx, ContextState::ShadowColor(Color::BLACK));
        let prev = cache.update(&mut ctx, ContextState::ShadowColor(Color::TRANSPARENT));
        assert_eq!(prev, ContextState::ShadowColor(Color::BLACK));
        cache.update(&mut ctx, prev);
        assert_eq!(cache.get(StateKey::ShadowColor), ContextState::ShadowColor(Color::BLACK));
        assert_eq!(ctx.state_changes(), 3);
    }

    #[test]
    fn reset_returns_to_baseline() {
        let mut ctx = RecordingContext::new();
        let mut cache = StateCache::new();
        cache.update(&mut ctx, ContextState::LineWidth(5.0));
        cache.reset();
        assert_eq!(cache.get(StateKey::LineWidth), ContextState::LineWidth(1.0));
        // After a reset the cache no longer knows 5.0 was written.
        cache.update(&mut ctx, ContextState::LineWidth(5.0));
        assert_eq!(ctx.state_changes(), 2);
    }
}
