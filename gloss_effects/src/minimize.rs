// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shrinks and fades windows as they are minimized, and back when restored.
//!
//! A direction change mid-flight reverses the running animations instead of
//! starting new ones, so the window never jumps.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use gloss_core::animation::{
    AnimationEngine, AnimationId, AnimationRequest, Attribute, Direction, FPx2, TerminationFlags,
};
use gloss_core::context::EffectContext;
use gloss_core::effect::{Effect, Next, stage};
use gloss_core::paint::{PaintMask, ScreenPrePaintData, WindowPaintData, WindowPrePaintData};
use gloss_core::region::Region;
use gloss_core::time::Duration;
use gloss_core::window::{DataRole, WindowId};

/// Scale of a fully minimized window.
pub const MINIMIZED_SCALE: f64 = 0.3;

#[derive(Clone, Copy, Debug)]
struct Motion {
    scale: AnimationId,
    opacity: AnimationId,
    role: DataRole,
    /// Started from the minimized look toward the normal one.
    restoring: bool,
}

impl Motion {
    /// Timeline direction that heads toward the minimized look.
    fn toward_minimized(&self) -> Direction {
        if self.restoring {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }
}

/// The minimize effect.
#[derive(Debug)]
pub struct MinimizeEffect {
    duration: Duration,
    engine: AnimationEngine,
    motions: BTreeMap<WindowId, Motion>,
}

impl Default for MinimizeEffect {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

impl MinimizeEffect {
    /// Effect name used by the loader.
    pub const NAME: &'static str = "minimize";

    /// Creates the effect with the given animation length.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            engine: AnimationEngine::new(),
            motions: BTreeMap::new(),
        }
    }

    /// Whether `window` is between its normal and minimized look.
    #[must_use]
    pub fn is_animating(&self, window: WindowId) -> bool {
        self.motions.contains_key(&window)
    }

    fn start(&mut self, cx: &mut EffectContext, window: WindowId, restoring: bool) {
        let role = if restoring {
            DataRole::WINDOW_UNMINIMIZED_GRAB
        } else {
            DataRole::WINDOW_MINIMIZED_GRAB
        };
        if !cx.grab_window(window, role, false) {
            return;
        }
        let (normal, small) = ((1.0, 1.0), (MINIMIZED_SCALE, 0.0));
        let ((scale_from, opacity_from), (scale_to, opacity_to)) = if restoring {
            (small, normal)
        } else {
            (normal, small)
        };
        let scale = AnimationRequest::new(Attribute::Scale, FPx2::splat(scale_to), self.duration)
            .starting_at(FPx2::splat(scale_from))
            .keep_alive(false);
        let opacity =
            AnimationRequest::new(Attribute::Opacity, FPx2::splat(opacity_to), self.duration)
                .starting_at(FPx2::splat(opacity_from))
                .keep_alive(false);

        let Some(scale) = self.engine.animate(cx, window, scale) else {
            cx.ungrab_window(window, role);
            return;
        };
        let Some(opacity) = self.engine.animate(cx, window, opacity) else {
            self.engine.cancel(cx, scale);
            cx.ungrab_window(window, role);
            return;
        };
        self.motions.insert(
            window,
            Motion {
                scale,
                opacity,
                role,
                restoring,
            },
        );
    }

    fn steer(&mut self, cx: &mut EffectContext, motion: Motion, direction: Direction) {
        for id in [motion.scale, motion.opacity] {
            self.engine
                .redirect(cx, id, direction, TerminationFlags::all());
        }
    }
}

impl Effect for MinimizeEffect {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_active(&self) -> bool {
        self.engine.is_active()
    }

    fn pre_paint_screen(
        &mut self,
        cx: &mut EffectContext,
        data: &mut ScreenPrePaintData,
        elapsed: Duration,
        next: Next<'_, stage::PrePaintScreen>,
    ) {
        self.engine.pre_paint_screen(cx, data, elapsed);
        next.pre_paint_screen(cx, data, elapsed);
    }

    fn pre_paint_window(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        data: &mut WindowPrePaintData,
        elapsed: Duration,
        next: Next<'_, stage::PrePaintWindow>,
    ) {
        self.engine.pre_paint_window(cx, window, data);
        next.pre_paint_window(cx, window, data, elapsed);
    }

    fn paint_window(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        mask: PaintMask,
        region: &Region,
        data: &mut WindowPaintData,
        next: Next<'_, stage::PaintWindow>,
    ) {
        self.engine.paint_window(cx, window, data);
        next.paint_window(cx, window, mask, region, data);
    }

    fn post_paint_screen(&mut self, cx: &mut EffectContext, next: Next<'_, stage::PostPaintScreen>) {
        self.engine.post_paint_screen(cx);
        let done: Vec<_> = self
            .motions
            .iter()
            .filter(|(_, m)| self.engine.get(m.scale).is_none())
            .map(|(&w, &m)| (w, m))
            .collect();
        for (window, motion) in done {
            self.motions.remove(&window);
            self.engine.cancel(cx, motion.opacity);
            cx.ungrab_window(window, motion.role);
        }
        next.post_paint_screen(cx);
    }

    fn window_minimized(&mut self, cx: &mut EffectContext, window: WindowId) {
        match self.motions.get(&window).copied() {
            Some(motion) => self.steer(cx, motion, motion.toward_minimized()),
            None => self.start(cx, window, false),
        }
    }

    fn window_unminimized(&mut self, cx: &mut EffectContext, window: WindowId) {
        match self.motions.get(&window).copied() {
            Some(motion) => self.steer(cx, motion, motion.toward_minimized().reversed()),
            None => self.start(cx, window, true),
        }
    }

    fn window_deleted(&mut self, cx: &mut EffectContext, window: WindowId) {
        self.motions.remove(&window);
        self.engine.window_deleted(cx, window);
    }
}
