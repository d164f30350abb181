// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slides the whole desktop sideways on a desktop switch.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::mem;

use gloss_core::animation::{AnimationEngine, AnimationId, AnimationRequest, Attribute, FPx2};
use gloss_core::context::EffectContext;
use gloss_core::effect::{Effect, Next, stage};
use gloss_core::paint::{
    PaintDisabled, PaintMask, ScreenPrePaintData, WindowPaintData, WindowPrePaintData,
};
use gloss_core::region::Region;
use gloss_core::time::Duration;
use gloss_core::window::WindowId;

/// The desktop slide effect.
///
/// While sliding it holds the full-screen slot: no other full-screen effect
/// can start, and a switch that arrives while another effect holds the slot
/// happens without a slide. A switch during a slide continues every window
/// from where it is.
#[derive(Debug)]
pub struct DesktopSlide {
    duration: Duration,
    engine: AnimationEngine,
    slides: BTreeMap<WindowId, AnimationId>,
}

impl Default for DesktopSlide {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}

impl DesktopSlide {
    /// Effect name used by the loader.
    pub const NAME: &'static str = "slide";

    /// Creates the effect with the given slide length.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            engine: AnimationEngine::new(),
            slides: BTreeMap::new(),
        }
    }

    /// Whether a slide is running.
    #[must_use]
    pub fn is_sliding(&self) -> bool {
        !self.slides.is_empty()
    }
}

impl Effect for DesktopSlide {
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
        if self.slides.contains_key(&window) {
            data.enable_painting(PaintDisabled::DESKTOP);
        }
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
        let engine = &self.engine;
        self.slides.retain(|_, id| engine.get(*id).is_some());
        next.post_paint_screen(cx);
    }

    fn desktop_changed(&mut self, cx: &mut EffectContext, from: u32, to: u32) {
        if let Some(holder) = cx.active_full_screen_effect()
            && cx.current_effect() != Some(holder)
        {
            return;
        }
        let width = cx.screen().width();
        let dx = if to > from { width } else { -width };
        let previous = mem::take(&mut self.slides);

        let windows: Vec<_> = cx.windows().stacking_order().collect();
        for window in windows {
            let leaving = cx.windows().is_on_desktop(window, from);
            let entering = cx.windows().is_on_desktop(window, to);
            if leaving == entering {
                continue;
            }
            let (start, end) = if entering { (dx, 0.0) } else { (0.0, -dx) };
            let start = previous
                .get(&window)
                .and_then(|id| self.engine.value(*id))
                .unwrap_or(FPx2::new(start, 0.0));
            let request =
                AnimationRequest::new(Attribute::Translation, FPx2::new(end, 0.0), self.duration)
                    .starting_at(start)
                    .full_screen(true)
                    .keep_alive(false);
            if let Some(id) = self.engine.animate(cx, window, request) {
                self.slides.insert(window, id);
            }
        }

        // The new slides hold the slot before the old ones let go of it.
        for id in previous.into_values() {
            self.engine.cancel(cx, id);
        }
    }

    fn window_deleted(&mut self, cx: &mut EffectContext, window: WindowId) {
        self.slides.remove(&window);
        self.engine.window_deleted(cx, window);
    }
}
