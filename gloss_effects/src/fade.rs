// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fades windows in when they appear and out when they close.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use gloss_core::animation::{AnimationEngine, AnimationId, AnimationRequest, Attribute, FPx2};
use gloss_core::context::EffectContext;
use gloss_core::effect::{Effect, Next, stage};
use gloss_core::paint::{PaintMask, ScreenPrePaintData, WindowPaintData, WindowPrePaintData};
use gloss_core::region::Region;
use gloss_core::time::Duration;
use gloss_core::window::{DataRole, WindowId};

/// Fade durations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeConfig {
    /// Fade-in time for new windows.
    pub fade_in: Duration,
    /// Fade-out time for closed windows.
    pub fade_out: Duration,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            fade_in: Duration::from_millis(150),
            fade_out: Duration::from_millis(150),
        }
    }
}

/// The fade effect.
///
/// A closed window is kept alive as a remnant until its fade-out finishes.
/// Both fades take the matching grab role, so another effect that already
/// animates the window's appearance or disappearance wins.
#[derive(Debug, Default)]
pub struct FadeEffect {
    config: FadeConfig,
    engine: AnimationEngine,
    fades: BTreeMap<WindowId, (AnimationId, DataRole)>,
}

impl FadeEffect {
    /// Effect name used by the loader.
    pub const NAME: &'static str = "fade";

    /// Creates the effect.
    #[must_use]
    pub fn new(config: FadeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The running fades.
    #[must_use]
    pub fn engine(&self) -> &AnimationEngine {
        &self.engine
    }

    fn start(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        role: DataRole,
        request: AnimationRequest,
    ) {
        if !cx.grab_window(window, role, false) {
            return;
        }
        match self.engine.animate(cx, window, request) {
            Some(id) => {
                self.fades.insert(window, (id, role));
            }
            None => {
                cx.ungrab_window(window, role);
            }
        }
    }

    /// Drops the bookkeeping of a fade in progress, releasing its role.
    fn stop(&mut self, cx: &mut EffectContext, window: WindowId) {
        if let Some((id, role)) = self.fades.remove(&window) {
            self.engine.cancel(cx, id);
            cx.ungrab_window(window, role);
        }
    }
}

impl Effect for FadeEffect {
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
        let engine = &self.engine;
        let finished: Vec<_> = self
            .fades
            .iter()
            .filter(|(_, (id, _))| engine.get(*id).is_none())
            .map(|(&w, &(_, role))| (w, role))
            .collect();
        for (window, role) in finished {
            self.fades.remove(&window);
            cx.ungrab_window(window, role);
        }
        next.post_paint_screen(cx);
    }

    fn window_added(&mut self, cx: &mut EffectContext, window: WindowId) {
        let request = AnimationRequest::new(Attribute::Opacity, FPx2::splat(1.0), self.config.fade_in)
            .starting_at(FPx2::splat(0.0));
        self.start(cx, window, DataRole::WINDOW_ADDED_GRAB, request);
    }

    fn window_closed(&mut self, cx: &mut EffectContext, window: WindowId) {
        // A fade-in still running turns into the fade-out from where it is.
        let from = self
            .fades
            .get(&window)
            .and_then(|&(id, _)| self.engine.value(id));
        self.stop(cx, window);
        let mut request =
            AnimationRequest::new(Attribute::Opacity, FPx2::splat(0.0), self.config.fade_out);
        if let Some(from) = from {
            request = request.starting_at(from);
        }
        self.start(cx, window, DataRole::WINDOW_CLOSED_GRAB, request);
    }

    fn window_deleted(&mut self, cx: &mut EffectContext, window: WindowId) {
        self.fades.remove(&window);
        self.engine.window_deleted(cx, window);
    }
}

#[cfg(test)]
mod tests {
    use gloss_core::effect::EffectKind;
    use gloss_core::time::HostTime;
    use gloss_core::timing::FrameTick;
    use gloss_core::{Compositor, CompositorConfig};
    use gloss_render::PlanRecorder;
    use kurbo::Rect;

    use super::*;

    fn tick(i: u64) -> FrameTick {
        FrameTick::new(i, HostTime(i * 16_000_000))
    }

    fn setup() -> Compositor {
        let mut comp = Compositor::new(CompositorConfig::desktop());
        comp.add_effect(EffectKind::native(FadeEffect::new(FadeConfig {
            fade_in: Duration::from_millis(100),
            fade_out: Duration::from_millis(100),
        })))
        .expect("loads");
        comp
    }

    fn opacity(rec: &PlanRecorder, w: WindowId) -> Option<f64> {
        rec.last()?.item(w).map(|i| i.data.opacity)
    }

    #[test]
    fn new_windows_fade_in() {
        let mut comp = setup();
        let w = comp.add_window(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut rec = PlanRecorder::new();

        comp.paint_frame(&tick(0), &mut rec);
        assert_eq!(opacity(&rec, w), Some(0.0), "starts transparent");
        comp.paint_frame(&tick(3), &mut rec);
        let mid = opacity(&rec, w).expect("drawn");
        assert!(mid > 0.0 && mid < 1.0, "halfway: {mid}");

        comp.paint_frame(&tick(7), &mut rec);
        assert_eq!(opacity(&rec, w), Some(1.0));
        assert_eq!(
            comp.context().is_grabbed(w, DataRole::WINDOW_ADDED_GRAB),
            None,
            "role released after the fade"
        );
    }

    #[test]
    fn closed_windows_fade_out_before_destruction() {
        let mut comp = setup();
        let w = comp.add_window(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut rec = PlanRecorder::new();
        comp.paint_frame(&tick(0), &mut rec);
        comp.paint_frame(&tick(8), &mut rec);

        assert!(comp.close_window(w));
        assert_eq!(comp.context().keep_alive_count(w), 1);
        comp.paint_frame(&tick(11), &mut rec);
        let faded = opacity(&rec, w).expect("remnant still drawn");
        assert!(faded < 1.0, "fading: {faded}");

        let mut i = 12;
        while comp.windows().is_alive(w) {
            assert!(i < 40, "fade never finished");
            comp.paint_frame(&tick(i), &mut rec);
            i += 1;
        }
        assert_eq!(comp.context().keep_alive_count(w), 0);
    }

    #[test]
    fn closing_mid_fade_in_fades_out_from_the_current_value() {
        let mut comp = setup();
        let w = comp.add_window(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut rec = PlanRecorder::new();
        comp.paint_frame(&tick(0), &mut rec);
        comp.paint_frame(&tick(2), &mut rec);
        let before = opacity(&rec, w).expect("drawn");
        assert!(before > 0.0 && before < 1.0, "fading in: {before}");

        assert!(comp.close_window(w));
        comp.paint_frame(&tick(3), &mut rec);
        let after = opacity(&rec, w).expect("remnant still drawn");
        assert!(after <= before, "no jump back up: {before} -> {after}");
        assert_eq!(comp.context().keep_alive_count(w), 1);
        assert_eq!(
            comp.context().is_grabbed(w, DataRole::WINDOW_ADDED_GRAB),
            None,
            "fade-in role released"
        );
    }

    /// Takes the close role before anyone else.
    struct Claim;

    impl Effect for Claim {
        fn name(&self) -> &str {
            "claim"
        }

        fn ordering(&self) -> i32 {
            -10
        }

        fn window_closed(&mut self, cx: &mut EffectContext, window: WindowId) {
            cx.grab_window(window, DataRole::WINDOW_CLOSED_GRAB, false);
        }
    }

    #[test]
    fn another_effects_grab_wins() {
        let mut comp = Compositor::new(CompositorConfig::desktop());
        comp.add_effect(EffectKind::native(Claim)).expect("loads");
        comp.add_effect(EffectKind::native(FadeEffect::default()))
            .expect("loads");
        let w = comp.add_window(Rect::new(0.0, 0.0, 100.0, 100.0));

        comp.close_window(w);
        assert_eq!(comp.context().keep_alive_count(w), 0);
        assert!(
            !comp.windows().is_alive(w),
            "nothing kept the window, so it is destroyed right away"
        );
    }
}
