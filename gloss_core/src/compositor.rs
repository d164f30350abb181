// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drive cycle and window lifecycle entry points.
//!
//! [`Compositor`] owns the [`EffectContext`] and the [`EffectChain`] and
//! turns frame ticks into renderer calls:
//!
//! ```text
//!   FrameTick
//!       │
//!       ▼
//!   collect_damage ──► FrameScheduler::plan ──► FramePlan
//!                                                   │
//!   pre_paint_screen ◄──────────────────────────────┘
//!   pre_paint_window × N
//!   paint_screen ──► (terminal reached?) ──► paint_window → draw_window
//!                                            → build_quads → Renderer
//!   post_paint_window × N
//!   post_paint_screen
//!       │
//!       ▼
//!   Renderer::end_frame ──► FrameScheduler::observe ──► release remnants
//! ```
//!
//! Window lifecycle calls (`add_window`, `close_window`, ...) come from the
//! window manager between frames. Each one updates the window list,
//! notifies every effect, and publishes a [`WindowEvent`].

use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;
use core::mem;

use kurbo::Rect;

use crate::arbitration::FullScreenChange;
use crate::backend::Renderer;
use crate::config::CompositorConfig;
use crate::context::EffectContext;
use crate::effect::{EffectChain, EffectId, EffectKind, EffectLoader, EffectSink, LoadResult};
use crate::error::LoadError;
use crate::paint::{
    PaintDisabled, PaintMask, ScreenPaintData, ScreenPrePaintData, WindowPaintData,
    WindowPrePaintData,
};
use crate::quad::QuadList;
use crate::region::Region;
use crate::signal::{Signal, SubscriptionId};
use crate::time::HostTime;
use crate::timing::{FrameOutcome, FrameTick};
use crate::trace::{
    EffectLoadEvent, EffectUnloadEvent, FrameBeginEvent, FrameEndEvent, FrameSummaryBuilder,
    GrabAction, GrabEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
};
use crate::window::{WindowEvent, WindowEventKind, WindowFlags, WindowId, WindowStore};

type Clock = Box<dyn FnMut() -> HostTime>;

/// A compositor session: window list, effects, and the drive cycle.
pub struct Compositor {
    cx: EffectContext,
    chain: EffectChain,
    loaded: Signal<LoadResult>,
    window_events: Signal<WindowEvent>,
    clock: Option<Clock>,
}

impl fmt::Debug for Compositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compositor")
            .field("cx", &self.cx)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(CompositorConfig::default())
    }
}

impl Compositor {
    /// Creates a session with no windows and no effects.
    #[must_use]
    pub fn new(config: CompositorConfig) -> Self {
        Self {
            cx: EffectContext::new(config),
            chain: EffectChain::new(),
            loaded: Signal::new(),
            window_events: Signal::new(),
            clock: None,
        }
    }

    // -- Accessors --

    /// The shared context.
    #[must_use]
    pub fn context(&self) -> &EffectContext {
        &self.cx
    }

    /// The shared context, mutably.
    pub fn context_mut(&mut self) -> &mut EffectContext {
        &mut self.cx
    }

    /// The window list.
    #[must_use]
    pub fn windows(&self) -> &WindowStore {
        &self.cx.windows
    }

    /// The window list, for property changes that need no effect
    /// notification (geometry, opacity, damage, stacking).
    pub fn windows_mut(&mut self) -> &mut WindowStore {
        &mut self.cx.windows
    }

    /// The loaded effects.
    #[must_use]
    pub fn chain(&self) -> &EffectChain {
        &self.chain
    }

    /// Installs a trace sink, returning the previous one.
    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) -> Option<Box<dyn TraceSink>> {
        self.cx.set_trace_sink(sink)
    }

    /// Installs a clock used to time the drive-cycle phases. Without one,
    /// every phase is stamped with the tick's time.
    pub fn set_clock(&mut self, clock: impl FnMut() -> HostTime + 'static) {
        self.clock = Some(Box::new(clock));
    }

    /// Subscribes to effect load results.
    pub fn on_effect_loaded(&mut self, callback: impl FnMut(&LoadResult) + 'static) -> SubscriptionId {
        self.loaded.subscribe(callback)
    }

    /// Revokes an [`on_effect_loaded`](Self::on_effect_loaded) subscription.
    pub fn unsubscribe_effect_loaded(&mut self, id: SubscriptionId) -> bool {
        self.loaded.unsubscribe(id)
    }

    /// Subscribes to window lifecycle events.
    pub fn on_window_event(&mut self, callback: impl FnMut(&WindowEvent) + 'static) -> SubscriptionId {
        self.window_events.subscribe(callback)
    }

    /// Revokes an [`on_window_event`](Self::on_window_event) subscription.
    pub fn unsubscribe_window_event(&mut self, id: SubscriptionId) -> bool {
        self.window_events.unsubscribe(id)
    }

    // -- Effects --

    /// Loads the effect `name` from `loader`. Returns whether it joined the
    /// chain.
    pub fn load_effect(&mut self, loader: &EffectLoader, name: &str) -> bool {
        loader.load(name, self)
    }

    /// Loads every default-enabled effect from `loader`.
    pub fn load_all_effects(&mut self, loader: &EffectLoader) -> usize {
        loader.load_all(self)
    }

    /// Runs an effect's load step and adds it to the chain.
    pub fn add_effect(&mut self, effect: EffectKind) -> Result<EffectId, LoadError> {
        let name = effect.as_effect().name().to_string();
        self.insert_effect(&name, effect)
    }

    /// Removes an effect. Its animations are dropped; its grabs, its
    /// full-screen slot, and its keep-alive references are released.
    pub fn unload_effect(&mut self, id: EffectId) -> bool {
        let Some(mut effect) = self.chain.remove(id) else {
            return false;
        };
        self.cx
            .with_current(id, |cx| effect.as_effect_mut().unload(cx));
        let (grabs_released, windows_freed, held_full_screen) = self.release_effect_state(id);
        self.cx.add_repaint_full();
        self.cx.tracer().effect_unload(&EffectUnloadEvent {
            effect: id,
            grabs_released,
            windows_freed,
            held_full_screen,
        });
        self.release_remnants();
        true
    }

    /// Whether the effect reports live work.
    #[must_use]
    pub fn is_effect_active(&self, id: EffectId) -> Option<bool> {
        self.chain.get(id).map(|e| e.as_effect().is_active())
    }

    // -- Window lifecycle --

    /// Adds a window with the given frame geometry on top of the stack.
    pub fn add_window(&mut self, frame: Rect) -> WindowId {
        let window = self.cx.windows.create_window(frame);
        self.notify(window, WindowEventKind::Added);
        self.chain
            .broadcast(&mut self.cx, |e, cx| e.window_added(cx, window));
        self.release_remnants();
        window
    }

    /// Shows a hidden window.
    pub fn show_window(&mut self, window: WindowId) -> bool {
        if !self.set_flag(window, |f| &mut f.hidden, false) {
            return false;
        }
        self.notify(window, WindowEventKind::Shown);
        self.chain
            .broadcast(&mut self.cx, |e, cx| e.window_shown(cx, window));
        self.release_remnants();
        true
    }

    /// Hides a window without closing it.
    pub fn hide_window(&mut self, window: WindowId) -> bool {
        if !self.set_flag(window, |f| &mut f.hidden, true) {
            return false;
        }
        self.notify(window, WindowEventKind::Hidden);
        self.chain
            .broadcast(&mut self.cx, |e, cx| e.window_hidden(cx, window));
        self.release_remnants();
        true
    }

    /// Minimizes a window.
    pub fn minimize_window(&mut self, window: WindowId) -> bool {
        if !self.set_flag(window, |f| &mut f.minimized, true) {
            return false;
        }
        self.notify(window, WindowEventKind::Minimized);
        self.chain
            .broadcast(&mut self.cx, |e, cx| e.window_minimized(cx, window));
        self.release_remnants();
        true
    }

    /// Restores a minimized window.
    pub fn unminimize_window(&mut self, window: WindowId) -> bool {
        if !self.set_flag(window, |f| &mut f.minimized, false) {
            return false;
        }
        self.notify(window, WindowEventKind::Unminimized);
        self.chain
            .broadcast(&mut self.cx, |e, cx| e.window_unminimized(cx, window));
        self.release_remnants();
        true
    }

    /// Closes a window.
    ///
    /// Effects are told first and may take keep-alive references; the
    /// window then lives on as a remnant until the last reference is
    /// dropped. With no references it is destroyed immediately.
    pub fn close_window(&mut self, window: WindowId) -> bool {
        if !self.cx.windows.mark_closed(window) {
            return false;
        }
        self.notify(window, WindowEventKind::Closed);
        self.chain
            .broadcast(&mut self.cx, |e, cx| e.window_closed(cx, window));
        if self.cx.keep_alive_count(window) == 0 && !self.cx.pending_release.contains(&window) {
            self.cx.pending_release.push(window);
        }
        self.release_remnants();
        true
    }

    /// Switches the current desktop.
    pub fn set_current_desktop(&mut self, desktop: u32) -> bool {
        let from = self.cx.windows.current_desktop();
        if from == desktop {
            return false;
        }
        self.cx.windows.set_current_desktop(desktop);
        self.cx.add_repaint_full();
        self.chain
            .broadcast(&mut self.cx, |e, cx| e.desktop_changed(cx, from, desktop));
        self.release_remnants();
        true
    }

    // -- Drive cycle --

    /// Runs one drive cycle for `tick`.
    ///
    /// Returns [`FrameOutcome::Idle`] without touching the renderer or any
    /// effect when nothing needs painting.
    pub fn paint_frame(&mut self, tick: &FrameTick, renderer: &mut dyn Renderer) -> FrameOutcome {
        self.reap();

        let collect_start = self.now(tick.now);
        let damage = self.cx.windows.collect_damage();
        self.cx.scheduler.add_region(&damage);
        let Some(plan) = self.cx.scheduler.plan(tick, self.cx.config.timebase) else {
            return FrameOutcome::Idle;
        };
        let frame_index = plan.frame_index;
        let begin = FrameBeginEvent::from(&plan);
        let mut summary = FrameSummaryBuilder::new(&begin);
        self.cx.tracer().frame_begin(&begin);
        self.phase_begin(&mut summary, frame_index, PhaseKind::Collect, collect_start);
        #[cfg(feature = "trace-rich")]
        self.trace_damage(&plan);
        let t = self.now(tick.now);
        self.phase_end(&mut summary, frame_index, PhaseKind::Collect, t);

        // -- Screen --
        let t = self.now(tick.now);
        self.phase_begin(&mut summary, frame_index, PhaseKind::Screen, t);
        self.chain.refresh_active();
        let mut screen_pre = ScreenPrePaintData {
            mask: if plan.region.is_full() {
                PaintMask::empty()
            } else {
                PaintMask::SCREEN_REGION
            },
            paint: plan.region.clone(),
        };
        self.chain
            .pre_paint_screen(&mut self.cx, &mut screen_pre, plan.elapsed);

        let order: Vec<WindowId> = self.cx.windows.stacking_order().collect();
        let mut prepared = Vec::with_capacity(order.len());
        for window in order {
            if !self.cx.windows.is_alive(window) {
                continue;
            }
            let mut data = self.window_pre_paint(window, &screen_pre);
            self.chain
                .pre_paint_window(&mut self.cx, window, &mut data, plan.elapsed);
            prepared.push((window, data));
        }

        let mut screen_data = ScreenPaintData::default();
        let screen_request = self.chain.paint_screen(
            &mut self.cx,
            screen_pre.mask,
            &screen_pre.paint,
            &mut screen_data,
        );
        let t = self.now(tick.now);
        self.phase_end(&mut summary, frame_index, PhaseKind::Screen, t);

        // -- Windows --
        self.phase_begin(&mut summary, frame_index, PhaseKind::Windows, t);
        let mut failed = renderer.begin_frame(&plan).is_err();
        let mut painted = 0_u32;
        #[cfg(feature = "trace-rich")]
        let mut records = Vec::new();
        if let Some(request) = screen_request.as_ref().filter(|_| !failed) {
            let screen_rect = self.cx.screen();
            renderer.paint_background(&request.region.resolve(screen_rect), &request.data);
            for (window, pre) in &prepared {
                let window = *window;
                if !pre.is_painted() {
                    continue;
                }
                let Some(bounds) = self.cx.windows.expanded_geometry(window) else {
                    continue;
                };
                let transformed = pre.mask.contains(PaintMask::WINDOW_TRANSFORMED)
                    || request.mask.contains(PaintMask::SCREEN_WITH_TRANSFORMED_WINDOWS);
                if !transformed && !pre.paint.intersects(bounds) {
                    continue;
                }
                let Some((data, quads)) =
                    self.paint_window(window, request.mask | pre.mask, &pre.paint, renderer)
                else {
                    continue;
                };
                painted += 1;
                #[cfg(feature = "trace-rich")]
                records.push(paint_record(window, &data, quads));
                #[cfg(not(feature = "trace-rich"))]
                _ = (data, quads);
            }
        }
        #[cfg(feature = "trace-rich")]
        self.cx.tracer().window_paints(frame_index, &records);
        let t = self.now(tick.now);
        self.phase_end(&mut summary, frame_index, PhaseKind::Windows, t);

        // -- Render --
        self.phase_begin(&mut summary, frame_index, PhaseKind::Render, t);
        for (window, _) in &prepared {
            self.chain.post_paint_window(&mut self.cx, *window);
        }
        self.chain.post_paint_screen(&mut self.cx);
        if !failed {
            failed = renderer.end_frame().is_err();
        }
        let render_end = self.now(tick.now);
        self.phase_end(&mut summary, frame_index, PhaseKind::Render, render_end);

        let outcome = if failed {
            FrameOutcome::Failed
        } else if screen_request.is_none() {
            FrameOutcome::Suppressed
        } else {
            FrameOutcome::Presented
        };
        let paint_cost = render_end.duration_since(collect_start, self.cx.config.timebase);
        self.cx.scheduler.observe(frame_index, outcome, paint_cost);

        self.cx.tracer().frame_end(&FrameEndEvent {
            frame_index,
            outcome,
            windows_painted: painted,
        });
        summary.set_windows_painted(painted);
        summary.set_outcome(outcome);
        self.cx.tracer().frame_summary(&summary.finish());

        self.release_remnants();
        self.reap();
        outcome
    }

    // -- Internal helpers --

    fn insert_effect(&mut self, name: &str, mut effect: EffectKind) -> Result<EffectId, LoadError> {
        let id = self.chain.allocate_id();
        let outcome = match self
            .cx
            .with_current(id, |cx| effect.as_effect_mut().load(cx))
        {
            Ok(()) => {
                self.chain.insert(id, effect);
                Ok(id)
            }
            Err(error) => {
                self.release_effect_state(id);
                self.release_remnants();
                Err(error)
            }
        };
        self.publish(name, outcome.clone());
        outcome
    }

    /// Runs the window's paint, draw, and quad stages and hands the result
    /// to the renderer. Returns the final paint data and quad count, or
    /// `None` if an effect stopped the window.
    fn paint_window(
        &mut self,
        window: WindowId,
        mask: PaintMask,
        region: &Region,
        renderer: &mut dyn Renderer,
    ) -> Option<(WindowPaintData, usize)> {
        let frame = self.cx.windows.frame_geometry(window)?;
        let opacity = self.cx.windows.opacity(window).unwrap_or(1.0);
        let mut data = WindowPaintData::with_opacity(opacity);
        let painted = self
            .chain
            .paint_window(&mut self.cx, window, mask, region, &mut data)?;
        let mut data = painted.data;
        let drawn = self.chain.draw_window(
            &mut self.cx,
            window,
            painted.mask,
            &painted.region,
            &mut data,
        )?;
        let mut quads = QuadList::for_contents(frame.width(), frame.height());
        self.chain.build_quads(&mut self.cx, window, &mut quads);
        renderer.draw_window(window, &quads, &drawn.region, &drawn.data);
        Some((drawn.data, quads.len()))
    }

    /// The pre-paint record a window starts its pre-paint stage with.
    fn window_pre_paint(&self, window: WindowId, screen: &ScreenPrePaintData) -> WindowPrePaintData {
        let windows = &self.cx.windows;
        let opacity = windows.opacity(window).unwrap_or(1.0);
        let flags = windows.flags(window).unwrap_or_default();
        let mut disabled = PaintDisabled::empty();
        disabled.set(PaintDisabled::DELETED, windows.is_closed(window));
        disabled.set(PaintDisabled::MINIMIZED, flags.minimized);
        disabled.set(PaintDisabled::HIDDEN, flags.hidden);
        disabled.set(
            PaintDisabled::DESKTOP,
            !windows.is_on_desktop(window, windows.current_desktop()),
        );
        let mut data = WindowPrePaintData {
            mask: PaintMask::WINDOW_OPAQUE,
            paint: screen.paint.clone(),
            clip: windows
                .frame_geometry(window)
                .map_or(Region::Empty, Region::from_rect),
            disabled,
        };
        if opacity < 1.0 {
            data.set_translucent();
        }
        data
    }

    fn set_flag(
        &mut self,
        window: WindowId,
        field: impl FnOnce(&mut WindowFlags) -> &mut bool,
        value: bool,
    ) -> bool {
        let Some(mut flags) = self.cx.windows.flags(window) else {
            return false;
        };
        let slot = field(&mut flags);
        if *slot == value {
            return false;
        }
        *slot = value;
        self.cx.windows.set_flags(window, flags)
    }

    fn notify(&mut self, window: WindowId, kind: WindowEventKind) {
        let event = WindowEvent { window, kind };
        self.cx.tracer().window(&event);
        self.window_events.emit(&event);
    }

    fn publish(&mut self, name: &str, outcome: Result<EffectId, LoadError>) {
        self.cx.tracer().effect_load(&EffectLoadEvent {
            name,
            effect: outcome.as_ref().ok().copied(),
            error: outcome.as_ref().err(),
        });
        self.loaded.emit(&LoadResult {
            name: name.to_string(),
            outcome,
        });
    }

    /// Drops everything `effect` holds outside its own state. Returns the
    /// number of grabs released, of windows freed, and whether it held the
    /// full-screen slot.
    fn release_effect_state(&mut self, effect: EffectId) -> (u32, u32, bool) {
        let cleared = self.cx.grabs.release_all(&mut self.cx.windows, effect);
        for &(window, role) in &cleared {
            self.cx.tracer().grab(&GrabEvent {
                window,
                role,
                effect,
                action: GrabAction::Released,
            });
        }

        let held_full_screen = self.cx.full_screen.holder() == Some(effect);
        if held_full_screen {
            self.cx.full_screen.clear();
            self.cx.tracer().full_screen(&FullScreenChange {
                previous: Some(effect),
                current: None,
            });
        }

        let freed = self.cx.keep_alive.release_all(effect);
        for &window in &freed {
            if self.cx.windows.is_closed(window) && !self.cx.pending_release.contains(&window) {
                self.cx.pending_release.push(window);
            }
        }
        (count(cleared.len()), count(freed.len()), held_full_screen)
    }

    /// Destroys closed windows nobody keeps alive any more.
    fn release_remnants(&mut self) {
        while !self.cx.pending_release.is_empty() {
            for window in mem::take(&mut self.cx.pending_release) {
                if !self.cx.windows.is_closed(window) || self.cx.keep_alive_count(window) > 0 {
                    continue;
                }
                self.cx.windows.mark_destroyed(window);
                self.cx.keep_alive.forget(window);
                self.chain
                    .broadcast(&mut self.cx, |e, cx| e.window_deleted(cx, window));
                self.notify(window, WindowEventKind::Deleted);
            }
        }
    }

    /// Frees destroyed windows so no stage sees them again.
    fn reap(&mut self) {
        for window in self.cx.windows.reap() {
            self.cx.keep_alive.forget(window);
        }
    }

    fn now(&mut self, fallback: HostTime) -> HostTime {
        self.clock.as_mut().map_or(fallback, |clock| clock())
    }

    fn phase_begin(
        &mut self,
        summary: &mut FrameSummaryBuilder,
        frame_index: u64,
        phase: PhaseKind,
        timestamp: HostTime,
    ) {
        summary.phase_begin(phase, timestamp);
        self.cx.tracer().phase_begin(&PhaseBeginEvent {
            frame_index,
            phase,
            timestamp,
        });
    }

    fn phase_end(
        &mut self,
        summary: &mut FrameSummaryBuilder,
        frame_index: u64,
        phase: PhaseKind,
        timestamp: HostTime,
    ) {
        summary.phase_end(phase, timestamp);
        self.cx.tracer().phase_end(&PhaseEndEvent {
            frame_index,
            phase,
            timestamp,
        });
    }

    #[cfg(feature = "trace-rich")]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "damage rectangles are rounded to whole pixels"
    )]
    fn trace_damage(&mut self, plan: &crate::scheduler::FramePlan) {
        let screen = self.cx.screen();
        let rects: Vec<crate::trace::DamageRect> = plan
            .region
            .resolve(screen)
            .rects()
            .iter()
            .map(|r| {
                let r = r.round();
                crate::trace::DamageRect {
                    x: r.x0 as i32,
                    y: r.y0 as i32,
                    width: r.width() as u32,
                    height: r.height() as u32,
                }
            })
            .collect();
        self.cx.tracer().damage_rects(plan.frame_index, &rects);
    }
}

impl EffectSink for Compositor {
    fn effect_created(&mut self, name: &str, effect: EffectKind) -> bool {
        self.insert_effect(name, effect).is_ok()
    }

    fn effect_failed(&mut self, name: &str, error: LoadError) {
        self.publish(name, Err(error));
    }
}

#[cfg(feature = "trace-rich")]
#[expect(
    clippy::cast_possible_truncation,
    reason = "opacity is a display value and quad counts are small"
)]
fn paint_record(window: WindowId, data: &WindowPaintData, quads: usize) -> crate::trace::WindowPaintRecord {
    crate::trace::WindowPaintRecord {
        window_index: window.index(),
        opacity: data.opacity as f32,
        transformed: data.is_transformed(),
        quads: quads as u32,
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "per-effect grab and window counts are far below u32::MAX"
)]
fn count(n: usize) -> u32 {
    n as u32
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::{format, vec};
    use core::cell::RefCell;

    use super::*;
    use crate::animation::{AnimationEngine, AnimationRequest, Attribute};
    use crate::effect::Effect;
    use crate::effect::stage::{self, Next};
    use crate::error::RenderError;
    use crate::scheduler::FramePlan;
    use crate::time::Duration;
    use crate::window::DataRole;

    // -- Test doubles --

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        Begin(u64),
        Background,
        Draw(WindowId, f64),
        End,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        fail_end: bool,
    }

    impl Recorder {
        fn drawn(&self) -> Vec<WindowId> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Draw(w, _) => Some(*w),
                    _ => None,
                })
                .collect()
        }
    }

    impl Renderer for Recorder {
        fn begin_frame(&mut self, plan: &FramePlan) -> Result<(), RenderError> {
            self.calls.push(Call::Begin(plan.frame_index));
            Ok(())
        }

        fn paint_background(&mut self, _: &Region, _: &ScreenPaintData) {
            self.calls.push(Call::Background);
        }

        fn draw_window(&mut self, w: WindowId, _: &QuadList, _: &Region, data: &WindowPaintData) {
            self.calls.push(Call::Draw(w, data.opacity));
        }

        fn end_frame(&mut self) -> Result<(), RenderError> {
            self.calls.push(Call::End);
            if self.fail_end {
                Err(RenderError::ContextLost)
            } else {
                Ok(())
            }
        }
    }

    /// Fades windows out on close, keeping them alive meanwhile.
    struct FadeOut {
        engine: AnimationEngine,
        duration: Duration,
    }

    impl FadeOut {
        fn new(ms: u64) -> Self {
            Self {
                engine: AnimationEngine::new(),
                duration: Duration::from_millis(ms),
            }
        }
    }

    impl Effect for FadeOut {
        fn name(&self) -> &str {
            "fade-out"
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
            w: WindowId,
            data: &mut WindowPrePaintData,
            elapsed: Duration,
            next: Next<'_, stage::PrePaintWindow>,
        ) {
            self.engine.pre_paint_window(cx, w, data);
            next.pre_paint_window(cx, w, data, elapsed);
        }

        fn paint_window(
            &mut self,
            cx: &mut EffectContext,
            w: WindowId,
            mask: PaintMask,
            region: &Region,
            data: &mut WindowPaintData,
            next: Next<'_, stage::PaintWindow>,
        ) {
            self.engine.paint_window(cx, w, data);
            next.paint_window(cx, w, mask, region, data);
        }

        fn post_paint_screen(&mut self, cx: &mut EffectContext, next: Next<'_, stage::PostPaintScreen>) {
            self.engine.post_paint_screen(cx);
            next.post_paint_screen(cx);
        }

        fn window_closed(&mut self, cx: &mut EffectContext, w: WindowId) {
            if !cx.grab_window(w, DataRole::WINDOW_CLOSED_GRAB, false) {
                return;
            }
            let fade = AnimationRequest::new(Attribute::Opacity, 0.0.into(), self.duration);
            self.engine.animate(cx, w, fade);
        }
    }

    /// Refuses to forward the screen paint.
    struct Blackout;

    impl Effect for Blackout {
        fn name(&self) -> &str {
            "blackout"
        }

        fn paint_screen(
            &mut self,
            _: &mut EffectContext,
            _: PaintMask,
            _: &Region,
            _: &mut ScreenPaintData,
            _: Next<'_, stage::PaintScreen>,
        ) {
        }
    }

    /// Logs every stage it sees.
    struct StageLog(Rc<RefCell<Vec<String>>>);

    impl StageLog {
        fn log(&self, s: String) {
            self.0.borrow_mut().push(s);
        }
    }

    impl Effect for StageLog {
        fn name(&self) -> &str {
            "stage-log"
        }

        fn pre_paint_screen(
            &mut self,
            cx: &mut EffectContext,
            data: &mut ScreenPrePaintData,
            elapsed: Duration,
            next: Next<'_, stage::PrePaintScreen>,
        ) {
            self.log("pre_screen".into());
            next.pre_paint_screen(cx, data, elapsed);
        }

        fn paint_screen(
            &mut self,
            cx: &mut EffectContext,
            mask: PaintMask,
            region: &Region,
            data: &mut ScreenPaintData,
            next: Next<'_, stage::PaintScreen>,
        ) {
            self.log("screen".into());
            next.paint_screen(cx, mask, region, data);
        }

        fn post_paint_screen(&mut self, cx: &mut EffectContext, next: Next<'_, stage::PostPaintScreen>) {
            self.log("post_screen".into());
            next.post_paint_screen(cx);
        }

        fn pre_paint_window(
            &mut self,
            cx: &mut EffectContext,
            w: WindowId,
            data: &mut WindowPrePaintData,
            elapsed: Duration,
            next: Next<'_, stage::PrePaintWindow>,
        ) {
            self.log(format!("pre_window:{}", w.index()));
            next.pre_paint_window(cx, w, data, elapsed);
        }

        fn paint_window(
            &mut self,
            cx: &mut EffectContext,
            w: WindowId,
            mask: PaintMask,
            region: &Region,
            data: &mut WindowPaintData,
            next: Next<'_, stage::PaintWindow>,
        ) {
            self.log(format!("window:{}", w.index()));
            next.paint_window(cx, w, mask, region, data);
        }

        fn draw_window(
            &mut self,
            cx: &mut EffectContext,
            w: WindowId,
            mask: PaintMask,
            region: &Region,
            data: &mut WindowPaintData,
            next: Next<'_, stage::DrawWindow>,
        ) {
            self.log(format!("draw:{}", w.index()));
            next.draw_window(cx, w, mask, region, data);
        }

        fn build_quads(
            &mut self,
            cx: &mut EffectContext,
            w: WindowId,
            quads: &mut QuadList,
            next: Next<'_, stage::BuildQuads>,
        ) {
            self.log(format!("quads:{}", w.index()));
            next.build_quads(cx, w, quads);
        }

        fn post_paint_window(
            &mut self,
            cx: &mut EffectContext,
            w: WindowId,
            next: Next<'_, stage::PostPaintWindow>,
        ) {
            self.log(format!("post_window:{}", w.index()));
            next.post_paint_window(cx, w);
        }
    }

    // -- Helpers --

    fn tick(i: u64) -> FrameTick {
        FrameTick::new(i, HostTime(i * 16_000_000))
    }

    fn rect() -> Rect {
        Rect::new(10.0, 10.0, 110.0, 110.0)
    }

    // -- Tests --

    #[test]
    fn first_frame_paints_everything_then_goes_idle() {
        let mut comp = Compositor::default();
        let a = comp.add_window(rect());
        let b = comp.add_window(Rect::new(500.0, 500.0, 600.0, 600.0));
        let mut r = Recorder::default();

        assert_eq!(comp.paint_frame(&tick(1), &mut r), FrameOutcome::Presented);
        assert_eq!(r.drawn(), [a, b], "bottom to top");
        assert_eq!(r.calls.first(), Some(&Call::Begin(1)));
        assert_eq!(r.calls.get(1), Some(&Call::Background));
        assert_eq!(r.calls.last(), Some(&Call::End));

        let mut idle = Recorder::default();
        assert_eq!(comp.paint_frame(&tick(2), &mut idle), FrameOutcome::Idle);
        assert!(idle.calls.is_empty(), "idle ticks never reach the renderer");
    }

    #[test]
    fn damage_limits_the_windows_painted() {
        let mut comp = Compositor::default();
        let a = comp.add_window(rect());
        let _b = comp.add_window(Rect::new(500.0, 500.0, 600.0, 600.0));
        comp.paint_frame(&tick(1), &mut Recorder::default());

        comp.windows_mut().add_damage(a, Rect::new(0.0, 0.0, 5.0, 5.0));
        let mut r = Recorder::default();
        assert_eq!(comp.paint_frame(&tick(2), &mut r), FrameOutcome::Presented);
        assert_eq!(r.drawn(), [a], "b lies outside the damage");
    }

    #[test]
    fn stages_run_in_pipeline_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut comp = Compositor::default();
        comp.add_effect(EffectKind::native(StageLog(Rc::clone(&log))))
            .expect("loads");
        let a = comp.add_window(rect());
        let b = comp.add_window(rect());
        comp.paint_frame(&tick(1), &mut Recorder::default());

        let (a, b) = (a.index(), b.index());
        let expected: Vec<String> = vec![
            String::from("pre_screen"),
            format!("pre_window:{a}"),
            format!("pre_window:{b}"),
            String::from("screen"),
            format!("window:{a}"),
            format!("draw:{a}"),
            format!("quads:{a}"),
            format!("window:{b}"),
            format!("draw:{b}"),
            format!("quads:{b}"),
            format!("post_window:{a}"),
            format!("post_window:{b}"),
            String::from("post_screen"),
        ];
        assert_eq!(*log.borrow(), expected);
    }

    #[test]
    fn suppressed_frames_draw_nothing_and_consume_damage() {
        let mut comp = Compositor::default();
        comp.add_window(rect());
        comp.add_effect(EffectKind::native(Blackout)).expect("loads");
        let mut r = Recorder::default();

        assert_eq!(comp.paint_frame(&tick(1), &mut r), FrameOutcome::Suppressed);
        assert_eq!(r.calls, [Call::Begin(1), Call::End]);
        assert_eq!(
            comp.paint_frame(&tick(2), &mut Recorder::default()),
            FrameOutcome::Idle
        );
    }

    #[test]
    fn failed_frames_keep_their_damage() {
        let mut comp = Compositor::default();
        let w = comp.add_window(rect());
        let mut broken = Recorder {
            fail_end: true,
            ..Recorder::default()
        };
        assert_eq!(comp.paint_frame(&tick(1), &mut broken), FrameOutcome::Failed);

        let mut r = Recorder::default();
        assert_eq!(comp.paint_frame(&tick(2), &mut r), FrameOutcome::Presented);
        assert_eq!(r.drawn(), [w], "retried on the next tick");
    }

    #[test]
    fn closing_without_interest_destroys_immediately() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut comp = Compositor::default();
        let e = Rc::clone(&events);
        comp.on_window_event(move |ev| e.borrow_mut().push(ev.kind));
        let w = comp.add_window(rect());

        assert!(comp.close_window(w));
        assert_eq!(
            *events.borrow(),
            [
                WindowEventKind::Added,
                WindowEventKind::Closed,
                WindowEventKind::Deleted
            ]
        );
        let mut r = Recorder::default();
        comp.paint_frame(&tick(1), &mut r);
        assert!(r.drawn().is_empty());
        assert!(comp.windows().is_empty(), "reaped before dispatch");
    }

    #[test]
    fn keep_alive_defers_destruction_until_the_fade_ends() {
        let mut comp = Compositor::default();
        let fade = comp
            .add_effect(EffectKind::native(FadeOut::new(100)))
            .expect("loads");
        let w = comp.add_window(rect());
        comp.paint_frame(&tick(0), &mut Recorder::default());

        assert!(comp.close_window(w));
        assert!(comp.windows().is_alive(w), "kept alive as a remnant");
        assert_eq!(comp.context().keep_alive_count(w), 1);
        assert_eq!(
            comp.context().is_grabbed(w, DataRole::WINDOW_CLOSED_GRAB),
            Some(fade)
        );

        let mut r = Recorder::default();
        comp.paint_frame(&tick(1), &mut r);
        assert_eq!(r.drawn(), [w], "remnant painted while fading");
        comp.paint_frame(&tick(4), &mut Recorder::default());
        assert!(comp.windows().is_alive(w), "64ms into a 100ms fade");

        let mut last = Recorder::default();
        comp.paint_frame(&tick(8), &mut last);
        assert!(!comp.windows().is_alive(w), "released when the fade finished");
        assert_eq!(comp.is_effect_active(fade), Some(false));
    }

    #[test]
    fn unloading_releases_everything_the_effect_held() {
        let mut comp = Compositor::default();
        let fade = comp
            .add_effect(EffectKind::native(FadeOut::new(1000)))
            .expect("loads");
        let w = comp.add_window(rect());
        comp.close_window(w);
        assert_eq!(comp.context().keep_alive_count(w), 1);
        assert!(
            comp.context_mut()
                .with_current(fade, |cx| cx.set_active_full_screen_effect(Some(fade))),
            "slot was free"
        );

        assert!(comp.unload_effect(fade));
        assert!(!comp.windows().is_alive(w), "freed remnant destroyed");
        assert_eq!(comp.context().active_full_screen_effect(), None);
        assert_eq!(comp.context().is_grabbed(w, DataRole::WINDOW_CLOSED_GRAB), None);
        assert!(comp.chain().is_empty());
        assert!(!comp.unload_effect(fade), "already gone");
    }

    #[test]
    fn failed_loads_are_excluded_and_published() {
        struct Broken;
        impl Effect for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            fn load(&mut self, _: &mut EffectContext) -> Result<(), LoadError> {
                Err(LoadError::Unsupported("shaders"))
            }
        }

        let results = Rc::new(RefCell::new(Vec::new()));
        let mut comp = Compositor::default();
        let sink = Rc::clone(&results);
        comp.on_effect_loaded(move |r| sink.borrow_mut().push(r.clone()));

        let mut loader = EffectLoader::new();
        loader.register(crate::effect::EffectFactory::new("broken", || {
            Ok(EffectKind::native(Broken))
        }));
        loader.register(crate::effect::EffectFactory::new("blackout", || {
            Ok(EffectKind::native(Blackout))
        }));

        assert_eq!(comp.load_all_effects(&loader), 1);
        assert!(!comp.load_effect(&loader, "missing"));
        assert_eq!(comp.chain().len(), 1);
        let results = results.borrow();
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].outcome,
            Err(LoadError::Unsupported("shaders")),
            "load step failure"
        );
        assert!(results[1].is_loaded());
        assert_eq!(
            results[2].outcome,
            Err(LoadError::Unknown("missing".into()))
        );
    }

    #[test]
    fn animations_keep_frames_coming_until_done() {
        let mut comp = Compositor::default();
        comp.add_effect(EffectKind::native(FadeOut::new(100)))
            .expect("loads");
        let w = comp.add_window(rect());
        comp.paint_frame(&tick(0), &mut Recorder::default());
        comp.close_window(w);

        let mut frames = 0;
        let mut i = 1;
        while comp.paint_frame(&tick(i), &mut Recorder::default()) != FrameOutcome::Idle {
            frames += 1;
            i += 1;
            assert!(i < 100, "animation never settled");
        }
        assert!(frames >= 7, "one frame per tick for 100ms at 16ms");
        assert!(!comp.windows().is_alive(w));
    }

    #[test]
    fn minimized_and_hidden_windows_are_skipped() {
        let mut comp = Compositor::default();
        let a = comp.add_window(rect());
        let b = comp.add_window(rect());
        let c = comp.add_window(rect());
        assert!(comp.minimize_window(a));
        assert!(!comp.minimize_window(a), "already minimized");
        assert!(comp.hide_window(b));
        let mut r = Recorder::default();
        comp.paint_frame(&tick(1), &mut r);
        assert_eq!(r.drawn(), [c]);

        assert!(comp.unminimize_window(a));
        assert!(comp.show_window(b));
        let mut r = Recorder::default();
        comp.paint_frame(&tick(2), &mut r);
        assert_eq!(r.drawn(), [a, b, c]);
    }

    #[test]
    fn other_desktops_are_not_painted() {
        let mut comp = Compositor::default();
        let here = comp.add_window(rect());
        let there = comp.add_window(rect());
        comp.windows_mut().set_desktop(here, Some(1));
        comp.windows_mut().set_desktop(there, Some(2));

        let mut r = Recorder::default();
        comp.paint_frame(&tick(1), &mut r);
        assert_eq!(r.drawn(), [here]);

        assert!(comp.set_current_desktop(2));
        assert!(!comp.set_current_desktop(2), "no change");
        let mut r = Recorder::default();
        comp.paint_frame(&tick(2), &mut r);
        assert_eq!(r.drawn(), [there]);
    }

    #[test]
    fn translucent_windows_pass_their_opacity() {
        let mut comp = Compositor::default();
        let w = comp.add_window(rect());
        comp.windows_mut().set_opacity(w, 0.5);
        let mut r = Recorder::default();
        comp.paint_frame(&tick(1), &mut r);
        assert_eq!(r.calls[2], Call::Draw(w, 0.5));
    }
}
