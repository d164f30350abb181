// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-session context handed to every effect hook.
//!
//! [`EffectContext`] is the single owner of the shared compositing state:
//! the window list, the frame scheduler, and the three arbitration tables.
//! Effects never hold a reference to it between calls; the compositor
//! passes `&mut EffectContext` into each stage and lifecycle hook.
//!
//! Requests that need an owner (grabs, the full-screen slot, keep-alive
//! references) are attributed to the *current* effect, the one whose hook
//! is running. The chain sets it on entry to each hook and restores the
//! previous value on exit, so nested dispatch attributes correctly.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Rect;

use crate::animation::AnimationId;
use crate::arbitration::{FullScreenChange, FullScreenSlot, GrabOutcome, GrabTable, KeepAliveRegistry, UngrabOutcome};
use crate::config::CompositorConfig;
use crate::effect::EffectId;
use crate::scheduler::FrameScheduler;
use crate::trace::{GrabAction, GrabEvent, KeepAliveAction, KeepAliveEvent, TraceSink, Tracer};
use crate::window::{DataRole, DataValue, WindowId, WindowStore};

/// Shared state for one compositor session.
pub struct EffectContext {
    pub(crate) windows: WindowStore,
    pub(crate) scheduler: FrameScheduler,
    pub(crate) config: CompositorConfig,
    pub(crate) grabs: GrabTable,
    pub(crate) full_screen: FullScreenSlot,
    pub(crate) keep_alive: KeepAliveRegistry,
    current: Option<EffectId>,
    sink: Option<Box<dyn TraceSink>>,
    /// Closed windows whose last keep-alive reference was dropped.
    pub(crate) pending_release: Vec<WindowId>,
    next_animation: u64,
}

impl fmt::Debug for EffectContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectContext")
            .field("windows", &self.windows.len())
            .field("current", &self.current)
            .field("full_screen", &self.full_screen.holder())
            .field("pending_release", &self.pending_release)
            .finish_non_exhaustive()
    }
}

impl EffectContext {
    /// Creates a context with an empty window list.
    #[must_use]
    pub fn new(config: CompositorConfig) -> Self {
        Self {
            windows: WindowStore::new(),
            scheduler: FrameScheduler::new(config.scheduler),
            config,
            grabs: GrabTable::new(),
            full_screen: FullScreenSlot::new(),
            keep_alive: KeepAliveRegistry::new(),
            current: None,
            sink: None,
            pending_release: Vec::new(),
            next_animation: 0,
        }
    }

    // -- Accessors --

    /// The window list.
    #[must_use]
    pub fn windows(&self) -> &WindowStore {
        &self.windows
    }

    /// The window list, for the window manager and for tests.
    pub fn windows_mut(&mut self) -> &mut WindowStore {
        &mut self.windows
    }

    /// The frame scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// The global animation speed factor.
    #[must_use]
    pub fn animation_speed(&self) -> f64 {
        self.config.animation_speed
    }

    /// The output rectangle.
    #[must_use]
    pub fn screen(&self) -> Rect {
        self.config.screen
    }

    /// The effect whose hook is running, if any.
    #[must_use]
    pub fn current_effect(&self) -> Option<EffectId> {
        self.current
    }

    /// Runs `f` with `effect` as the current effect, then restores the
    /// previous one.
    pub fn with_current<R>(&mut self, effect: EffectId, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.current.replace(effect);
        let out = f(self);
        self.current = previous;
        out
    }

    /// Allocates a session-unique animation id.
    pub fn next_animation_id(&mut self) -> AnimationId {
        self.next_animation += 1;
        AnimationId(self.next_animation)
    }

    // -- Side data --

    /// Reads a side-data slot.
    #[must_use]
    pub fn data(&self, window: WindowId, role: DataRole) -> Option<&DataValue> {
        self.windows.data(window, role)
    }

    /// Writes a side-data slot; `None` clears it.
    pub fn set_data(&mut self, window: WindowId, role: DataRole, value: Option<DataValue>) -> bool {
        self.windows.set_data(window, role, value)
    }

    // -- Grabs --

    /// Takes `role` on `window` for the current effect.
    ///
    /// Fails if another effect holds it, unless `force` is set. A forced
    /// grab displaces the holder without telling it.
    pub fn grab_window(&mut self, window: WindowId, role: DataRole, force: bool) -> bool {
        let Some(effect) = self.current else {
            return false;
        };
        let outcome = self
            .grabs
            .grab(&mut self.windows, window, role, effect, force);
        let action = match outcome {
            GrabOutcome::Acquired => GrabAction::Acquired,
            GrabOutcome::Refused { holder } => GrabAction::Refused { holder },
            GrabOutcome::Stolen { previous } => GrabAction::Stolen { previous },
            GrabOutcome::NoWindow => return false,
        };
        self.tracer().grab(&GrabEvent {
            window,
            role,
            effect,
            action,
        });
        outcome.is_granted()
    }

    /// Clears `role` on `window` if the current effect holds it.
    pub fn ungrab_window(&mut self, window: WindowId, role: DataRole) -> bool {
        let Some(effect) = self.current else {
            return false;
        };
        match self.grabs.ungrab(&mut self.windows, window, role, effect) {
            UngrabOutcome::Released => {
                self.tracer().grab(&GrabEvent {
                    window,
                    role,
                    effect,
                    action: GrabAction::Released,
                });
                true
            }
            UngrabOutcome::NotHeld | UngrabOutcome::HeldByOther(_) => false,
        }
    }

    /// Returns the effect holding `role` on `window`.
    #[must_use]
    pub fn is_grabbed(&self, window: WindowId, role: DataRole) -> Option<EffectId> {
        GrabTable::holder(&self.windows, window, role)
    }

    // -- Full-screen slot --

    /// Hands the full-screen slot to `effect`, or releases it with `None`.
    ///
    /// Acquiring fails while another effect holds the slot. Releasing is
    /// honored only for the current effect when it is the holder; releasing
    /// an empty slot succeeds.
    pub fn set_active_full_screen_effect(&mut self, effect: Option<EffectId>) -> bool {
        let previous = self.full_screen.holder();
        let ok = match (effect, self.current) {
            (Some(e), _) => self.full_screen.acquire(e),
            (None, Some(current)) => self.full_screen.release(current),
            (None, None) => previous.is_none(),
        };
        let current = self.full_screen.holder();
        if current != previous {
            self.tracer()
                .full_screen(&FullScreenChange { previous, current });
            self.scheduler.add_repaint_full();
        }
        ok
    }

    /// The effect holding the full-screen slot.
    #[must_use]
    pub fn active_full_screen_effect(&self) -> Option<EffectId> {
        self.full_screen.holder()
    }

    /// Subscribes to full-screen slot changes.
    pub fn on_full_screen_change(
        &mut self,
        callback: impl FnMut(&FullScreenChange) + 'static,
    ) -> crate::signal::SubscriptionId {
        self.full_screen.on_change(callback)
    }

    // -- Keep-alive --

    /// Adds a keep-alive reference to `window` for the current effect.
    pub fn acquire_keep_alive(&mut self, window: WindowId) -> bool {
        let Some(effect) = self.current else {
            return false;
        };
        if !self.windows.is_alive(window) {
            return false;
        }
        let count = self.keep_alive.acquire(window, effect);
        self.pending_release.retain(|&w| w != window);
        self.tracer().keep_alive(&KeepAliveEvent {
            window,
            effect,
            action: KeepAliveAction::Acquired,
            count,
        });
        true
    }

    /// Drops one of the current effect's keep-alive references on
    /// `window`. A closed window whose count reaches zero is released at
    /// the end of the frame.
    pub fn release_keep_alive(&mut self, window: WindowId) -> bool {
        let Some(effect) = self.current else {
            return false;
        };
        let Some(count) = self.keep_alive.release(window, effect) else {
            return false;
        };
        self.tracer().keep_alive(&KeepAliveEvent {
            window,
            effect,
            action: KeepAliveAction::Released,
            count,
        });
        if count == 0 && self.windows.is_closed(window) && !self.pending_release.contains(&window)
        {
            self.pending_release.push(window);
        }
        true
    }

    /// Total keep-alive references on `window`.
    #[must_use]
    pub fn keep_alive_count(&self, window: WindowId) -> u32 {
        self.keep_alive.count(window)
    }

    // -- Repaints --

    /// Requests a repaint of the whole output.
    pub fn add_repaint_full(&mut self) {
        self.scheduler.add_repaint_full();
    }

    /// Requests a repaint of `rect` in screen coordinates.
    pub fn add_screen_repaint(&mut self, rect: Rect) {
        self.scheduler.add_rect(rect);
    }

    /// Requests a repaint of `rect` in window-local coordinates.
    pub fn add_repaint(&mut self, window: WindowId, rect: Rect) -> bool {
        self.windows.add_repaint(window, rect)
    }

    /// Requests a repaint of the whole window.
    pub fn repaint_window(&mut self, window: WindowId) -> bool {
        self.windows.add_repaint_full(window)
    }

    // -- Tracing --

    /// Installs a trace sink, returning the previous one.
    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) -> Option<Box<dyn TraceSink>> {
        core::mem::replace(&mut self.sink, sink)
    }

    /// Returns a tracer over the installed sink.
    pub fn tracer(&mut self) -> Tracer<'_> {
        match &mut self.sink {
            Some(sink) => Tracer::new(sink.as_mut()),
            None => Tracer::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (EffectContext, WindowId) {
        let mut cx = EffectContext::new(CompositorConfig::desktop());
        let w = cx.windows_mut().create_window(Rect::new(0.0, 0.0, 100.0, 100.0));
        (cx, w)
    }

    const A: EffectId = EffectId(1);
    const B: EffectId = EffectId(2);

    #[test]
    fn requests_without_a_current_effect_fail() {
        let (mut cx, w) = setup();
        assert!(!cx.grab_window(w, DataRole::WINDOW_CLOSED_GRAB, false));
        assert!(!cx.acquire_keep_alive(w));
        assert!(cx.set_active_full_screen_effect(None), "empty slot releases");
    }

    #[test]
    fn current_effect_nests_and_restores() {
        let (mut cx, _) = setup();
        cx.with_current(A, |cx| {
            assert_eq!(cx.current_effect(), Some(A));
            cx.with_current(B, |cx| assert_eq!(cx.current_effect(), Some(B)));
            assert_eq!(cx.current_effect(), Some(A), "restored after nesting");
        });
        assert_eq!(cx.current_effect(), None);
    }

    #[test]
    fn forced_grab_replaces_the_owner() {
        let (mut cx, w) = setup();
        let role = DataRole::WINDOW_ADDED_GRAB;
        assert!(cx.with_current(A, |cx| cx.grab_window(w, role, false)));
        assert!(!cx.with_current(B, |cx| cx.grab_window(w, role, false)));
        assert_eq!(cx.is_grabbed(w, role), Some(A));
        assert!(cx.with_current(B, |cx| cx.grab_window(w, role, true)));
        assert_eq!(
            cx.data(w, role).and_then(DataValue::as_effect),
            Some(B),
            "new owner visible through side data"
        );
        assert!(
            !cx.with_current(A, |cx| cx.ungrab_window(w, role)),
            "displaced owner cannot clear it"
        );
        assert!(cx.with_current(B, |cx| cx.ungrab_window(w, role)));
        assert_eq!(cx.is_grabbed(w, role), None);
    }

    #[test]
    fn only_the_holder_releases_the_slot() {
        let (mut cx, _) = setup();
        assert!(cx.with_current(A, |cx| cx.set_active_full_screen_effect(Some(A))));
        assert!(!cx.with_current(B, |cx| cx.set_active_full_screen_effect(Some(B))));
        assert!(!cx.with_current(B, |cx| cx.set_active_full_screen_effect(None)));
        assert_eq!(cx.active_full_screen_effect(), Some(A));
        assert!(cx.with_current(A, |cx| cx.set_active_full_screen_effect(None)));
        assert_eq!(cx.active_full_screen_effect(), None);
    }

    #[test]
    fn last_release_of_a_closed_window_queues_it() {
        let (mut cx, w) = setup();
        cx.with_current(A, |cx| assert!(cx.acquire_keep_alive(w)));
        cx.with_current(B, |cx| assert!(cx.acquire_keep_alive(w)));
        cx.windows_mut().mark_closed(w);

        cx.with_current(A, |cx| assert!(cx.release_keep_alive(w)));
        assert!(cx.pending_release.is_empty(), "B still holds it");
        cx.with_current(B, |cx| assert!(cx.release_keep_alive(w)));
        assert_eq!(cx.pending_release, [w]);
        assert!(
            !cx.with_current(B, |cx| cx.release_keep_alive(w)),
            "nothing left to release"
        );
    }

    #[test]
    fn animation_ids_are_unique() {
        let (mut cx, _) = setup();
        let a = cx.next_animation_id();
        let b = cx.next_animation_id();
        assert_ne!(a, b, "fresh id per call");
    }
}
