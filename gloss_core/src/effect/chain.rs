// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The ordered list of loaded effects.

use alloc::vec::Vec;

use super::stage::{self, Next, ScreenRequest, WindowRequest};
use super::{Effect, EffectId, EffectKind, EffectSlot};
use crate::context::EffectContext;
use crate::paint::{PaintMask, ScreenPaintData, ScreenPrePaintData, WindowPaintData, WindowPrePaintData};
use crate::quad::QuadList;
use crate::region::Region;
use crate::time::Duration;
use crate::window::WindowId;

/// Loaded effects, sorted by [`Effect::ordering`] and then by id.
///
/// Each stage entry point walks the slots that were active at the last
/// [`refresh_active`](Self::refresh_active); lifecycle broadcasts reach
/// every slot.
#[derive(Debug, Default)]
pub struct EffectChain {
    slots: Vec<EffectSlot>,
    next_id: u32,
}

impl EffectChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Membership --

    /// Hands out the id for the next effect to load.
    pub(crate) fn allocate_id(&mut self) -> EffectId {
        self.next_id += 1;
        EffectId(self.next_id)
    }

    /// Inserts an effect at its ordering position. The ordering is read
    /// once, here.
    pub fn insert(&mut self, id: EffectId, effect: EffectKind) {
        let key = (effect.as_effect().ordering(), id);
        let at = self
            .slots
            .partition_point(|s| (s.effect.as_effect().ordering(), s.id) <= key);
        let active = effect.as_effect().is_active();
        self.slots.insert(at, EffectSlot { id, effect, active });
    }

    /// Removes an effect and returns it.
    pub fn remove(&mut self, id: EffectId) -> Option<EffectKind> {
        let at = self.slots.iter().position(|s| s.id == id)?;
        Some(self.slots.remove(at).effect)
    }

    /// Number of loaded effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no effect is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `id` is loaded.
    #[must_use]
    pub fn contains(&self, id: EffectId) -> bool {
        self.slots.iter().any(|s| s.id == id)
    }

    /// The effect with `id`.
    #[must_use]
    pub fn get(&self, id: EffectId) -> Option<&EffectKind> {
        self.slots.iter().find(|s| s.id == id).map(|s| &s.effect)
    }

    /// The effect with `id`, mutably.
    pub fn get_mut(&mut self, id: EffectId) -> Option<&mut EffectKind> {
        self.slots
            .iter_mut()
            .find(|s| s.id == id)
            .map(|s| &mut s.effect)
    }

    /// Finds a loaded effect by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<EffectId> {
        self.slots
            .iter()
            .find(|s| s.effect.as_effect().name() == name)
            .map(|s| s.id)
    }

    /// Slots in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = &EffectSlot> + '_ {
        self.slots.iter()
    }

    // -- Activity --

    /// Re-reads [`Effect::is_active`] for every slot. Called once per frame
    /// before the first stage.
    pub fn refresh_active(&mut self) {
        for slot in &mut self.slots {
            slot.active = slot.effect.as_effect().is_active();
        }
    }

    /// Whether any loaded effect reports live work right now.
    #[must_use]
    pub fn any_active(&self) -> bool {
        self.slots.iter().any(|s| s.effect.as_effect().is_active())
    }

    // -- Stage entry points --

    /// Runs `pre_paint_screen` through the chain.
    pub fn pre_paint_screen(
        &mut self,
        cx: &mut EffectContext,
        data: &mut ScreenPrePaintData,
        elapsed: Duration,
    ) {
        Next::<stage::PrePaintScreen>::new(&mut self.slots, &mut ())
            .pre_paint_screen(cx, data, elapsed);
    }

    /// Runs `paint_screen` through the chain. Returns `None` if an effect
    /// stopped the stage.
    pub fn paint_screen(
        &mut self,
        cx: &mut EffectContext,
        mask: PaintMask,
        region: &Region,
        data: &mut ScreenPaintData,
    ) -> Option<ScreenRequest> {
        let mut terminal = None;
        Next::<stage::PaintScreen>::new(&mut self.slots, &mut terminal)
            .paint_screen(cx, mask, region, data);
        terminal
    }

    /// Runs `post_paint_screen` through the chain.
    pub fn post_paint_screen(&mut self, cx: &mut EffectContext) {
        Next::<stage::PostPaintScreen>::new(&mut self.slots, &mut ()).post_paint_screen(cx);
    }

    /// Runs `pre_paint_window` through the chain.
    pub fn pre_paint_window(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        data: &mut WindowPrePaintData,
        elapsed: Duration,
    ) {
        Next::<stage::PrePaintWindow>::new(&mut self.slots, &mut ())
            .pre_paint_window(cx, window, data, elapsed);
    }

    /// Runs `paint_window` through the chain. Returns `None` if an effect
    /// stopped the stage.
    pub fn paint_window(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        mask: PaintMask,
        region: &Region,
        data: &mut WindowPaintData,
    ) -> Option<WindowRequest> {
        let mut terminal = None;
        Next::<stage::PaintWindow>::new(&mut self.slots, &mut terminal)
            .paint_window(cx, window, mask, region, data);
        terminal
    }

    /// Runs `post_paint_window` through the chain.
    pub fn post_paint_window(&mut self, cx: &mut EffectContext, window: WindowId) {
        Next::<stage::PostPaintWindow>::new(&mut self.slots, &mut ())
            .post_paint_window(cx, window);
    }

    /// Runs `draw_window` through the chain. Returns `None` if an effect
    /// stopped the stage.
    pub fn draw_window(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        mask: PaintMask,
        region: &Region,
        data: &mut WindowPaintData,
    ) -> Option<WindowRequest> {
        let mut terminal = None;
        Next::<stage::DrawWindow>::new(&mut self.slots, &mut terminal)
            .draw_window(cx, window, mask, region, data);
        terminal
    }

    /// Runs `build_quads` through the chain.
    pub fn build_quads(&mut self, cx: &mut EffectContext, window: WindowId, quads: &mut QuadList) {
        Next::<stage::BuildQuads>::new(&mut self.slots, &mut ())
            .build_quads(cx, window, quads);
    }

    // -- Lifecycle --

    /// Calls `f` on every loaded effect in chain order, active or not.
    pub fn broadcast(
        &mut self,
        cx: &mut EffectContext,
        mut f: impl FnMut(&mut dyn Effect, &mut EffectContext),
    ) {
        for slot in &mut self.slots {
            let effect = slot.effect.as_effect_mut();
            cx.with_current(slot.id, |cx| f(effect, cx));
        }
    }
}
