// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stage markers and the forward primitive.
//!
//! Every stage hook receives a [`Next`] for its stage: the rest of the
//! chain after the running effect, plus the stage's terminal. Calling the
//! stage method on it (for example [`Next::paint_window`]) consumes it, so
//! an effect can forward at most once and can never re-enter the stage it
//! is in. Dropping it without calling stops the stage at this effect.
//!
//! When the walk runs past the last active effect the call lands in the
//! terminal. Stages whose data is mutated in place have a `()` terminal;
//! paint and draw stages record a request that tells the compositor the
//! call got through, and with which arguments.

use core::fmt;
use core::marker::PhantomData;

use super::{EffectId, EffectSlot};
use crate::context::EffectContext;
use crate::paint::{PaintMask, ScreenPaintData, ScreenPrePaintData, WindowPaintData, WindowPrePaintData};
use crate::quad::QuadList;
use crate::region::Region;
use crate::time::Duration;
use crate::window::WindowId;

/// A pipeline stage.
pub trait Stage {
    /// What the end of the chain records for this stage.
    type Terminal: Default;
}

macro_rules! stages {
    ($($(#[$doc:meta])* $name:ident => $terminal:ty;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug)]
            pub enum $name {}

            impl Stage for $name {
                type Terminal = $terminal;
            }
        )*
    };
}

stages! {
    /// `pre_paint_screen`.
    PrePaintScreen => ();
    /// `paint_screen`.
    PaintScreen => Option<ScreenRequest>;
    /// `post_paint_screen`.
    PostPaintScreen => ();
    /// `pre_paint_window`.
    PrePaintWindow => ();
    /// `paint_window`.
    PaintWindow => Option<WindowRequest>;
    /// `post_paint_window`.
    PostPaintWindow => ();
    /// `draw_window`.
    DrawWindow => Option<WindowRequest>;
    /// `build_quads`.
    BuildQuads => ();
}

/// The arguments a screen paint reached the end of the chain with.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenRequest {
    /// Final paint mode.
    pub mask: PaintMask,
    /// Final region.
    pub region: Region,
    /// Final screen transform.
    pub data: ScreenPaintData,
}

/// The arguments a window paint or draw reached the end of the chain with.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowRequest {
    /// Final paint mode.
    pub mask: PaintMask,
    /// Final region.
    pub region: Region,
    /// Final paint data.
    pub data: WindowPaintData,
}

/// The rest of the chain for one stage call.
pub struct Next<'a, S: Stage> {
    rest: &'a mut [EffectSlot],
    terminal: &'a mut S::Terminal,
    stage: PhantomData<S>,
}

impl<S: Stage> fmt::Debug for Next<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.remaining())
            .finish_non_exhaustive()
    }
}

impl<'a, S: Stage> Next<'a, S> {
    pub(crate) fn new(rest: &'a mut [EffectSlot], terminal: &'a mut S::Terminal) -> Self {
        Self {
            rest,
            terminal,
            stage: PhantomData,
        }
    }

    /// Number of active effects still ahead.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rest.iter().filter(|s| s.active).count()
    }

    /// Ids of the active effects still ahead, in dispatch order.
    pub fn upcoming(&self) -> impl Iterator<Item = EffectId> + '_ {
        self.rest.iter().filter(|s| s.active).map(|s| s.id)
    }

    /// Splits off the next active effect, or hands back the terminal.
    fn split(self) -> Result<(&'a mut EffectSlot, Self), &'a mut S::Terminal> {
        let Self {
            rest,
            terminal,
            stage,
        } = self;
        let Some(i) = rest.iter().position(|s| s.active) else {
            return Err(terminal);
        };
        match rest.split_at_mut(i).1.split_first_mut() {
            Some((slot, rest)) => Ok((
                slot,
                Self {
                    rest,
                    terminal,
                    stage,
                },
            )),
            None => Err(terminal),
        }
    }
}

// -- Screen stages --

impl Next<'_, PrePaintScreen> {
    /// Forwards `pre_paint_screen`.
    pub fn pre_paint_screen(
        self,
        cx: &mut EffectContext,
        data: &mut ScreenPrePaintData,
        elapsed: Duration,
    ) {
        if let Ok((slot, next)) = self.split() {
            let effect = slot.effect.as_effect_mut();
            cx.with_current(slot.id, |cx| effect.pre_paint_screen(cx, data, elapsed, next));
        }
    }
}

impl Next<'_, PaintScreen> {
    /// Forwards `paint_screen`.
    pub fn paint_screen(
        self,
        cx: &mut EffectContext,
        mask: PaintMask,
        region: &Region,
        data: &mut ScreenPaintData,
    ) {
        match self.split() {
            Ok((slot, next)) => {
                let effect = slot.effect.as_effect_mut();
                cx.with_current(slot.id, |cx| effect.paint_screen(cx, mask, region, data, next));
            }
            Err(terminal) => {
                *terminal = Some(ScreenRequest {
                    mask,
                    region: region.clone(),
                    data: *data,
                });
            }
        }
    }
}

impl Next<'_, PostPaintScreen> {
    /// Forwards `post_paint_screen`.
    pub fn post_paint_screen(self, cx: &mut EffectContext) {
        if let Ok((slot, next)) = self.split() {
            let effect = slot.effect.as_effect_mut();
            cx.with_current(slot.id, |cx| effect.post_paint_screen(cx, next));
        }
    }
}

// -- Window stages --

impl Next<'_, PrePaintWindow> {
    /// Forwards `pre_paint_window`.
    pub fn pre_paint_window(
        self,
        cx: &mut EffectContext,
        window: WindowId,
        data: &mut WindowPrePaintData,
        elapsed: Duration,
    ) {
        if let Ok((slot, next)) = self.split() {
            let effect = slot.effect.as_effect_mut();
            cx.with_current(slot.id, |cx| {
                effect.pre_paint_window(cx, window, data, elapsed, next);
            });
        }
    }
}

impl Next<'_, PaintWindow> {
    /// Forwards `paint_window`.
    pub fn paint_window(
        self,
        cx: &mut EffectContext,
        window: WindowId,
        mask: PaintMask,
        region: &Region,
        data: &mut WindowPaintData,
    ) {
        match self.split() {
            Ok((slot, next)) => {
                let effect = slot.effect.as_effect_mut();
                cx.with_current(slot.id, |cx| {
                    effect.paint_window(cx, window, mask, region, data, next);
                });
            }
            Err(terminal) => {
                *terminal = Some(WindowRequest {
                    mask,
                    region: region.clone(),
                    data: *data,
                });
            }
        }
    }
}

impl Next<'_, PostPaintWindow> {
    /// Forwards `post_paint_window`.
    pub fn post_paint_window(self, cx: &mut EffectContext, window: WindowId) {
        if let Ok((slot, next)) = self.split() {
            let effect = slot.effect.as_effect_mut();
            cx.with_current(slot.id, |cx| effect.post_paint_window(cx, window, next));
        }
    }
}

impl Next<'_, DrawWindow> {
    /// Forwards `draw_window`.
    pub fn draw_window(
        self,
        cx: &mut EffectContext,
        window: WindowId,
        mask: PaintMask,
        region: &Region,
        data: &mut WindowPaintData,
    ) {
        match self.split() {
            Ok((slot, next)) => {
                let effect = slot.effect.as_effect_mut();
                cx.with_current(slot.id, |cx| {
                    effect.draw_window(cx, window, mask, region, data, next);
                });
            }
            Err(terminal) => {
                *terminal = Some(WindowRequest {
                    mask,
                    region: region.clone(),
                    data: *data,
                });
            }
        }
    }
}

impl Next<'_, BuildQuads> {
    /// Forwards `build_quads`.
    pub fn build_quads(self, cx: &mut EffectContext, window: WindowId, quads: &mut QuadList) {
        if let Ok((slot, next)) = self.split() {
            let effect = slot.effect.as_effect_mut();
            cx.with_current(slot.id, |cx| effect.build_quads(cx, window, quads, next));
        }
    }
}
