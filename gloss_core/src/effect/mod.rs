// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effects and the effect chain.
//!
//! An [`Effect`] hooks into any subset of the pipeline stages. Every hook
//! has a default body that forwards to the rest of the chain, so an effect
//! overrides only the stages it cares about and keeps the others
//! transparent.
//!
//! ```text
//!   EffectChain (sorted by ordering, then load order)
//!     ├─ slot 0: Native(Box<dyn Effect>)   ── next.paint_window(..) ──┐
//!     ├─ slot 1: Scripted(ScriptedEffect)  ◄──────────────────────────┘
//!     └─ terminal: records the final request for the compositor
//! ```
//!
//! Effects come in two closed variants, [`EffectKind::Native`] and
//! [`EffectKind::Scripted`], dispatched through the same trait.
//!
//! - **[`chain`]**: ordering, activity, stage entry points, lifecycle
//!   broadcast.
//! - **[`stage`]**: stage markers and the single-use [`Next`] cursor.
//! - **[`loader`]**: named factories and the [`EffectSink`] that receives
//!   what they build.
//! - **[`scripted`]**: declarative handler/action effects.

use alloc::boxed::Box;
use core::fmt;

use crate::context::EffectContext;
use crate::error::LoadError;
use crate::paint::{PaintMask, ScreenPaintData, ScreenPrePaintData, WindowPaintData, WindowPrePaintData};
use crate::quad::QuadList;
use crate::region::Region;
use crate::time::Duration;
use crate::window::WindowId;

pub mod chain;
pub mod loader;
pub mod scripted;
pub mod stage;

pub use chain::EffectChain;
pub use loader::{EffectFactory, EffectLoader, EffectSink, LoadResult};
pub use scripted::{
    AnimationList, AnimationSettings, Handler, Script, ScriptAction, ScriptEvent, ScriptedEffect,
};
pub use stage::{Next, ScreenRequest, Stage, WindowRequest};

/// Identifies a loaded effect for the compositor session.
///
/// Ids are handed out in load order and never reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EffectId(pub(crate) u32);

impl EffectId {
    /// Returns the raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EffectId({})", self.0)
    }
}

/// A pluggable unit hooking into the paint pipeline.
///
/// Stage hooks receive the context, the stage's data, and a [`Next`] for
/// the rest of the chain. Forward by calling the stage method on `next`;
/// return without calling it to stop the stage here. Lifecycle hooks are
/// notifications and do not forward.
pub trait Effect {
    /// A stable name for logs and traces.
    fn name(&self) -> &str;

    /// Called once before the effect joins the chain. An error keeps it
    /// out of the chain.
    fn load(&mut self, cx: &mut EffectContext) -> Result<(), LoadError> {
        _ = cx;
        Ok(())
    }

    /// Called once when the effect leaves the chain, before its grabs,
    /// full-screen slot and keep-alive references are released.
    fn unload(&mut self, cx: &mut EffectContext) {
        _ = cx;
    }

    /// Whether the effect has live work: animations, grabs, or exclusive
    /// state. Inactive effects are skipped by stage dispatch for the frame.
    fn is_active(&self) -> bool {
        true
    }

    /// Position in the chain; lower runs first.
    fn ordering(&self) -> i32 {
        0
    }

    // -- Screen stages --

    /// Prepares the screen pass. `elapsed` is the time since the last frame.
    fn pre_paint_screen(
        &mut self,
        cx: &mut EffectContext,
        data: &mut ScreenPrePaintData,
        elapsed: Duration,
        next: Next<'_, stage::PrePaintScreen>,
    ) {
        next.pre_paint_screen(cx, data, elapsed);
    }

    /// Paints the screen. Not forwarding suppresses the frame's windows.
    fn paint_screen(
        &mut self,
        cx: &mut EffectContext,
        mask: PaintMask,
        region: &Region,
        data: &mut ScreenPaintData,
        next: Next<'_, stage::PaintScreen>,
    ) {
        next.paint_screen(cx, mask, region, data);
    }

    /// Finishes the screen pass.
    fn post_paint_screen(&mut self, cx: &mut EffectContext, next: Next<'_, stage::PostPaintScreen>) {
        next.post_paint_screen(cx);
    }

    // -- Window stages --

    /// Prepares one window.
    fn pre_paint_window(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        data: &mut WindowPrePaintData,
        elapsed: Duration,
        next: Next<'_, stage::PrePaintWindow>,
    ) {
        next.pre_paint_window(cx, window, data, elapsed);
    }

    /// Paints one window. Not forwarding hides it for this frame.
    fn paint_window(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        mask: PaintMask,
        region: &Region,
        data: &mut WindowPaintData,
        next: Next<'_, stage::PaintWindow>,
    ) {
        next.paint_window(cx, window, mask, region, data);
    }

    /// Finishes one window.
    fn post_paint_window(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        next: Next<'_, stage::PostPaintWindow>,
    ) {
        next.post_paint_window(cx, window);
    }

    /// Draws one window after its paint data is final.
    fn draw_window(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        mask: PaintMask,
        region: &Region,
        data: &mut WindowPaintData,
        next: Next<'_, stage::DrawWindow>,
    ) {
        next.draw_window(cx, window, mask, region, data);
    }

    /// Adds or removes drawable quads.
    fn build_quads(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        quads: &mut QuadList,
        next: Next<'_, stage::BuildQuads>,
    ) {
        next.build_quads(cx, window, quads);
    }

    // -- Lifecycle --

    /// A window became eligible for compositing.
    fn window_added(&mut self, cx: &mut EffectContext, window: WindowId) {
        _ = (cx, window);
    }

    /// A hidden window was shown again.
    fn window_shown(&mut self, cx: &mut EffectContext, window: WindowId) {
        _ = (cx, window);
    }

    /// A window was hidden.
    fn window_hidden(&mut self, cx: &mut EffectContext, window: WindowId) {
        _ = (cx, window);
    }

    /// A window was closed. This is the moment to take a keep-alive
    /// reference.
    fn window_closed(&mut self, cx: &mut EffectContext, window: WindowId) {
        _ = (cx, window);
    }

    /// A closed window was released and is about to go stale.
    fn window_deleted(&mut self, cx: &mut EffectContext, window: WindowId) {
        _ = (cx, window);
    }

    /// A window was minimized.
    fn window_minimized(&mut self, cx: &mut EffectContext, window: WindowId) {
        _ = (cx, window);
    }

    /// A window was restored.
    fn window_unminimized(&mut self, cx: &mut EffectContext, window: WindowId) {
        _ = (cx, window);
    }

    /// The current desktop changed.
    fn desktop_changed(&mut self, cx: &mut EffectContext, from: u32, to: u32) {
        _ = (cx, from, to);
    }
}

/// The closed set of effect variants.
pub enum EffectKind {
    /// A compiled effect.
    Native(Box<dyn Effect>),
    /// A declarative scripted effect.
    Scripted(ScriptedEffect),
}

impl EffectKind {
    /// Wraps a native effect.
    #[must_use]
    pub fn native(effect: impl Effect + 'static) -> Self {
        Self::Native(Box::new(effect))
    }

    /// The effect behind either variant.
    #[must_use]
    pub fn as_effect(&self) -> &dyn Effect {
        match self {
            Self::Native(e) => e.as_ref(),
            Self::Scripted(e) => e,
        }
    }

    /// The effect behind either variant, mutably.
    pub fn as_effect_mut(&mut self) -> &mut dyn Effect {
        match self {
            Self::Native(e) => e.as_mut(),
            Self::Scripted(e) => e,
        }
    }
}

impl fmt::Debug for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(e) => f.debug_tuple("Native").field(&e.name()).finish(),
            Self::Scripted(e) => f.debug_tuple("Scripted").field(&e.name()).finish(),
        }
    }
}

/// One chain entry.
#[derive(Debug)]
pub struct EffectSlot {
    pub(crate) id: EffectId,
    pub(crate) effect: EffectKind,
    /// Whether stage dispatch visits this slot in the current frame.
    pub(crate) active: bool,
}

impl EffectSlot {
    /// The effect's id.
    #[must_use]
    pub fn id(&self) -> EffectId {
        self.id
    }

    /// The effect.
    #[must_use]
    pub fn effect(&self) -> &EffectKind {
        &self.effect
    }
}
