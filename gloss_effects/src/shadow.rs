// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draws a drop shadow under every window.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use gloss_core::context::EffectContext;
use gloss_core::effect::{Effect, Next, stage};
use gloss_core::error::LoadError;
use gloss_core::quad::QuadList;
use gloss_core::window::WindowId;
use gloss_render::{ResourceKey, Shadow, ShadowTextureCache};
use kurbo::Insets;

/// The shadow effect.
///
/// Grows each window's paint margins by the shadow offsets so damage and
/// clipping cover the shadow, and puts the shadow quads below the window's
/// own quads. Windows share one texture per distinct tile set.
#[derive(Debug, Default)]
pub struct ShadowEffect {
    shadow: Shadow,
    cache: ShadowTextureCache,
    textures: BTreeMap<WindowId, ResourceKey>,
}

impl ShadowEffect {
    /// Effect name used by the loader.
    pub const NAME: &'static str = "shadow";

    /// Creates the effect.
    #[must_use]
    pub fn new(shadow: Shadow) -> Self {
        Self {
            shadow,
            ..Self::default()
        }
    }

    /// The texture used for `window`'s shadow.
    #[must_use]
    pub fn texture(&self, window: WindowId) -> Option<ResourceKey> {
        self.textures.get(&window).copied()
    }

    fn attach(&mut self, cx: &mut EffectContext, window: WindowId) {
        if self.textures.contains_key(&window) {
            return;
        }
        let Some(key) = self.cache.acquire(&self.shadow.tiles) else {
            return;
        };
        cx.windows_mut().set_paint_margins(window, self.shadow.offsets);
        self.textures.insert(window, key);
    }
}

impl Effect for ShadowEffect {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn load(&mut self, cx: &mut EffectContext) -> Result<(), LoadError> {
        let windows: Vec<WindowId> = cx.windows().stacking_order().collect();
        for window in windows {
            self.attach(cx, window);
        }
        Ok(())
    }

    fn unload(&mut self, cx: &mut EffectContext) {
        for (window, key) in core::mem::take(&mut self.textures) {
            cx.windows_mut().set_paint_margins(window, Insets::ZERO);
            self.cache.release(key);
        }
    }

    /// Active while any window carries a shadow: the quad stage has to run
    /// for every such window on every frame, not only while something
    /// animates.
    fn is_active(&self) -> bool {
        !self.textures.is_empty()
    }

    fn build_quads(
        &mut self,
        cx: &mut EffectContext,
        window: WindowId,
        quads: &mut QuadList,
        next: Next<'_, stage::BuildQuads>,
    ) {
        if self.textures.contains_key(&window)
            && let Some(frame) = cx.windows().frame_geometry(window)
        {
            let mut below = QuadList::new();
            if self.shadow.build_quads(frame.size(), &mut below) > 0 {
                for quad in quads.as_slice() {
                    below.push(*quad);
                }
                *quads = below;
            }
        }
        next.build_quads(cx, window, quads);
    }

    fn window_added(&mut self, cx: &mut EffectContext, window: WindowId) {
        self.attach(cx, window);
    }

    fn window_deleted(&mut self, _cx: &mut EffectContext, window: WindowId) {
        if let Some(key) = self.textures.remove(&window) {
            self.cache.release(key);
        }
    }
}
