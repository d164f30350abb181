// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in native effects for gloss.
//!
//! Each effect is an ordinary [`Effect`](gloss_core::effect::Effect)
//! implementation that drives its own
//! [`AnimationEngine`](gloss_core::animation::AnimationEngine):
//!
//! - [`FadeEffect`]: fades windows in when added and out when closed,
//!   keeping closed windows alive until the fade ends
//! - [`MinimizeEffect`]: shrinks and fades on minimize, reversing
//!   mid-flight on restore
//! - [`DesktopSlide`]: slides desktops on a switch while holding the
//!   full-screen slot
//! - [`ShadowEffect`]: tiles a drop shadow under every window
//!
//! [`register_builtin`] adds a factory for each to an
//! [`EffectLoader`].
//!
//! ```rust,ignore
//! let mut loader = EffectLoader::new();
//! gloss_effects::register_builtin(&mut loader);
//! compositor.load_all_effects(&loader);
//! ```

#![no_std]

extern crate alloc;

mod fade;
mod minimize;
mod shadow;
mod slide;

pub use fade::{FadeConfig, FadeEffect};
pub use minimize::{MINIMIZED_SCALE, MinimizeEffect};
pub use shadow::ShadowEffect;
pub use slide::DesktopSlide;

use gloss_core::effect::{EffectFactory, EffectKind, EffectLoader};
use gloss_render::{Shadow, ShadowTiles};
use kurbo::Insets;

/// The shadow [`register_builtin`] installs.
pub const DEFAULT_SHADOW: Shadow = Shadow::new(ShadowTiles::uniform(32.0), Insets::uniform(16.0));

/// Registers a factory for every built-in effect, with default settings.
pub fn register_builtin(loader: &mut EffectLoader) {
    loader.register(EffectFactory::new(FadeEffect::NAME, || {
        Ok(EffectKind::native(FadeEffect::default()))
    }));
    loader.register(EffectFactory::new(MinimizeEffect::NAME, || {
        Ok(EffectKind::native(MinimizeEffect::default()))
    }));
    loader.register(EffectFactory::new(DesktopSlide::NAME, || {
        Ok(EffectKind::native(DesktopSlide::default()))
    }));
    loader.register(EffectFactory::new(ShadowEffect::NAME, || {
        Ok(EffectKind::native(ShadowEffect::new(DEFAULT_SHADOW)))
    }));
}
