// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Session-wide compositor configuration.
//!
//! Loading configuration from files is the host's business; the pipeline
//! only consumes a [`CompositorConfig`] value. Start from a preset and
//! override fields as needed:
//!
//! ```
//! use gloss_core::config::{AnimationCurve, CompositorConfig};
//!
//! let mut config = CompositorConfig::desktop();
//! config.animation_speed = 2.0;
//! config.animation_curve = AnimationCurve::Cubic;
//! ```

use kurbo::Rect;

use crate::scheduler::SchedulerConfig;
use crate::time::Timebase;

/// The global default easing family, as exposed in user settings.
///
/// Effects that do not pick an easing themselves get the in-out variant of
/// this family (see [`Easing::from`](crate::animation::Easing)).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnimationCurve {
    /// Constant speed.
    #[default]
    Linear,
    /// Quadratic in-out.
    Quadratic,
    /// Cubic in-out.
    Cubic,
    /// Quartic in-out.
    Quartic,
}

/// Configuration for a compositor session.
#[derive(Clone, Copy, Debug)]
pub struct CompositorConfig {
    /// Global animation speed factor. Frame time handed to timelines is
    /// multiplied by it: `2.0` plays animations twice as fast,
    /// [`f64::INFINITY`] finishes every animation on its first frame.
    pub animation_speed: f64,
    /// Default easing family.
    pub animation_curve: AnimationCurve,
    /// Conversion from host ticks to nanoseconds.
    pub timebase: Timebase,
    /// The output rectangle, used to resolve full repaints.
    pub screen: Rect,
    /// Frame scheduling parameters.
    pub scheduler: SchedulerConfig,
}

impl CompositorConfig {
    /// A 1920×1080 desktop with normal animation speed.
    #[must_use]
    pub const fn desktop() -> Self {
        Self {
            animation_speed: 1.0,
            animation_curve: AnimationCurve::Linear,
            timebase: Timebase::NANOS,
            screen: Rect::new(0.0, 0.0, 1920.0, 1080.0),
            scheduler: SchedulerConfig::desktop(),
        }
    }

    /// Like [`desktop`](Self::desktop), with animations disabled.
    #[must_use]
    pub const fn instant() -> Self {
        let mut config = Self::desktop();
        config.animation_speed = f64::INFINITY;
        config
    }
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self::desktop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instant_preset_only_changes_speed() {
        let desktop = CompositorConfig::desktop();
        let instant = CompositorConfig::instant();
        assert_eq!(instant.animation_speed, f64::INFINITY);
        assert_eq!(instant.screen, desktop.screen);
        assert_eq!(instant.animation_curve, desktop.animation_curve);
    }
}
