// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Easing curves backed by [`keyframe`].

use keyframe::EasingFunction;
use keyframe::functions::{
    EaseInCubic, EaseInOutCubic, EaseInOutQuad, EaseInOutQuart, EaseInOutQuint, EaseInQuad,
    EaseInQuart, EaseInQuint, EaseOutCubic, EaseOutQuad, EaseOutQuart, EaseOutQuint, Linear,
};

use crate::config::AnimationCurve;

/// Maps linear progress to eased progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[expect(missing_docs, reason = "variant names are the curve names")]
pub enum Easing {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InQuint,
    OutQuint,
    InOutQuint,
}

impl Easing {
    /// Evaluates the curve at `t`, clamped to `[0, 1]`.
    ///
    /// Every curve maps `0` to `0` and `1` to `1`.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }
        match self {
            Self::Linear => Linear.y(t),
            Self::InQuad => EaseInQuad.y(t),
            Self::OutQuad => EaseOutQuad.y(t),
            Self::InOutQuad => EaseInOutQuad.y(t),
            Self::InCubic => EaseInCubic.y(t),
            Self::OutCubic => EaseOutCubic.y(t),
            Self::InOutCubic => EaseInOutCubic.y(t),
            Self::InQuart => EaseInQuart.y(t),
            Self::OutQuart => EaseOutQuart.y(t),
            Self::InOutQuart => EaseInOutQuart.y(t),
            Self::InQuint => EaseInQuint.y(t),
            Self::OutQuint => EaseOutQuint.y(t),
            Self::InOutQuint => EaseInOutQuint.y(t),
        }
    }
}

impl From<AnimationCurve> for Easing {
    fn from(curve: AnimationCurve) -> Self {
        match curve {
            AnimationCurve::Linear => Self::Linear,
            AnimationCurve::Quadratic => Self::InOutQuad,
            AnimationCurve::Cubic => Self::InOutCubic,
            AnimationCurve::Quartic => Self::InOutQuart,
        }
    }
}
