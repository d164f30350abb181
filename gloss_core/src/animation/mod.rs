// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window animations.
//!
//! An effect that animates windows owns an [`AnimationEngine`]: a sparse map
//! from window to the [`AniData`] running on it. Each animation interpolates
//! one [`Attribute`] between two [`FPx2`] values along a [`Timeline`].
//!
//! # Lifecycle
//!
//! 1. The effect starts an animation from a lifecycle hook with
//!    [`AnimationEngine::animate`] (dropped when finished) or
//!    [`AnimationEngine::set`] (kept at its target).
//! 2. Each frame, the effect's stage hooks call the engine's helpers:
//!    timelines advance in screen pre-paint, values are applied in window
//!    paint, and finished animations are dropped in screen post-paint.
//! 3. While anything runs, post-paint requests a repaint of the animated
//!    windows, so the scheduler keeps producing frames until the last
//!    animation settles.
//!
//! Animations can be steered while they run: retargeted to a new end value,
//! redirected (reversed), completed, or cancelled. Steering an animation
//! that no longer exists is a no-op returning `false`.
//!
//! Animations interact with [arbitration](crate::arbitration): a
//! `full_screen` animation holds the full-screen slot for its effect, and a
//! `keep_alive` animation on a closed window defers that window's
//! destruction until it finishes.

mod easing;
mod engine;
mod timeline;

pub use easing::Easing;
pub use engine::{
    AniData, AnimationEngine, AnimationId, AnimationRequest, Attribute, FPx2, TerminationFlags,
};
pub use timeline::{Direction, RedirectMode, Timeline};
