// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for the pipeline's boundaries.
//!
//! Stage dispatch itself never fails: a misbehaving effect degrades to "no
//! animation" rather than aborting a frame. Errors exist only where work
//! enters or leaves the pipeline: loading an effect and handing a frame to
//! the renderer.

use alloc::string::String;

/// Why an effect could not be loaded.
///
/// An effect that fails to load is excluded from the chain and never
/// receives a stage call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// No factory is registered under this name.
    #[error("unknown effect `{0}`")]
    Unknown(String),
    /// The renderer lacks a feature the effect needs.
    #[error("effect requires an unsupported renderer feature: {0}")]
    Unsupported(&'static str),
    /// A scripted effect failed validation.
    #[error("invalid script: {0}")]
    Script(#[from] ScriptError),
    /// The effect's own initialization failed.
    #[error("effect initialization failed: {0}")]
    Init(String),
}

/// Validation failures for scripted effect animation settings.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// An animation object names no attribute and the global settings do
    /// not supply one.
    #[error("animation {index} has no type")]
    MissingType {
        /// Position in the animation list.
        index: usize,
    },
    /// An animation object has no duration and the global settings do not
    /// supply one.
    #[error("animation {index} has no duration")]
    MissingDuration {
        /// Position in the animation list.
        index: usize,
    },
    /// The animation list is empty.
    #[error("no animations given")]
    NoAnimations,
    /// A handler refers to an animation list that does not exist.
    #[error("handler references unknown animation set {0}")]
    UnknownAnimationSet(usize),
}

/// Why the renderer could not complete a frame.
///
/// A failed frame leaves its damage pending so it is retried.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The graphics context was lost and must be recreated.
    #[error("graphics context lost")]
    ContextLost,
    /// Resource allocation failed.
    #[error("out of memory")]
    OutOfMemory,
    /// Anything else the backend reports.
    #[error("backend error: {0}")]
    Backend(String),
}
