// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-plan recording and shadow tiling for gloss.
//!
//! This crate sits between [`gloss_core`]'s effect chain and
//! backend-specific rendering. It provides:
//!
//! - [`RenderPlan`] / [`RenderItem`]: what one frame drew, back to front
//! - [`PlanRecorder`]: a [`Renderer`](gloss_core::backend::Renderer) that
//!   records plans, for headless sessions and tests
//! - [`Shadow`] / [`ShadowTiles`]: eight-tile shadow quads, with corner
//!   distribution for small windows
//! - [`ResourceKey`] / [`ShadowTextureCache`]: opaque handles for
//!   backend-managed textures, shared among identical shadows

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod plan;
mod resource;
mod shadow;

pub use plan::{PlanRecorder, RenderItem, RenderPlan};
pub use resource::{ResourceKey, ShadowTextureCache};
pub use shadow::{MIN_WINDOW_SIZE, Shadow, ShadowTiles};
