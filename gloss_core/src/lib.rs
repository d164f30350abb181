// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effect-chain paint pipeline for desktop compositing.
//!
//! `gloss_core` owns everything between the window manager and a
//! rasterizing backend: the window list, repaint scheduling, the chain of
//! effects every frame passes through, a per-window animation engine, and
//! the arbitration that keeps effects from fighting over the same window.
//! It is `no_std` compatible (with `alloc`) and stores windows in
//! struct-of-arrays form behind generational handles.
//!
//! # Architecture
//!
//! ```text
//!   Window manager ──► Compositor (add/close/minimize/desktop)
//!                          │ broadcasts lifecycle to every effect
//!                          ▼
//!   FrameTick ──► WindowStore::collect_damage ──► FrameScheduler::plan
//!                                                      │
//!                 ┌────────────────────────────────────┘
//!                 ▼
//!   EffectChain: pre-paint ► paint ► draw ► quads ► post-paint
//!                 │                                  ▲
//!                 ▼                                  │
//!            Renderer (backend)            AnimationEngine, grabs,
//!                 │                        full-screen slot, keep-alive
//!                 ▼
//!   FrameOutcome ──► FrameScheduler::observe
//! ```
//!
//! **[`window`]**: Struct-of-arrays window list with generational handles,
//! per-window side data, and damage tracking via `understory_dirty`.
//!
//! **[`effect`]**: The [`Effect`](effect::Effect) trait, the ordered
//! [`EffectChain`](effect::EffectChain) with its stage continuations, the
//! named-factory loader, and declarative scripted effects.
//!
//! **[`animation`]**: Timelines, easing, and the per-window
//! [`AnimationEngine`](animation::AnimationEngine) effects embed.
//!
//! **[`arbitration`]**: Role grabs, the single full-screen slot, and
//! keep-alive references on closed windows.
//!
//! **[`scheduler`]**: Turns ticks and pending damage into frame plans and
//! decides what to repaint after a failed frame.
//!
//! **[`compositor`]**: The drive cycle tying it all together.
//!
//! **[`backend`]**: The [`Renderer`](backend::Renderer) trait backends
//! implement.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! frame and arbitration instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-window
//!   paint records and damage-rect events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod animation;
pub mod arbitration;
pub mod backend;
pub mod compositor;
pub mod config;
pub mod context;
pub mod dirty;
pub mod effect;
pub mod error;
pub mod paint;
pub mod quad;
pub mod region;
pub mod scheduler;
pub mod signal;
pub mod time;
pub mod timing;
pub mod trace;
pub mod window;

pub use compositor::Compositor;
pub use config::CompositorConfig;
pub use context::EffectContext;
