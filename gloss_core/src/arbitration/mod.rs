// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ownership rules between effects.
//!
//! Three mechanisms keep independently written effects from fighting:
//!
//! - **[Grabs](grab)**: per-window, per-role ownership. "Who animates this
//!   window's close?" has one answer at a time.
//! - **[Full-screen slot](full_screen)**: a single token for effects that
//!   take over the whole desktop, such as a desktop switch.
//! - **[Keep-alive](keep_alive)**: reference counts that let a close
//!   animation finish after the window was destroyed.
//!
//! Effects reach all three through the
//! [`EffectContext`](crate::context::EffectContext), which attributes each
//! request to the effect currently being dispatched and records the outcome
//! in the trace.

pub mod full_screen;
pub mod grab;
pub mod keep_alive;

pub use full_screen::{FullScreenChange, FullScreenSlot};
pub use grab::{GrabOutcome, GrabTable, UngrabOutcome};
pub use keep_alive::KeepAliveRegistry;
