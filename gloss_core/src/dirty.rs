// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The [`WindowStore`](crate::window::WindowStore) records which windows
//! need repainting with multi-channel dirty tracking (via
//! [`understory_dirty`]), keyed by window slot index.
//!
//! # Propagation semantics
//!
//! - **Local**: [`DAMAGE`] is marked with the default policy when a window
//!   reports changed content or an effect asks for a partial repaint. Only
//!   the marked window appears in the drain output; the exact rectangles
//!   live in the store's per-window damage region.
//!
//! - **Propagating**: [`REPAINT`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) along transient-for
//!   edges (transient depends on its parent). A full repaint of a parent
//!   window, e.g. because an effect transforms it, also repaints every
//!   dialog stacked on it.
//!
//! - **Local**: [`STACKING`] is marked when a window is raised or lowered.
//!   The whole window area is repainted, since what it covers changed.
//!
//! # Consumption
//!
//! [`WindowStore::collect_damage`](crate::window::WindowStore::collect_damage)
//! drains every channel at the start of each drive cycle and folds the
//! result into the frame's working [`Region`](crate::region::Region).

use understory_dirty::Channel;

/// Window content changed inside a known rectangle; no propagation.
pub const DAMAGE: Channel = Channel::new(0);

/// Whole window needs repainting; propagates to transients.
pub const REPAINT: Channel = Channel::new(1);

/// Stacking position changed; no propagation.
pub const STACKING: Channel = Channel::new(2);
