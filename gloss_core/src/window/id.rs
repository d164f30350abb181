// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window identity.

use core::fmt;

/// A handle to a window in a [`WindowStore`](super::WindowStore).
///
/// This is the effect-facing window proxy: effects never see the window
/// manager's own objects, only this handle. It holds a slot index and a
/// generation counter, so once the window (and any remnant kept alive for
/// it) is destroyed and the slot reused, old handles stop resolving instead
/// of aliasing the new window.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId {
    /// Slot index into the store's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the store's generation for this slot.
    pub(crate) generation: u32,
}

impl WindowId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowId({}@gen{})", self.idx, self.generation)
    }
}

/// Where a window is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WindowState {
    /// Mapped and managed by the window manager.
    #[default]
    Live,
    /// The client asked for destruction; a remnant stays in the stacking
    /// order while effects keep it alive.
    Closed,
    /// Released; queued for removal at the next frame boundary.
    Destroyed,
}
