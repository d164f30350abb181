// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::WindowId;

/// A window lifecycle transition, as broadcast to effects and subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WindowEventKind {
    /// The window became eligible for compositing.
    Added,
    /// The window was mapped again after being hidden.
    Shown,
    /// The window was unmapped without closing.
    Hidden,
    /// The window was minimized.
    Minimized,
    /// The window was restored from minimized.
    Unminimized,
    /// The client closed the window; it is now a remnant.
    Closed,
    /// The remnant was released; the handle is about to go stale.
    Deleted,
}

/// A lifecycle transition of one window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowEvent {
    /// The window.
    pub window: WindowId,
    /// What happened.
    pub kind: WindowEventKind,
}
