// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame timing inputs and outcomes.
//!
//! - [`FrameTick`]: a frame opportunity delivered by the display clock
//! - [`FrameOutcome`]: how the drive cycle for that tick ended
//!
//! # Data flow
//!
//! 1. The platform produces a [`FrameTick`] on vblank, or when a repaint
//!    was requested while the clock was idle.
//! 2. [`Compositor::paint_frame`](crate::compositor::Compositor::paint_frame)
//!    asks the [`FrameScheduler`](crate::scheduler::FrameScheduler) for a
//!    plan; an idle scheduler skips the tick.
//! 3. The effect chain and renderer run; the resulting [`FrameOutcome`] is
//!    fed back to the scheduler so failed frames keep their damage.

use core::fmt;

use crate::time::HostTime;

/// Identifies a display output.
///
/// The platform assigns output ids; the pipeline passes them through
/// without interpreting the value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OutputId(pub u32);

impl fmt::Debug for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputId({})", self.0)
    }
}

/// A frame opportunity delivered by the display clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameTick {
    /// Current host time when the tick was generated.
    pub now: HostTime,
    /// Display refresh interval in host-time ticks, if known.
    pub refresh_interval: Option<u64>,
    /// Monotonically increasing frame counter.
    pub frame_index: u64,
    /// Which output this tick is for.
    pub output: OutputId,
}

impl FrameTick {
    /// Creates a tick for output 0 with no refresh-rate information.
    #[must_use]
    pub const fn new(frame_index: u64, now: HostTime) -> Self {
        Self {
            now,
            refresh_interval: None,
            frame_index,
            output: OutputId(0),
        }
    }
}

/// How a drive cycle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameOutcome {
    /// Nothing was pending; no stage ran.
    Idle,
    /// The frame was painted and handed to the display.
    Presented,
    /// An effect declined to forward the screen paint; nothing was drawn
    /// but the damage counts as handled.
    Suppressed,
    /// The renderer failed; the damage stays pending for the next cycle.
    Failed,
}

impl FrameOutcome {
    /// Returns whether the frame's damage counts as painted.
    #[must_use]
    pub const fn consumed_damage(self) -> bool {
        matches!(self, Self::Presented | Self::Suppressed)
    }
}
