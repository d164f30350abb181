// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the drive cycle.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! the compositor calls as a frame runs and as effects arbitrate over
//! windows. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] is a convenience helper that collects phase
//! timestamps during a frame and produces a [`FrameSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`WindowPaintRecord`] and
//!   [`DamageRect`] events plus the corresponding `TraceSink` methods.

use crate::arbitration::FullScreenChange;
use crate::effect::EffectId;
use crate::error::LoadError;
use crate::scheduler::FramePlan;
use crate::time::{Duration, HostTime};
use crate::timing::{FrameOutcome, OutputId};
use crate::window::{DataRole, WindowEvent, WindowId};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of the drive cycle is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Damage collection and frame planning.
    Collect,
    /// Screen pre-paint and paint stages.
    Screen,
    /// Per-window stages, quad building, and drawing.
    Windows,
    /// Post-paint stages and finishing the frame in the renderer.
    Render,
}

/// What happened to a grab role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrabAction {
    /// The requester became (or stayed) owner.
    Acquired,
    /// The requester was turned away.
    Refused {
        /// The owner that kept the role.
        holder: EffectId,
    },
    /// A forced grab displaced the owner.
    Stolen {
        /// The displaced owner.
        previous: EffectId,
    },
    /// The owner let go.
    Released,
}

/// Direction of a keep-alive transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeepAliveAction {
    /// A reference was added.
    Acquired,
    /// A reference was dropped.
    Released,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a drive cycle starts painting.
#[derive(Clone, Copy, Debug)]
pub struct FrameBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which output this frame targets.
    pub output: OutputId,
    /// Host time of the tick.
    pub now: HostTime,
    /// Frame time handed to pre-paint stages.
    pub elapsed: Duration,
    /// Whether the whole output repaints.
    pub full_repaint: bool,
    /// Number of rectangles in the working region (zero for a full
    /// repaint).
    pub region_rects: u32,
}

impl From<&FramePlan> for FrameBeginEvent {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "region rectangle counts are far below u32::MAX"
    )]
    fn from(plan: &FramePlan) -> Self {
        Self {
            frame_index: plan.frame_index,
            output: plan.output,
            now: plan.now,
            elapsed: plan.elapsed,
            full_repaint: plan.region.is_full(),
            region_rects: plan.region.rects().len() as u32,
        }
    }
}

/// Marks the beginning of a drive-cycle phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a drive-cycle phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted when a drive cycle finishes.
#[derive(Clone, Copy, Debug)]
pub struct FrameEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// How the cycle ended.
    pub outcome: FrameOutcome,
    /// Windows handed to the renderer.
    pub windows_painted: u32,
}

/// Per-frame timing summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Which output.
    pub output: OutputId,
    /// Host time of the tick.
    pub now: HostTime,
    /// Frame time handed to pre-paint stages.
    pub elapsed: Duration,
    /// Collect phase duration in ticks (0 if not measured).
    pub collect_ticks: u64,
    /// Screen phase duration in ticks (0 if not measured).
    pub screen_ticks: u64,
    /// Windows phase duration in ticks (0 if not measured).
    pub windows_ticks: u64,
    /// Render phase duration in ticks (0 if not measured).
    pub render_ticks: u64,
    /// Windows handed to the renderer.
    pub windows_painted: u32,
    /// How the cycle ended.
    pub outcome: FrameOutcome,
}

/// Emitted when an effect is loaded or fails to load.
#[derive(Clone, Copy, Debug)]
pub struct EffectLoadEvent<'a> {
    /// Factory name.
    pub name: &'a str,
    /// The id the effect got, if it loaded.
    pub effect: Option<EffectId>,
    /// Why it did not load.
    pub error: Option<&'a LoadError>,
}

/// Emitted when an effect is unloaded.
#[derive(Clone, Copy, Debug)]
pub struct EffectUnloadEvent {
    /// The effect.
    pub effect: EffectId,
    /// Grab roles it still held.
    pub grabs_released: u32,
    /// Windows whose last keep-alive reference it held.
    pub windows_freed: u32,
    /// Whether it held the full-screen slot.
    pub held_full_screen: bool,
}

/// Emitted for every grab and ungrab that changes or refuses ownership.
#[derive(Clone, Copy, Debug)]
pub struct GrabEvent {
    /// The window.
    pub window: WindowId,
    /// The role.
    pub role: DataRole,
    /// The requesting effect.
    pub effect: EffectId,
    /// What happened.
    pub action: GrabAction,
}

/// Emitted when a keep-alive reference is added or dropped.
#[derive(Clone, Copy, Debug)]
pub struct KeepAliveEvent {
    /// The window.
    pub window: WindowId,
    /// The contributing effect.
    pub effect: EffectId,
    /// Acquired or released.
    pub action: KeepAliveAction,
    /// Total references afterwards.
    pub count: u32,
}

/// A per-window paint record.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct WindowPaintRecord {
    /// Slot index of the window.
    pub window_index: u32,
    /// Final opacity.
    pub opacity: f32,
    /// Whether the window was drawn transformed.
    pub transformed: bool,
    /// Number of quads drawn.
    pub quads: u32,
}

/// An axis-aligned damage rectangle.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct DamageRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the compositor.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a drive cycle starts painting.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a drive-cycle phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a drive-cycle phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a drive cycle finishes.
    fn on_frame_end(&mut self, e: &FrameEndEvent) {
        _ = e;
    }

    /// Called with a per-frame timing summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called when an effect is loaded or fails to load.
    fn on_effect_load(&mut self, e: &EffectLoadEvent<'_>) {
        _ = e;
    }

    /// Called when an effect is unloaded.
    fn on_effect_unload(&mut self, e: &EffectUnloadEvent) {
        _ = e;
    }

    /// Called for grab traffic.
    fn on_grab(&mut self, e: &GrabEvent) {
        _ = e;
    }

    /// Called when the full-screen slot changes hands.
    fn on_full_screen(&mut self, e: &FullScreenChange) {
        _ = e;
    }

    /// Called for keep-alive traffic.
    fn on_keep_alive(&mut self, e: &KeepAliveEvent) {
        _ = e;
    }

    /// Called for window lifecycle transitions.
    fn on_window(&mut self, e: &WindowEvent) {
        _ = e;
    }

    /// Called with per-frame window paint records (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    fn on_window_paints(&mut self, frame_index: u64, records: &[WindowPaintRecord]) {
        _ = (frame_index, records);
    }

    /// Called with per-frame damage rectangles (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        _ = (frame_index, rects);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameEndEvent`].
    #[inline]
    pub fn frame_end(&mut self, e: &FrameEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits an [`EffectLoadEvent`].
    #[inline]
    pub fn effect_load(&mut self, e: &EffectLoadEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_effect_load(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`EffectUnloadEvent`].
    #[inline]
    pub fn effect_unload(&mut self, e: &EffectUnloadEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_effect_unload(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`GrabEvent`].
    #[inline]
    pub fn grab(&mut self, e: &GrabEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_grab(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FullScreenChange`].
    #[inline]
    pub fn full_screen(&mut self, e: &FullScreenChange) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_full_screen(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`KeepAliveEvent`].
    #[inline]
    pub fn keep_alive(&mut self, e: &KeepAliveEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_keep_alive(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`WindowEvent`].
    #[inline]
    pub fn window(&mut self, e: &WindowEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_window(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits window paint records (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn window_paints(&mut self, frame_index: u64, records: &[WindowPaintRecord]) {
        if let Some(s) = &mut self.sink {
            s.on_window_paints(frame_index, records);
        }
    }

    /// Emits damage rectangles (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        if let Some(s) = &mut self.sink {
            s.on_damage_rects(frame_index, rects);
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps during a frame and produces a [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    begin: FrameBeginEvent,
    phase_starts: [Option<HostTime>; 4],
    phase_ends: [Option<HostTime>; 4],
    windows_painted: u32,
    outcome: FrameOutcome,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for the given frame.
    #[must_use]
    pub fn new(begin: &FrameBeginEvent) -> Self {
        Self {
            begin: *begin,
            phase_starts: [None; 4],
            phase_ends: [None; 4],
            windows_painted: 0,
            outcome: FrameOutcome::Presented,
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_starts[phase_index(phase)] = Some(t);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_ends[phase_index(phase)] = Some(t);
    }

    /// Sets the number of windows handed to the renderer.
    pub fn set_windows_painted(&mut self, n: u32) {
        self.windows_painted = n;
    }

    /// Sets how the frame ended.
    pub fn set_outcome(&mut self, outcome: FrameOutcome) {
        self.outcome = outcome;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        FrameSummary {
            frame_index: self.begin.frame_index,
            output: self.begin.output,
            now: self.begin.now,
            elapsed: self.begin.elapsed,
            collect_ticks: self.phase_duration(PhaseKind::Collect),
            screen_ticks: self.phase_duration(PhaseKind::Screen),
            windows_ticks: self.phase_duration(PhaseKind::Windows),
            render_ticks: self.phase_duration(PhaseKind::Render),
            windows_painted: self.windows_painted,
            outcome: self.outcome,
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase_index(phase);
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.ticks().saturating_sub(start.ticks()),
            _ => 0,
        }
    }
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Collect => 0,
        PhaseKind::Screen => 1,
        PhaseKind::Windows => 2,
        PhaseKind::Render => 3,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
