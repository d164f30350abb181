// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, one tag byte followed by the fields.
//! Effect load records carry the factory name length-prefixed; every other
//! record has a fixed size. [`decode`] reads them back as an iterator of
//! [`RecordedEvent`].
//!
//! Window and effect handles are stored raw ([`RawWindow`], `u32` effect
//! ids) since a recording outlives the session that minted them.
//!
//! Rich events ([`on_window_paints`](TraceSink::on_window_paints),
//! [`on_damage_rects`](TraceSink::on_damage_rects)) store only the count.

use gloss_core::arbitration::FullScreenChange;
use gloss_core::effect::EffectId;
use gloss_core::time::{Duration, HostTime};
use gloss_core::timing::{FrameOutcome, OutputId};
use gloss_core::trace::{
    DamageRect, EffectLoadEvent, EffectUnloadEvent, FrameBeginEvent, FrameEndEvent, FrameSummary,
    GrabAction, GrabEvent, KeepAliveAction, KeepAliveEvent, PhaseBeginEvent, PhaseEndEvent,
    PhaseKind, TraceSink, WindowPaintRecord,
};
use gloss_core::window::{DataRole, WindowEvent, WindowEventKind, WindowId};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_BEGIN: u8 = 1;
const TAG_PHASE_BEGIN: u8 = 2;
const TAG_PHASE_END: u8 = 3;
const TAG_FRAME_END: u8 = 4;
const TAG_FRAME_SUMMARY: u8 = 5;
const TAG_EFFECT_LOAD: u8 = 6;
const TAG_EFFECT_UNLOAD: u8 = 7;
const TAG_GRAB: u8 = 8;
const TAG_FULL_SCREEN: u8 = 9;
const TAG_KEEP_ALIVE: u8 = 10;
const TAG_WINDOW: u8 = 11;
const TAG_WINDOW_PAINTS_COUNT: u8 = 12;
const TAG_DAMAGE_RECTS_COUNT: u8 = 13;

// ---------------------------------------------------------------------------
// Raw handles
// ---------------------------------------------------------------------------

/// A window handle as recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawWindow {
    /// Slot index.
    pub index: u32,
    /// Generation of the slot.
    pub generation: u32,
}

impl From<WindowId> for RawWindow {
    fn from(id: WindowId) -> Self {
        Self {
            index: id.index(),
            generation: id.generation(),
        }
    }
}

/// A grab action as recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordedGrabAction {
    /// The requester became owner.
    Acquired,
    /// The requester was turned away by `holder`.
    Refused {
        /// Raw id of the owner.
        holder: u32,
    },
    /// A forced grab displaced `previous`.
    Stolen {
        /// Raw id of the displaced owner.
        previous: u32,
    },
    /// The owner let go.
    Released,
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_option_u32(&mut self, v: Option<u32>) {
        self.write_u8(u8::from(v.is_some()));
        self.write_u32(v.unwrap_or(0));
    }

    fn write_effect(&mut self, effect: Option<EffectId>) {
        self.write_option_u32(effect.map(EffectId::get));
    }

    fn write_window(&mut self, window: WindowId) {
        self.write_u32(window.index());
        self.write_u32(window.generation());
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "counts are capped at u32::MAX for recording"
    )]
    fn write_count(&mut self, n: usize) {
        self.write_u32(n.min(u32::MAX as usize) as u32);
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Collect => 0,
            PhaseKind::Screen => 1,
            PhaseKind::Windows => 2,
            PhaseKind::Render => 3,
        });
    }

    fn write_outcome(&mut self, o: FrameOutcome) {
        self.write_u8(match o {
            FrameOutcome::Idle => 0,
            FrameOutcome::Presented => 1,
            FrameOutcome::Suppressed => 2,
            FrameOutcome::Failed => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.write_u8(TAG_FRAME_BEGIN);
        self.write_u64(e.frame_index);
        self.write_u32(e.output.0);
        self.write_u64(e.now.ticks());
        self.write_u64(e.elapsed.as_nanos());
        self.write_u8(u8::from(e.full_repaint));
        self.write_u32(e.region_rects);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_frame_end(&mut self, e: &FrameEndEvent) {
        self.write_u8(TAG_FRAME_END);
        self.write_u64(e.frame_index);
        self.write_outcome(e.outcome);
        self.write_u32(e.windows_painted);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u32(s.output.0);
        self.write_u64(s.now.ticks());
        self.write_u64(s.elapsed.as_nanos());
        self.write_u64(s.collect_ticks);
        self.write_u64(s.screen_ticks);
        self.write_u64(s.windows_ticks);
        self.write_u64(s.render_ticks);
        self.write_u32(s.windows_painted);
        self.write_outcome(s.outcome);
    }

    fn on_effect_load(&mut self, e: &EffectLoadEvent<'_>) {
        self.write_u8(TAG_EFFECT_LOAD);
        self.write_effect(e.effect);
        self.write_u8(u8::from(e.error.is_some()));
        let name = e.name.as_bytes();
        self.write_count(name.len());
        self.buf
            .extend_from_slice(&name[..name.len().min(u32::MAX as usize)]);
    }

    fn on_effect_unload(&mut self, e: &EffectUnloadEvent) {
        self.write_u8(TAG_EFFECT_UNLOAD);
        self.write_u32(e.effect.get());
        self.write_u32(e.grabs_released);
        self.write_u32(e.windows_freed);
        self.write_u8(u8::from(e.held_full_screen));
    }

    fn on_grab(&mut self, e: &GrabEvent) {
        self.write_u8(TAG_GRAB);
        self.write_window(e.window);
        self.write_u32(e.role.0);
        self.write_u32(e.effect.get());
        let (code, other) = match e.action {
            GrabAction::Acquired => (0, 0),
            GrabAction::Refused { holder } => (1, holder.get()),
            GrabAction::Stolen { previous } => (2, previous.get()),
            GrabAction::Released => (3, 0),
        };
        self.write_u8(code);
        self.write_u32(other);
    }

    fn on_full_screen(&mut self, e: &FullScreenChange) {
        self.write_u8(TAG_FULL_SCREEN);
        self.write_effect(e.previous);
        self.write_effect(e.current);
    }

    fn on_keep_alive(&mut self, e: &KeepAliveEvent) {
        self.write_u8(TAG_KEEP_ALIVE);
        self.write_window(e.window);
        self.write_u32(e.effect.get());
        self.write_u8(u8::from(e.action == KeepAliveAction::Acquired));
        self.write_u32(e.count);
    }

    fn on_window(&mut self, e: &WindowEvent) {
        self.write_u8(TAG_WINDOW);
        self.write_window(e.window);
        self.write_u8(match e.kind {
            WindowEventKind::Added => 0,
            WindowEventKind::Shown => 1,
            WindowEventKind::Hidden => 2,
            WindowEventKind::Minimized => 3,
            WindowEventKind::Unminimized => 4,
            WindowEventKind::Closed => 5,
            WindowEventKind::Deleted => 6,
        });
    }

    fn on_window_paints(&mut self, frame_index: u64, records: &[WindowPaintRecord]) {
        self.write_u8(TAG_WINDOW_PAINTS_COUNT);
        self.write_u64(frame_index);
        self.write_count(records.len());
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        self.write_u8(TAG_DAMAGE_RECTS_COUNT);
        self.write_u64(frame_index);
        self.write_count(rects.len());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`FrameBeginEvent`].
    FrameBegin(FrameBeginEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`FrameEndEvent`].
    FrameEnd(FrameEndEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
    /// An effect load or load failure.
    EffectLoad {
        /// Factory name.
        name: String,
        /// Raw id of the loaded effect.
        effect: Option<u32>,
        /// Whether the load failed.
        failed: bool,
    },
    /// An effect unload.
    EffectUnload {
        /// Raw effect id.
        effect: u32,
        /// Grab roles released.
        grabs_released: u32,
        /// Windows freed.
        windows_freed: u32,
        /// Whether it held the full-screen slot.
        held_full_screen: bool,
    },
    /// Grab traffic.
    Grab {
        /// The window.
        window: RawWindow,
        /// The role.
        role: DataRole,
        /// Raw id of the requesting effect.
        effect: u32,
        /// What happened.
        action: RecordedGrabAction,
    },
    /// The full-screen slot changed hands.
    FullScreen {
        /// Raw id of the previous holder.
        previous: Option<u32>,
        /// Raw id of the new holder.
        current: Option<u32>,
    },
    /// Keep-alive traffic.
    KeepAlive {
        /// The window.
        window: RawWindow,
        /// Raw id of the contributing effect.
        effect: u32,
        /// Acquired or released.
        action: KeepAliveAction,
        /// Total references afterwards.
        count: u32,
    },
    /// A window lifecycle transition.
    Window {
        /// The window.
        window: RawWindow,
        /// What happened.
        kind: WindowEventKind,
    },
    /// Window paint record count for a frame.
    WindowPaintsCount {
        /// Frame counter.
        frame_index: u64,
        /// Number of windows painted.
        count: u32,
    },
    /// Damage-rect count for a frame.
    DamageRectsCount {
        /// Frame counter.
        frame_index: u64,
        /// Number of damage rects.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_bytes(&mut self, n: usize) -> Option<&[u8]> {
        if self.remaining() < n {
            return None;
        }
        let v = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Some(v)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.read_bytes(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.read_bytes(8)?.try_into().ok()?))
    }

    fn read_option_u32(&mut self) -> Option<Option<u32>> {
        let present = self.read_u8()?;
        let val = self.read_u32()?;
        Some((present != 0).then_some(val))
    }

    fn read_window(&mut self) -> Option<RawWindow> {
        Some(RawWindow {
            index: self.read_u32()?,
            generation: self.read_u32()?,
        })
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Collect,
            1 => PhaseKind::Screen,
            2 => PhaseKind::Windows,
            _ => PhaseKind::Render,
        })
    }

    fn read_outcome(&mut self) -> Option<FrameOutcome> {
        Some(match self.read_u8()? {
            0 => FrameOutcome::Idle,
            1 => FrameOutcome::Presented,
            2 => FrameOutcome::Suppressed,
            _ => FrameOutcome::Failed,
        })
    }

    fn decode_frame_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameBegin(FrameBeginEvent {
            frame_index: self.read_u64()?,
            output: OutputId(self.read_u32()?),
            now: HostTime(self.read_u64()?),
            elapsed: Duration::from_nanos(self.read_u64()?),
            full_repaint: self.read_u8()? != 0,
            region_rects: self.read_u32()?,
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_frame_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameEnd(FrameEndEvent {
            frame_index: self.read_u64()?,
            outcome: self.read_outcome()?,
            windows_painted: self.read_u32()?,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index: self.read_u64()?,
            output: OutputId(self.read_u32()?),
            now: HostTime(self.read_u64()?),
            elapsed: Duration::from_nanos(self.read_u64()?),
            collect_ticks: self.read_u64()?,
            screen_ticks: self.read_u64()?,
            windows_ticks: self.read_u64()?,
            render_ticks: self.read_u64()?,
            windows_painted: self.read_u32()?,
            outcome: self.read_outcome()?,
        }))
    }

    fn decode_effect_load(&mut self) -> Option<RecordedEvent> {
        let effect = self.read_option_u32()?;
        let failed = self.read_u8()? != 0;
        let len = usize::try_from(self.read_u32()?).ok()?;
        let name = String::from_utf8_lossy(self.read_bytes(len)?).into_owned();
        Some(RecordedEvent::EffectLoad {
            name,
            effect,
            failed,
        })
    }

    fn decode_effect_unload(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::EffectUnload {
            effect: self.read_u32()?,
            grabs_released: self.read_u32()?,
            windows_freed: self.read_u32()?,
            held_full_screen: self.read_u8()? != 0,
        })
    }

    fn decode_grab(&mut self) -> Option<RecordedEvent> {
        let window = self.read_window()?;
        let role = DataRole(self.read_u32()?);
        let effect = self.read_u32()?;
        let code = self.read_u8()?;
        let other = self.read_u32()?;
        let action = match code {
            0 => RecordedGrabAction::Acquired,
            1 => RecordedGrabAction::Refused { holder: other },
            2 => RecordedGrabAction::Stolen { previous: other },
            _ => RecordedGrabAction::Released,
        };
        Some(RecordedEvent::Grab {
            window,
            role,
            effect,
            action,
        })
    }

    fn decode_full_screen(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FullScreen {
            previous: self.read_option_u32()?,
            current: self.read_option_u32()?,
        })
    }

    fn decode_keep_alive(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::KeepAlive {
            window: self.read_window()?,
            effect: self.read_u32()?,
            action: if self.read_u8()? != 0 {
                KeepAliveAction::Acquired
            } else {
                KeepAliveAction::Released
            },
            count: self.read_u32()?,
        })
    }

    fn decode_window(&mut self) -> Option<RecordedEvent> {
        let window = self.read_window()?;
        let kind = match self.read_u8()? {
            0 => WindowEventKind::Added,
            1 => WindowEventKind::Shown,
            2 => WindowEventKind::Hidden,
            3 => WindowEventKind::Minimized,
            4 => WindowEventKind::Unminimized,
            5 => WindowEventKind::Closed,
            _ => WindowEventKind::Deleted,
        };
        Some(RecordedEvent::Window { window, kind })
    }

    fn decode_count(&mut self) -> Option<(u64, u32)> {
        Some((self.read_u64()?, self.read_u32()?))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_FRAME_BEGIN => self.decode_frame_begin(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_FRAME_END => self.decode_frame_end(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            TAG_EFFECT_LOAD => self.decode_effect_load(),
            TAG_EFFECT_UNLOAD => self.decode_effect_unload(),
            TAG_GRAB => self.decode_grab(),
            TAG_FULL_SCREEN => self.decode_full_screen(),
            TAG_KEEP_ALIVE => self.decode_keep_alive(),
            TAG_WINDOW => self.decode_window(),
            TAG_WINDOW_PAINTS_COUNT => {
                let (frame_index, count) = self.decode_count()?;
                Some(RecordedEvent::WindowPaintsCount { frame_index, count })
            }
            TAG_DAMAGE_RECTS_COUNT => {
                let (frame_index, count) = self.decode_count()?;
                Some(RecordedEvent::DamageRectsCount { frame_index, count })
            }
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
