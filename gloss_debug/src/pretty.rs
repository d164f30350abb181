// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to microseconds using a [`Timebase`].

use std::io::Write;

use gloss_core::arbitration::FullScreenChange;
use gloss_core::effect::EffectId;
use gloss_core::time::{HostTime, Timebase};
use gloss_core::trace::{
    DamageRect, EffectLoadEvent, EffectUnloadEvent, FrameBeginEvent, FrameEndEvent, FrameSummary,
    GrabAction, GrabEvent, KeepAliveEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
    WindowPaintRecord,
};
use gloss_core::window::WindowEvent;

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink and returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ticks_to_us(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1000.0
    }

    fn host_us(&self, t: HostTime) -> f64 {
        self.ticks_to_us(t.ticks())
    }
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Collect => "collect",
        PhaseKind::Screen => "screen",
        PhaseKind::Windows => "windows",
        PhaseKind::Render => "render",
    }
}

/// `#3`, or `-` for nobody.
fn effect_label(effect: Option<EffectId>) -> String {
    effect.map_or_else(|| "-".to_owned(), |e| format!("#{}", e.get()))
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let region = if e.full_repaint {
            "full".to_owned()
        } else {
            format!("{} rects", e.region_rects)
        };
        let _ = writeln!(
            self.writer,
            "[frame] frame={} output={} now={:.1}µs elapsed={:.1}ms region={region}",
            e.frame_index,
            e.output.0,
            self.host_us(e.now),
            e.elapsed.as_millis_f64(),
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {} at {:.1}µs",
            e.frame_index,
            phase_name(e.phase),
            self.host_us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} at {:.1}µs",
            e.frame_index,
            phase_name(e.phase),
            self.host_us(e.timestamp),
        );
    }

    fn on_frame_end(&mut self, e: &FrameEndEvent) {
        let _ = writeln!(
            self.writer,
            "[end] frame={} {:?} windows={}",
            e.frame_index, e.outcome, e.windows_painted,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} collect={:.1}µs screen={:.1}µs windows={:.1}µs \
             render={:.1}µs painted={} outcome={:?}",
            s.frame_index,
            self.ticks_to_us(s.collect_ticks),
            self.ticks_to_us(s.screen_ticks),
            self.ticks_to_us(s.windows_ticks),
            self.ticks_to_us(s.render_ticks),
            s.windows_painted,
            s.outcome,
        );
    }

    fn on_effect_load(&mut self, e: &EffectLoadEvent<'_>) {
        let _ = match e.error {
            Some(error) => writeln!(self.writer, "[effect:fail] {} {error}", e.name),
            None => writeln!(
                self.writer,
                "[effect:load] {} {}",
                e.name,
                effect_label(e.effect)
            ),
        };
    }

    fn on_effect_unload(&mut self, e: &EffectUnloadEvent) {
        let _ = writeln!(
            self.writer,
            "[effect:unload] #{} grabs={} freed={} full_screen={}",
            e.effect.get(),
            e.grabs_released,
            e.windows_freed,
            e.held_full_screen,
        );
    }

    fn on_grab(&mut self, e: &GrabEvent) {
        let action = match e.action {
            GrabAction::Acquired => "acquired".to_owned(),
            GrabAction::Refused { holder } => format!("refused (held by #{})", holder.get()),
            GrabAction::Stolen { previous } => format!("stolen from #{}", previous.get()),
            GrabAction::Released => "released".to_owned(),
        };
        let _ = writeln!(
            self.writer,
            "[grab] {:?} {:?} #{} {action}",
            e.window,
            e.role,
            e.effect.get(),
        );
    }

    fn on_full_screen(&mut self, e: &FullScreenChange) {
        let _ = writeln!(
            self.writer,
            "[full-screen] {} -> {}",
            effect_label(e.previous),
            effect_label(e.current),
        );
    }

    fn on_keep_alive(&mut self, e: &KeepAliveEvent) {
        let _ = writeln!(
            self.writer,
            "[keep-alive] {:?} #{} {:?} count={}",
            e.window,
            e.effect.get(),
            e.action,
            e.count,
        );
    }

    fn on_window(&mut self, e: &WindowEvent) {
        let _ = writeln!(self.writer, "[window] {:?} {:?}", e.window, e.kind);
    }

    fn on_window_paints(&mut self, frame_index: u64, records: &[WindowPaintRecord]) {
        let _ = writeln!(
            self.writer,
            "[paints] frame={frame_index} windows={}",
            records.len(),
        );
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        let _ = writeln!(
            self.writer,
            "[damage] frame={frame_index} rects={}",
            rects.len(),
        );
    }
}

#[cfg(test)]
mod tests {
    use gloss_core::effect::EffectKind;
    use gloss_core::error::LoadError;
    use gloss_core::time::Duration;
    use gloss_core::timing::{FrameTick, OutputId};
    use gloss_core::{Compositor, CompositorConfig};
    use gloss_render::PlanRecorder;
    use kurbo::Rect;

    use super::*;

    #[test]
    fn pretty_print_frame_begin() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        sink.on_frame_begin(&FrameBeginEvent {
            frame_index: 1,
            output: OutputId(0),
            now: HostTime(1_000_000),
            elapsed: Duration::from_millis(16),
            full_repaint: true,
            region_rects: 0,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[frame]"), "got: {output}");
        assert!(output.contains("frame=1"), "got: {output}");
        assert!(output.contains("region=full"), "got: {output}");
    }

    #[test]
    fn failed_loads_show_the_error() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        let error = LoadError::Unknown("wobbly".into());
        sink.on_effect_load(&EffectLoadEvent {
            name: "wobbly",
            effect: None,
            error: Some(&error),
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.starts_with("[effect:fail] wobbly"), "got: {output}");
    }

    #[test]
    fn live_session_emits_lines() {
        let mut comp = Compositor::new(CompositorConfig::desktop());
        comp.set_trace_sink(Some(Box::new(PrettyPrintSink::new(
            Box::new(std::io::sink()),
            Timebase::NANOS,
        ))));
        comp.add_effect(EffectKind::native(gloss_effects::FadeEffect::default()))
            .unwrap();
        comp.add_window(Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut rec = PlanRecorder::new();
        comp.paint_frame(&FrameTick::new(0, HostTime(0)), &mut rec);
        assert_eq!(rec.presented(), 1);
    }
}
