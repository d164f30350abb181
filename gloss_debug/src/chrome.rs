// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Phases become duration slices on thread 0. Arbitration traffic (grabs,
//! keep-alive references, the full-screen slot) is placed on thread 1 so it
//! reads as a separate track; lifecycle events go to thread 2. Events that
//! carry no timestamp of their own inherit the time of the last frame
//! begin.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use gloss_core::time::Timebase;

use crate::recorder::{RecordedEvent, RecordedGrabAction, decode};

const TID_FRAME: u32 = 0;
const TID_ARBITRATION: u32 = 1;
const TID_LIFECYCLE: u32 = 2;

fn instant(name: &str, cat: &str, ts: f64, tid: u32, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": ts,
        "pid": 0,
        "tid": tid,
        "s": "t",
        "args": args,
    })
}

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last_ts = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FrameBegin(e) => {
                last_ts = ticks_to_us(e.now.ticks(), timebase);
                events.push(json!({
                    "ph": "i",
                    "name": "FrameBegin",
                    "cat": "Scheduler",
                    "ts": last_ts,
                    "pid": e.output.0,
                    "tid": TID_FRAME,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                        "elapsed_ms": e.elapsed.as_millis_f64(),
                        "full_repaint": e.full_repaint,
                        "region_rects": e.region_rects,
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}", e.phase),
                    "cat": "Frame",
                    "ts": ticks_to_us(e.timestamp.ticks(), timebase),
                    "pid": 0,
                    "tid": TID_FRAME,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": format!("{:?}", e.phase),
                    "cat": "Frame",
                    "ts": ticks_to_us(e.timestamp.ticks(), timebase),
                    "pid": 0,
                    "tid": TID_FRAME,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::FrameEnd(e) => {
                events.push(instant(
                    "FrameEnd",
                    "Frame",
                    last_ts,
                    TID_FRAME,
                    json!({
                        "frame_index": e.frame_index,
                        "outcome": format!("{:?}", e.outcome),
                        "windows_painted": e.windows_painted,
                    }),
                ));
            }
            RecordedEvent::FrameSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSummary",
                    "cat": "Summary",
                    "ts": ticks_to_us(s.now.ticks(), timebase),
                    "pid": s.output.0,
                    "tid": TID_FRAME,
                    "s": "g",
                    "args": {
                        "frame_index": s.frame_index,
                        "collect_us": ticks_to_us(s.collect_ticks, timebase),
                        "screen_us": ticks_to_us(s.screen_ticks, timebase),
                        "windows_us": ticks_to_us(s.windows_ticks, timebase),
                        "render_us": ticks_to_us(s.render_ticks, timebase),
                        "windows_painted": s.windows_painted,
                        "outcome": format!("{:?}", s.outcome),
                    }
                }));
            }
            RecordedEvent::EffectLoad {
                name,
                effect,
                failed,
            } => {
                events.push(instant(
                    if failed { "EffectLoadFailed" } else { "EffectLoad" },
                    "Effects",
                    last_ts,
                    TID_LIFECYCLE,
                    json!({ "name": name, "effect": effect }),
                ));
            }
            RecordedEvent::EffectUnload {
                effect,
                grabs_released,
                windows_freed,
                held_full_screen,
            } => {
                events.push(instant(
                    "EffectUnload",
                    "Effects",
                    last_ts,
                    TID_LIFECYCLE,
                    json!({
                        "effect": effect,
                        "grabs_released": grabs_released,
                        "windows_freed": windows_freed,
                        "held_full_screen": held_full_screen,
                    }),
                ));
            }
            RecordedEvent::Grab {
                window,
                role,
                effect,
                action,
            } => {
                let (name, other) = match action {
                    RecordedGrabAction::Acquired => ("Grab", None),
                    RecordedGrabAction::Refused { holder } => ("GrabRefused", Some(holder)),
                    RecordedGrabAction::Stolen { previous } => ("GrabStolen", Some(previous)),
                    RecordedGrabAction::Released => ("Ungrab", None),
                };
                events.push(instant(
                    name,
                    "Arbitration",
                    last_ts,
                    TID_ARBITRATION,
                    json!({
                        "window": window.index,
                        "generation": window.generation,
                        "role": format!("{role:?}"),
                        "effect": effect,
                        "other": other,
                    }),
                ));
            }
            RecordedEvent::FullScreen { previous, current } => {
                events.push(instant(
                    "FullScreen",
                    "Arbitration",
                    last_ts,
                    TID_ARBITRATION,
                    json!({ "previous": previous, "current": current }),
                ));
            }
            RecordedEvent::KeepAlive {
                window,
                effect,
                action,
                count,
            } => {
                events.push(instant(
                    "KeepAlive",
                    "Arbitration",
                    last_ts,
                    TID_ARBITRATION,
                    json!({
                        "window": window.index,
                        "generation": window.generation,
                        "effect": effect,
                        "action": format!("{action:?}"),
                        "count": count,
                    }),
                ));
            }
            RecordedEvent::Window { window, kind } => {
                events.push(instant(
                    &format!("Window{kind:?}"),
                    "Windows",
                    last_ts,
                    TID_LIFECYCLE,
                    json!({
                        "window": window.index,
                        "generation": window.generation,
                    }),
                ));
            }
            RecordedEvent::WindowPaintsCount { frame_index, count } => {
                events.push(instant(
                    "WindowPaints",
                    "Rich",
                    last_ts,
                    TID_FRAME,
                    json!({ "frame_index": frame_index, "count": count }),
                ));
            }
            RecordedEvent::DamageRectsCount { frame_index, count } => {
                events.push(instant(
                    "DamageRects",
                    "Rich",
                    last_ts,
                    TID_FRAME,
                    json!({ "frame_index": frame_index, "count": count }),
                ));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use gloss_core::time::{Duration, HostTime};
    use gloss_core::timing::OutputId;
    use gloss_core::trace::{
        FrameBeginEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 0,
            output: OutputId(0),
            now: HostTime(1_000_000),
            elapsed: Duration::ZERO,
            full_repaint: true,
            region_rects: 0,
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            frame_index: 0,
            phase: PhaseKind::Collect,
            timestamp: HostTime(1_000_000),
        });
        rec.on_phase_end(&PhaseEndEvent {
            frame_index: 0,
            phase: PhaseKind::Collect,
            timestamp: HostTime(1_000_100),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), Timebase::NANOS, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "FrameBegin");

        assert_eq!(parsed[1]["ph"], "B");
        assert_eq!(parsed[1]["name"], "Collect");

        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["name"], "Collect");
    }

    #[test]
    fn arbitration_goes_to_its_own_track() {
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 4,
            output: OutputId(0),
            now: HostTime(2_000_000),
            elapsed: Duration::from_millis(16),
            full_repaint: false,
            region_rects: 1,
        });
        rec.on_full_screen(&gloss_core::arbitration::FullScreenChange {
            previous: None,
            current: None,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), Timebase::NANOS, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[1]["name"], "FullScreen");
        assert_eq!(parsed[1]["tid"], TID_ARBITRATION);
        assert_eq!(parsed[1]["ts"], 2000.0, "inherits the frame's time");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], Timebase::NANOS, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
