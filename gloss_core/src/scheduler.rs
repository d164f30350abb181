// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame scheduling and damage accounting.
//!
//! The [`FrameScheduler`] decides whether a [`FrameTick`] needs a paint and,
//! if so, which region. It accumulates damage and repaint requests between
//! ticks, hands the union to one drive cycle as a [`FramePlan`], and takes
//! it back if the cycle fails. See the [`FrameScheduler`] struct docs for
//! the exact accounting.

use crate::region::Region;
use crate::signal::{Signal, SubscriptionId};
use crate::time::{Duration, HostTime, Timebase};
use crate::timing::{FrameOutcome, FrameTick, OutputId};

/// What happens to the damage of a failed frame.
///
/// Passed to the [`FrameScheduler`] via [`SchedulerConfig::failure_policy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailurePolicy {
    /// Retry exactly the damaged region on the next cycle.
    KeepDamage,
    /// Retry the damaged region, and repaint the whole output after
    /// `after` consecutive failures (the back buffer contents can no longer
    /// be trusted by then).
    EscalateToFull {
        /// Number of consecutive failures before a full repaint.
        after: u32,
    },
}

/// Configuration for the [`FrameScheduler`].
#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    /// EMA smoothing factor for paint cost estimation (0.0–1.0).
    /// Smaller values = more smoothing.
    pub ema_alpha: f32,
    /// Upper bound on the elapsed time reported to effects for one frame.
    /// Keeps animations from jumping after a stall.
    pub max_elapsed: Duration,
    /// Policy for failed frames.
    pub failure_policy: FailurePolicy,
}

impl SchedulerConfig {
    /// Defaults for a desktop session.
    #[must_use]
    pub const fn desktop() -> Self {
        Self {
            ema_alpha: 0.2,
            max_elapsed: Duration::from_millis(100),
            failure_policy: FailurePolicy::EscalateToFull { after: 3 },
        }
    }

    /// Defaults for headless runs: no elapsed clamping, exact retries.
    #[must_use]
    pub const fn headless() -> Self {
        Self {
            ema_alpha: 0.2,
            max_elapsed: Duration::MAX,
            failure_policy: FailurePolicy::KeepDamage,
        }
    }
}

/// Exponential moving average tracker.
#[derive(Clone, Copy, Debug)]
struct Ema {
    value: f32,
    alpha: f32,
    initialized: bool,
}

impl Ema {
    const fn new(alpha: f32) -> Self {
        Self {
            value: 0.0,
            alpha,
            initialized: false,
        }
    }

    fn update(&mut self, sample: f32) {
        if self.initialized {
            self.value = self.alpha * sample + (1.0 - self.alpha) * self.value;
        } else {
            self.value = sample;
            self.initialized = true;
        }
    }

    const fn get(&self) -> f32 {
        self.value
    }
}

/// The plan for one drive cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePlan {
    /// Frame counter, carried from the originating [`FrameTick`].
    pub frame_index: u64,
    /// Which output this frame targets.
    pub output: OutputId,
    /// Host time of the tick.
    pub now: HostTime,
    /// Time since the previous painted frame, handed to pre-paint stages.
    /// Zero for the first frame after the scheduler went idle.
    pub elapsed: Duration,
    /// The frame's working region: all damage and repaints since the last
    /// successful frame.
    pub region: Region,
}

/// Published after every drive cycle that ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame counter.
    pub frame_index: u64,
    /// How the cycle ended.
    pub outcome: FrameOutcome,
    /// Measured paint cost.
    pub paint_cost: Duration,
}

/// Decides when and what to repaint.
///
/// # Accounting
///
/// Damage and repaint requests accumulate in a *pending* region. When a
/// tick arrives with pending work, [`plan`](Self::plan) moves the pending
/// region into the plan; requests made while the frame runs (for example by
/// an effect keeping its animation going) land in a fresh pending region
/// for the next cycle. [`observe`](Self::observe) then either drops the
/// planned region (the frame consumed it) or merges it back (the frame
/// failed), so no damage is ever silently lost.
///
/// A tick with nothing pending produces no plan and breaks the elapsed-time
/// chain: the next planned frame reports zero elapsed time rather than the
/// whole idle gap.
#[derive(Debug)]
pub struct FrameScheduler {
    config: SchedulerConfig,
    pending: Region,
    in_flight: Option<Region>,
    last_frame: Option<HostTime>,
    consecutive_failures: u32,
    paint_cost_ema: Ema,
    presented: Signal<FrameReport>,
}

impl FrameScheduler {
    /// Creates a scheduler with the given configuration. The first tick
    /// repaints the whole output.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            paint_cost_ema: Ema::new(config.ema_alpha),
            config,
            pending: Region::Full,
            in_flight: None,
            last_frame: None,
            consecutive_failures: 0,
            presented: Signal::new(),
        }
    }

    /// Adds a screen-space region to the next frame.
    pub fn add_region(&mut self, region: &Region) {
        self.pending.merge(region);
    }

    /// Adds a screen-space rectangle to the next frame.
    pub fn add_rect(&mut self, rect: kurbo::Rect) {
        self.pending.add_rect(rect);
    }

    /// Schedules a repaint of the whole output.
    pub fn add_repaint_full(&mut self) {
        self.pending = Region::Full;
    }

    /// Returns whether a tick would currently produce a frame.
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Returns the region queued for the next frame.
    #[must_use]
    pub fn pending(&self) -> &Region {
        &self.pending
    }

    /// Produces a plan for `tick`, or `None` if nothing needs painting.
    ///
    /// # Panics
    ///
    /// Panics if the previous plan was not resolved with
    /// [`observe`](Self::observe).
    pub fn plan(&mut self, tick: &FrameTick, timebase: Timebase) -> Option<FramePlan> {
        assert!(
            self.in_flight.is_none(),
            "previous frame plan was never observed"
        );
        if self.pending.is_empty() {
            self.last_frame = None;
            return None;
        }

        let elapsed = match self.last_frame {
            Some(prev) => {
                let e = tick.now.duration_since(prev, timebase);
                if e > self.config.max_elapsed {
                    self.config.max_elapsed
                } else {
                    e
                }
            }
            None => Duration::ZERO,
        };
        self.last_frame = Some(tick.now);

        let region = core::mem::take(&mut self.pending);
        self.in_flight = Some(region.clone());

        Some(FramePlan {
            frame_index: tick.frame_index,
            output: tick.output,
            now: tick.now,
            elapsed,
            region,
        })
    }

    /// Resolves the in-flight plan with the cycle's outcome.
    pub fn observe(&mut self, frame_index: u64, outcome: FrameOutcome, paint_cost: Duration) {
        let Some(planned) = self.in_flight.take() else {
            return;
        };

        if outcome.consumed_damage() {
            self.consecutive_failures = 0;
            self.paint_cost_ema.update(paint_cost.as_nanos() as f32);
        } else {
            self.consecutive_failures += 1;
            self.pending.merge(&planned);
            if let FailurePolicy::EscalateToFull { after } = self.config.failure_policy
                && self.consecutive_failures >= after
            {
                self.pending = Region::Full;
            }
        }

        self.presented.emit(&FrameReport {
            frame_index,
            outcome,
            paint_cost,
        });
    }

    /// Returns the smoothed paint cost.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "EMA-smoothed paint cost in nanoseconds fits in u64"
    )]
    pub fn paint_cost(&self) -> Duration {
        Duration(self.paint_cost_ema.get() as u64)
    }

    /// Returns the number of failed frames since the last success.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Subscribes to per-frame reports.
    pub fn on_frame(&mut self, callback: impl FnMut(&FrameReport) + 'static) -> SubscriptionId {
        self.presented.subscribe(callback)
    }

    /// Revokes a [`on_frame`](Self::on_frame) subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.presented.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use kurbo::Rect;

    use super::*;

    fn make_tick(frame_index: u64, now_ms: u64) -> FrameTick {
        FrameTick::new(frame_index, HostTime(now_ms * 1_000_000))
    }

    fn settled(config: SchedulerConfig) -> FrameScheduler {
        let mut sched = FrameScheduler::new(config);
        let plan = sched.plan(&make_tick(0, 0), Timebase::NANOS);
        assert!(plan.is_some(), "the first tick repaints everything");
        sched.observe(0, FrameOutcome::Presented, Duration::ZERO);
        sched
    }

    #[test]
    fn idle_ticks_produce_no_plan() {
        let mut sched = settled(SchedulerConfig::headless());
        assert!(!sched.needs_frame());
        assert_eq!(sched.plan(&make_tick(1, 16), Timebase::NANOS), None);
    }

    #[test]
    fn success_consumes_damage() {
        let mut sched = settled(SchedulerConfig::headless());
        sched.add_rect(Rect::new(0.0, 0.0, 10.0, 10.0));

        let plan = sched.plan(&make_tick(1, 16), Timebase::NANOS).unwrap();
        assert_eq!(plan.region.rects(), &[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        sched.observe(plan.frame_index, FrameOutcome::Presented, Duration::ZERO);

        assert!(!sched.needs_frame(), "painted damage is gone");
    }

    #[test]
    fn failure_keeps_damage() {
        let mut sched = settled(SchedulerConfig::headless());
        sched.add_rect(Rect::new(0.0, 0.0, 10.0, 10.0));

        let plan = sched.plan(&make_tick(1, 16), Timebase::NANOS).unwrap();
        sched.observe(plan.frame_index, FrameOutcome::Failed, Duration::ZERO);

        assert!(sched.needs_frame(), "failed frame retries");
        assert_eq!(sched.pending().rects(), &[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        assert_eq!(sched.consecutive_failures(), 1);
    }

    #[test]
    fn requests_during_a_frame_go_to_the_next_one() {
        let mut sched = settled(SchedulerConfig::headless());
        sched.add_rect(Rect::new(0.0, 0.0, 10.0, 10.0));

        let plan = sched.plan(&make_tick(1, 16), Timebase::NANOS).unwrap();
        sched.add_rect(Rect::new(50.0, 50.0, 60.0, 60.0));
        sched.observe(plan.frame_index, FrameOutcome::Presented, Duration::ZERO);

        assert_eq!(
            sched.pending().rects(),
            &[Rect::new(50.0, 50.0, 60.0, 60.0)],
            "only the mid-frame request remains"
        );
    }

    #[test]
    fn repeated_failures_escalate() {
        let mut config = SchedulerConfig::headless();
        config.failure_policy = FailurePolicy::EscalateToFull { after: 2 };
        let mut sched = settled(config);
        sched.add_rect(Rect::new(0.0, 0.0, 10.0, 10.0));

        for i in 1..=2 {
            let plan = sched.plan(&make_tick(i, i * 16), Timebase::NANOS).unwrap();
            sched.observe(plan.frame_index, FrameOutcome::Failed, Duration::ZERO);
        }
        assert!(sched.pending().is_full(), "second failure escalates");
    }

    #[test]
    fn elapsed_time_chains_between_frames() {
        let mut sched = settled(SchedulerConfig::headless());
        sched.add_repaint_full();
        let plan = sched.plan(&make_tick(1, 16), Timebase::NANOS).unwrap();
        assert_eq!(plan.elapsed, Duration::from_millis(16));
        sched.observe(1, FrameOutcome::Presented, Duration::ZERO);

        // Idle tick breaks the chain.
        assert!(sched.plan(&make_tick(2, 32), Timebase::NANOS).is_none());
        sched.add_repaint_full();
        let plan = sched.plan(&make_tick(3, 5000), Timebase::NANOS).unwrap();
        assert_eq!(plan.elapsed, Duration::ZERO, "first frame after idle");
    }

    #[test]
    fn elapsed_time_is_clamped() {
        let mut sched = settled(SchedulerConfig::desktop());
        sched.add_repaint_full();
        let plan = sched.plan(&make_tick(1, 2000), Timebase::NANOS).unwrap();
        assert_eq!(plan.elapsed, Duration::from_millis(100), "clamped stall");
    }

    #[test]
    fn paint_cost_is_smoothed() {
        let mut config = SchedulerConfig::headless();
        config.ema_alpha = 0.5;
        let mut sched = FrameScheduler::new(config);
        for (i, cost) in [(0, 1000), (1, 3000)] {
            sched.add_repaint_full();
            let _ = sched.plan(&make_tick(i, i * 16), Timebase::NANOS);
            sched.observe(i, FrameOutcome::Presented, Duration(cost));
        }
        assert_eq!(sched.paint_cost(), Duration(2000), "0.5 * 3000 + 0.5 * 1000");
    }

    #[test]
    fn reports_reach_subscribers() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut sched = FrameScheduler::new(SchedulerConfig::headless());
        let s = Rc::clone(&seen);
        let id = sched.on_frame(move |r| s.borrow_mut().push((r.frame_index, r.outcome)));

        let _ = sched.plan(&make_tick(7, 0), Timebase::NANOS);
        sched.observe(7, FrameOutcome::Failed, Duration::ZERO);
        assert!(sched.unsubscribe(id));
        let _ = sched.plan(&make_tick(8, 16), Timebase::NANOS);
        sched.observe(8, FrameOutcome::Presented, Duration::ZERO);

        assert_eq!(*seen.borrow(), [(7, FrameOutcome::Failed)]);
    }
}
