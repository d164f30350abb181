// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The progress state machine underlying one animation.

use crate::animation::Easing;
use crate::time::Duration;

/// Which way a timeline runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// From source (value 0) toward target (value 1).
    #[default]
    Forward,
    /// From target toward source.
    Backward,
}

impl Direction {
    /// Returns the other direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// How a timeline reacts to a direction change at one of its ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RedirectMode {
    /// Reaching the end is final.
    Strict,
    /// The timeline may resume running.
    Relaxed,
}

/// Elapsed time over a fixed duration, read through an easing curve.
///
/// Elapsed time always counts up from zero to `duration`; the direction
/// decides whether progress maps to `curve(t)` or `curve(1 - t)`. Reversing
/// a running timeline rewrites elapsed to `duration - elapsed`, which keeps
/// the displayed value where it was.
///
/// What reversing does at the ends is governed by two [`RedirectMode`]s:
///
/// - The *source* mode applies to a timeline that has not started yet.
///   Relaxed (the default) just flips the direction; Strict jumps to the
///   end, so the timeline is done at the value it started from.
/// - The *target* mode applies to a done timeline. Strict (the default)
///   keeps it done; Relaxed restarts it toward the other end.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timeline {
    elapsed: Duration,
    duration: Duration,
    easing: Easing,
    direction: Direction,
    source_mode: RedirectMode,
    target_mode: RedirectMode,
    done: bool,
}

impl Timeline {
    /// Creates a forward timeline at its start.
    ///
    /// A zero-length timeline is done from the outset.
    #[must_use]
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration,
            easing,
            direction: Direction::Forward,
            source_mode: RedirectMode::Relaxed,
            target_mode: RedirectMode::Strict,
            done: duration.is_zero(),
        }
    }

    // -- Getters --

    /// Time run so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Total length.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Current direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The easing curve.
    #[must_use]
    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Source redirect mode.
    #[must_use]
    pub fn source_redirect_mode(&self) -> RedirectMode {
        self.source_mode
    }

    /// Target redirect mode.
    #[must_use]
    pub fn target_redirect_mode(&self) -> RedirectMode {
        self.target_mode
    }

    /// Whether the timeline reached its end.
    #[must_use]
    pub fn done(&self) -> bool {
        self.done
    }

    /// Whether the timeline has started and not finished.
    #[must_use]
    pub fn running(&self) -> bool {
        !self.done && !self.elapsed.is_zero() && self.elapsed < self.duration
    }

    /// Linear progress through the current run, `0.0` to `1.0`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.elapsed.fraction_of(self.duration)
    }

    /// Linear position between source (`0.0`) and target (`1.0`).
    #[must_use]
    pub fn position(&self) -> f64 {
        match self.direction {
            Direction::Forward => self.progress(),
            Direction::Backward => 1.0 - self.progress(),
        }
    }

    /// Eased position between source and target.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.easing.apply(self.position())
    }

    // -- Mutators --

    /// Sets the easing curve.
    pub fn set_easing(&mut self, easing: Easing) {
        self.easing = easing;
    }

    /// Sets the source redirect mode.
    pub fn set_source_redirect_mode(&mut self, mode: RedirectMode) {
        self.source_mode = mode;
    }

    /// Sets the target redirect mode.
    pub fn set_target_redirect_mode(&mut self, mode: RedirectMode) {
        self.target_mode = mode;
    }

    /// Runs the timeline for `delta`. Done timelines ignore this.
    pub fn advance(&mut self, delta: Duration) {
        if self.done {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(delta);
        if self.elapsed >= self.duration {
            self.elapsed = self.duration;
            self.done = true;
        }
    }

    /// Jumps to `elapsed`, clamped to the duration. Done timelines ignore
    /// this; [`reset`](Self::reset) them first.
    pub fn set_elapsed(&mut self, elapsed: Duration) {
        if self.done {
            return;
        }
        self.elapsed = elapsed.min(self.duration);
        if self.elapsed == self.duration {
            self.done = true;
        }
    }

    /// Changes the length, keeping the progress ratio.
    pub fn set_duration(&mut self, duration: Duration) {
        if duration == self.duration {
            return;
        }
        self.elapsed = self.elapsed.rescale(duration, self.duration).min(duration);
        self.duration = duration;
        if self.elapsed == self.duration {
            self.done = true;
        }
    }

    /// Sets the direction, see the type docs for the rules at the ends.
    pub fn set_direction(&mut self, direction: Direction) {
        if direction == self.direction {
            return;
        }
        self.direction = direction;

        let started = !self.elapsed.is_zero() || self.done;
        if started {
            self.elapsed = self.duration - self.elapsed;
            if self.done && self.target_mode == RedirectMode::Relaxed {
                self.done = false;
            }
            if !self.done && self.elapsed == self.duration {
                self.done = true;
            }
        } else if self.source_mode == RedirectMode::Strict {
            self.elapsed = self.duration;
            self.done = true;
        }
    }

    /// Reverses the direction.
    pub fn redirect(&mut self) {
        self.set_direction(self.direction.reversed());
    }

    /// Finishes immediately. A forward timeline lands on its target, a
    /// backward one on its source.
    pub fn complete(&mut self) {
        self.elapsed = self.duration;
        self.done = true;
    }

    /// Rewinds to the start of the current direction.
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.done = self.duration.is_zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn close(a: f64, b: f64) -> bool {
        let d = a - b;
        d < 1e-9 && d > -1e-9
    }

    #[test]
    fn runs_to_the_end() {
        let mut tl = Timeline::new(ms(1000), Easing::Linear);
        assert!(!tl.done());
        assert!(!tl.running(), "not started");

        tl.advance(ms(250));
        assert!(tl.running());
        assert!(close(tl.value(), 0.25));

        tl.advance(ms(2000));
        assert!(tl.done());
        assert_eq!(tl.elapsed(), ms(1000), "elapsed never exceeds duration");
        assert!(close(tl.value(), 1.0));
    }

    #[test]
    fn redirect_is_time_symmetric() {
        let mut tl = Timeline::new(ms(1000), Easing::Linear);
        tl.advance(ms(250));
        let before = tl.value();

        tl.redirect();
        assert_eq!(tl.direction(), Direction::Backward);
        assert_eq!(tl.elapsed(), ms(750));
        assert!(close(tl.value(), before), "displayed value does not jump");

        tl.advance(ms(100));
        assert!(!tl.done());
        assert!(close(tl.value(), 0.15), "heading back toward the source");
        tl.advance(ms(150));
        assert!(tl.done(), "backward run finishes after the remaining 250ms");
        assert!(close(tl.value(), 0.0), "landed on the source");
    }

    #[test]
    fn redirect_twice_restores_state() {
        let mut tl = Timeline::new(ms(1000), Easing::InOutCubic);
        tl.advance(ms(333));
        let (elapsed, direction) = (tl.elapsed(), tl.direction());
        tl.redirect();
        tl.redirect();
        assert_eq!(tl.elapsed(), elapsed);
        assert_eq!(tl.direction(), direction);
    }

    #[test]
    fn complete_finishes_in_either_direction() {
        let mut fwd = Timeline::new(ms(1000), Easing::Linear);
        fwd.advance(ms(100));
        fwd.complete();
        assert!(fwd.done());
        assert_eq!(fwd.elapsed(), fwd.duration());
        assert!(close(fwd.position(), 1.0), "forward lands on target");

        let mut back = Timeline::new(ms(1000), Easing::Linear);
        back.advance(ms(600));
        back.redirect();
        back.complete();
        assert!(back.done());
        assert!(close(back.position(), 0.0), "backward lands on source");
    }

    #[test]
    fn strict_target_keeps_a_done_timeline_done() {
        let mut tl = Timeline::new(ms(100), Easing::Linear);
        tl.advance(ms(100));
        tl.redirect();
        assert!(tl.done(), "strict target");
        assert_eq!(tl.elapsed(), Duration::ZERO);
        assert_eq!(tl.direction(), Direction::Backward);
        assert!(close(tl.value(), 1.0), "still showing the target");
    }

    #[test]
    fn relaxed_target_restarts_toward_the_source() {
        let mut tl = Timeline::new(ms(100), Easing::Linear);
        tl.set_target_redirect_mode(RedirectMode::Relaxed);
        tl.advance(ms(100));
        tl.redirect();
        assert!(!tl.done(), "relaxed target resumes");
        tl.advance(ms(40));
        assert!(close(tl.value(), 0.6));
    }

    #[test]
    fn source_mode_decides_unstarted_reversal() {
        let mut relaxed = Timeline::new(ms(100), Easing::Linear);
        relaxed.redirect();
        assert!(!relaxed.done(), "relaxed source only flips");
        assert_eq!(relaxed.elapsed(), Duration::ZERO);

        let mut strict = Timeline::new(ms(100), Easing::Linear);
        strict.set_source_redirect_mode(RedirectMode::Strict);
        strict.redirect();
        assert!(strict.done(), "strict source finishes at once");
        assert!(close(strict.position(), 0.0), "at the source");
    }

    #[test]
    fn duration_change_keeps_progress() {
        let mut tl = Timeline::new(ms(100), Easing::Linear);
        tl.advance(ms(50));
        tl.set_duration(ms(200));
        assert_eq!(tl.elapsed(), ms(100));
        assert!(close(tl.progress(), 0.5));

        tl.set_duration(Duration::ZERO);
        assert!(tl.done(), "zero duration is complete");
    }

    #[test]
    fn set_elapsed_clamps_and_reset_rewinds() {
        let mut tl = Timeline::new(ms(100), Easing::Linear);
        tl.set_elapsed(ms(40));
        assert_eq!(tl.elapsed(), ms(40));
        tl.set_elapsed(ms(500));
        assert!(tl.done(), "clamped to the end");
        assert_eq!(tl.elapsed(), ms(100));

        tl.reset();
        assert!(!tl.done());
        assert_eq!(tl.elapsed(), Duration::ZERO);
    }

    #[test]
    fn zero_duration_is_done_at_once() {
        let tl = Timeline::new(Duration::ZERO, Easing::OutCubic);
        assert!(tl.done());
        assert!(close(tl.value(), 1.0));
    }
}
