// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time and animation durations.
//!
//! [`HostTime`] is a point in time as platform-native monotonic ticks, the
//! unit frame ticks arrive in. [`Timebase`] carries the rational conversion
//! factor from ticks to nanoseconds (numer/denom, as `mach_timebase_info`
//! reports it).
//!
//! [`Duration`] is a span in **nanoseconds**, independent of the platform
//! tick rate. Animation timelines, frame intervals handed to effects, and
//! configuration defaults are all expressed as [`Duration`]s; the compositor
//! converts tick deltas once per frame via
//! [`HostTime::duration_since`].
//!
//! All conversions use `u128` intermediates to avoid overflow.

use core::fmt;
use core::ops::{Add, AddAssign, Sub};

/// A point in time expressed as platform-native monotonic ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Converts this host time to nanoseconds using the given timebase.
    #[inline]
    #[must_use]
    pub const fn to_nanos(self, timebase: Timebase) -> u64 {
        timebase.ticks_to_nanos(self.0)
    }

    /// Returns the time elapsed since `earlier`, or zero if `earlier` is
    /// after `self`.
    #[inline]
    #[must_use]
    pub const fn duration_since(self, earlier: Self, timebase: Timebase) -> Duration {
        Duration(timebase.ticks_to_nanos(self.0.saturating_sub(earlier.0)))
    }

    /// Returns this time advanced by `duration`, saturating at the end of
    /// the tick range.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, duration: Duration, timebase: Timebase) -> Self {
        Self(
            self.0
                .saturating_add(timebase.nanos_to_ticks(duration.0)),
        )
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// Rational conversion factor from ticks to nanoseconds.
///
/// `nanoseconds = ticks * numer / denom`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    /// Numerator of the ticks-to-nanoseconds ratio.
    pub numer: u32,
    /// Denominator of the ticks-to-nanoseconds ratio.
    pub denom: u32,
}

impl Timebase {
    /// A timebase where ticks are already nanoseconds (1:1).
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// Creates a new timebase with the given numerator and denominator.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    #[inline]
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(denom != 0, "timebase denominator must not be zero");
        Self { numer, denom }
    }

    /// Converts a tick count to nanoseconds.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        let wide = ticks as u128 * self.numer as u128 / self.denom as u128;
        wide as u64
    }

    /// Converts nanoseconds to a tick count.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn nanos_to_ticks(self, nanos: u64) -> u64 {
        if self.numer == 0 {
            return 0;
        }
        let wide = nanos as u128 * self.denom as u128 / self.numer as u128;
        wide as u64
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({}/{})", self.numer, self.denom)
    }
}

/// A span of time in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// The longest representable duration.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates a duration from nanoseconds.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Creates a duration from microseconds, saturating on overflow.
    #[inline]
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros.saturating_mul(1_000))
    }

    /// Creates a duration from milliseconds, saturating on overflow.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    /// Returns the length in nanoseconds.
    #[inline]
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Returns the length in whole milliseconds (truncating).
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0 / 1_000_000
    }

    /// Returns the length in fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Returns whether this duration is zero.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Scales this duration by a non-negative factor.
    ///
    /// Negative and NaN factors yield zero; results past the representable
    /// range saturate at [`Duration::MAX`].
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the product is range-checked before the cast back to u64"
    )]
    pub fn mul_f64(self, factor: f64) -> Self {
        // `!(x > 0)` also catches NaN.
        if !(factor > 0.0) {
            return Self::ZERO;
        }
        let scaled = self.0 as f64 * factor;
        if scaled >= u64::MAX as f64 {
            Self::MAX
        } else {
            Self(scaled as u64)
        }
    }

    /// Rescales this duration by `numer / denom`, rounding to the nearest
    /// nanosecond. Returns zero when `denom` is zero.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; the quotient is clamped to u64"
    )]
    pub const fn rescale(self, numer: Self, denom: Self) -> Self {
        if denom.0 == 0 {
            return Self::ZERO;
        }
        let wide = (self.0 as u128 * numer.0 as u128 + denom.0 as u128 / 2) / denom.0 as u128;
        if wide > u64::MAX as u128 {
            Self::MAX
        } else {
            Self(wide as u64)
        }
    }

    /// Returns `self / total` as a fraction in `[0, 1]`.
    ///
    /// A zero `total` counts as already complete.
    #[must_use]
    pub fn fraction_of(self, total: Self) -> f64 {
        if total.0 == 0 {
            return 1.0;
        }
        (self.0 as f64 / total.0 as f64).clamp(0.0, 1.0)
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Duration {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 1_000_000 == 0 {
            write!(f, "Duration({}ms)", self.0 / 1_000_000)
        } else {
            write!(f, "Duration({}ns)", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_deltas_convert_through_timebase() {
        // Typical ARM Mac: 125/3 (ticks run at 24 MHz)
        let tb = Timebase::new(125, 3);
        let start = HostTime(24_000_000);
        let end = HostTime(48_000_000);
        assert_eq!(
            end.duration_since(start, tb),
            Duration::from_millis(1000),
            "24M ticks at 24 MHz is one second"
        );
        assert_eq!(
            start.duration_since(end, tb),
            Duration::ZERO,
            "earlier minus later saturates"
        );
    }

    #[test]
    fn host_time_advances_by_duration() {
        let tb = Timebase::new(125, 3);
        let t = HostTime(0).saturating_add(Duration::from_millis(1000), tb);
        assert_eq!(t.ticks(), 24_000_000, "one second of 24 MHz ticks");
        assert_eq!(
            HostTime(u64::MAX - 1).saturating_add(Duration::from_millis(1), Timebase::NANOS),
            HostTime(u64::MAX),
            "saturates at the end of the tick range"
        );
    }

    #[test]
    fn overflow_safe_conversion() {
        let tb = Timebase::new(125, 3);
        let t = HostTime(u64::MAX / 2);
        // Should not panic; result is approximate but deterministic
        let _nanos = t.to_nanos(tb);
    }

    #[test]
    fn millisecond_constructors() {
        assert_eq!(Duration::from_millis(16).as_nanos(), 16_000_000);
        assert_eq!(Duration::from_micros(1500).as_millis(), 1);
        assert_eq!(Duration::from_millis(u64::MAX), Duration::MAX, "saturates");
    }

    #[test]
    fn scaling_by_factor() {
        let d = Duration::from_millis(100);
        assert_eq!(d.mul_f64(2.0), Duration::from_millis(200));
        assert_eq!(d.mul_f64(0.5), Duration::from_millis(50));
        assert_eq!(d.mul_f64(-1.0), Duration::ZERO, "negative factor");
        assert_eq!(d.mul_f64(f64::NAN), Duration::ZERO, "NaN factor");
        assert_eq!(d.mul_f64(f64::INFINITY), Duration::MAX, "infinite factor");
    }

    #[test]
    fn rescale_rounds_to_nearest() {
        let elapsed = Duration::from_millis(999);
        let scaled = elapsed.rescale(Duration::from_millis(3), Duration::from_millis(1000));
        assert_eq!(scaled, Duration(2_997_000), "exact nanosecond result");
        assert_eq!(
            Duration(999).rescale(Duration(3), Duration(1000)),
            Duration(3),
            "2.997 rounds up to 3"
        );
        assert_eq!(
            Duration(5).rescale(Duration(1), Duration::ZERO),
            Duration::ZERO,
            "zero denominator"
        );
    }

    #[test]
    fn fraction_of_total() {
        let total = Duration::from_millis(1000);
        assert_eq!(Duration::from_millis(250).fraction_of(total), 0.25);
        assert_eq!(Duration::from_millis(2000).fraction_of(total), 1.0, "clamped");
        assert_eq!(Duration::ZERO.fraction_of(Duration::ZERO), 1.0, "zero total");
    }

    #[test]
    fn duration_arithmetic() {
        let a = Duration(100);
        let b = Duration(30);
        assert_eq!((a + b).as_nanos(), 130);
        assert_eq!((a - b).as_nanos(), 70);
        assert_eq!(a.saturating_sub(Duration(200)), Duration::ZERO);
        let mut c = a;
        c += b;
        assert_eq!(c, Duration(130), "add-assign");
    }
}
