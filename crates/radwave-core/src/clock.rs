//! Time window and phase derivation for the animation cycle.
//!
//! The simulation clock itself is owned by the engine (read through
//! [`SpaceTimeClock`]); this module owns the immutable window the clock
//! cycles through and the pure mapping from clock value to oscillation
//! phase. One degree of phase corresponds to one simulated day, so the
//! full 360-degree oscillation spans 360 days.
//!
//! # Design Principles
//!
//! - The phase is derived from the clock every frame -- never stored as
//!   authoritative state. The clock value is the source of truth.
//! - Negative elapsed time (clock behind the window start) is normalized
//!   with Euclidean division, so the phase is always in `[0, 360)`
//!   regardless of the sign of the delta.
//!
//! [`SpaceTimeClock`]: crate::engine::SpaceTimeClock

use chrono::{DateTime, TimeDelta, Utc};

/// Milliseconds in one simulated day.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Number of phase buckets in one full oscillation (one per day).
pub const PHASE_DEGREES: i64 = 360;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The window bounds are not strictly ordered.
    #[error("invalid time window: start {start} must be before end {end}")]
    InvalidWindow {
        /// The offending start timestamp.
        start: DateTime<Utc>,
        /// The offending end timestamp.
        end: DateTime<Utc>,
    },
}

/// The immutable repeat interval of the animation.
///
/// The engine's simulation clock is kept inside `[start, end)`: whenever
/// a frame observes the clock at or past `end`, the driver snaps it back
/// to `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Inclusive lower bound of the cycle.
    start: DateTime<Utc>,
    /// Exclusive upper bound of the cycle.
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window from its bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidWindow`] unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ClockError> {
        if start >= end {
            return Err(ClockError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Inclusive lower bound of the cycle.
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive upper bound of the cycle.
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Length of one full cycle.
    pub fn duration(&self) -> TimeDelta {
        self.end.signed_duration_since(self.start)
    }

    /// Whether `now` lies inside the window (`start <= now < end`).
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        now >= self.start && now < self.end
    }

    /// Whether the clock has reached or passed the window end.
    ///
    /// A frame observing an expired clock resets it to [`start`].
    ///
    /// [`start`]: Self::start
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.end
    }

    /// Phase of the oscillation at `now`, relative to this window's start.
    ///
    /// See [`phase_at`].
    pub fn phase_at(&self, now: DateTime<Utc>) -> u32 {
        phase_at(self.start, now)
    }
}

/// Compute the oscillation phase in `[0, 360)` at `now`.
///
/// The phase is the number of whole simulated days elapsed since `start`,
/// modulo 360. The day count uses floor division of the millisecond delta,
/// and the modulo is Euclidean, so a clock *behind* `start` still yields
/// an in-range value (one millisecond before `start` reads as phase 359)
/// rather than a sign-dependent negative.
pub fn phase_at(start: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let elapsed_ms = now.signed_duration_since(start).num_milliseconds();
    let days = elapsed_ms.div_euclid(MILLIS_PER_DAY);
    let wrapped = days.rem_euclid(PHASE_DEGREES);
    // Safe: rem_euclid(360) always lands in 0..360.
    u32::try_from(wrapped).unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn window_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 10, 17, 11, 55, 55).unwrap()
    }

    fn window_end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 6, 11, 55, 55).unwrap()
    }

    fn make_window() -> TimeWindow {
        TimeWindow::new(window_start(), window_end()).unwrap()
    }

    #[test]
    fn window_requires_ordered_bounds() {
        assert!(TimeWindow::new(window_start(), window_end()).is_ok());
        assert!(TimeWindow::new(window_end(), window_start()).is_err());
        assert!(TimeWindow::new(window_start(), window_start()).is_err());
    }

    #[test]
    fn phase_at_start_is_zero() {
        assert_eq!(phase_at(window_start(), window_start()), 0);
    }

    #[test]
    fn phase_advances_one_per_day() {
        let start = window_start();
        assert_eq!(phase_at(start, start + TimeDelta::days(1)), 1);
        assert_eq!(phase_at(start, start + TimeDelta::days(42)), 42);
        assert_eq!(phase_at(start, start + TimeDelta::days(359)), 359);
    }

    #[test]
    fn phase_wraps_after_full_oscillation() {
        let start = window_start();
        assert_eq!(phase_at(start, start + TimeDelta::days(360)), 0);
        assert_eq!(phase_at(start, start + TimeDelta::days(361)), 1);
        assert_eq!(phase_at(start, start + TimeDelta::days(720)), 0);
    }

    #[test]
    fn partial_days_do_not_advance_phase() {
        let start = window_start();
        assert_eq!(phase_at(start, start + TimeDelta::hours(23)), 0);
        assert_eq!(
            phase_at(start, start + TimeDelta::days(5) + TimeDelta::hours(23)),
            5
        );
    }

    #[test]
    fn phase_is_monotone_and_in_range_over_window() {
        let window = make_window();
        let mut previous = window.phase_at(window.start());
        let mut now = window.start();
        while window.contains(now) {
            let phase = window.phase_at(now);
            assert!(phase < 360);
            // Non-decreasing except at the 359 -> 0 wrap.
            assert!(phase >= previous || previous == 359);
            previous = phase;
            now += TimeDelta::days(1);
        }
    }

    #[test]
    fn clock_behind_start_wraps_instead_of_going_negative() {
        let start = window_start();
        assert_eq!(phase_at(start, start - TimeDelta::milliseconds(1)), 359);
        assert_eq!(phase_at(start, start - TimeDelta::days(1)), 359);
        assert_eq!(phase_at(start, start - TimeDelta::days(360)), 0);
        assert_eq!(phase_at(start, start - TimeDelta::days(361)), 359);
    }

    #[test]
    fn window_expiry() {
        let window = make_window();
        assert!(!window.is_expired(window.start()));
        assert!(!window.is_expired(window.end() - TimeDelta::milliseconds(1)));
        assert!(window.is_expired(window.end()));
        assert!(window.is_expired(window.end() + TimeDelta::days(10)));
    }

    #[test]
    fn window_duration_matches_bounds() {
        let window = make_window();
        assert_eq!(
            window.duration(),
            window_end().signed_duration_since(window_start())
        );
    }
}
