//! The ordered time-point contract consumed by the engine.
//!
//! The engine never does calendar arithmetic itself. Anything it needs from a
//! point type goes through [`TimePoint`]: ordering, the signed distance between
//! two points, translation by a distance, and interpolation. Implementations are
//! provided for the `chrono` types used to build agendas.

use std::fmt;
use std::hash::Hash;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const MINUTES_PER_DAY: f64 = 1440.0;
const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// A totally ordered point on a time axis.
///
/// Distances are signed and expressed in minutes.
pub trait TimePoint: Copy + Ord + Hash + fmt::Debug + fmt::Display {
    /// Signed number of minutes from `self` to `later` (`later - self`).
    fn minutes_until(self, later: Self) -> f64;

    /// Translates the point by a signed number of minutes.
    fn plus_minutes(self, minutes: f64) -> Self;

    /// Rounds to the nearest multiple of `step` minutes counted from the
    /// type's natural origin. A non-positive `step` leaves the point unchanged.
    fn round_to_minutes(self, step: f64) -> Self;

    /// Linear interpolation: `alpha = 0` is `self`, `alpha = 1` is `other`.
    fn interior_point(self, other: Self, alpha: f64) -> Self {
        self.plus_minutes(self.minutes_until(other) * alpha)
    }
}

/// Rounds `point` to a multiple of `step` minutes measured from `origin`.
fn round_from<T: TimePoint>(origin: T, point: T, step: f64) -> T {
    if step <= 0.0 || !step.is_finite() {
        return point;
    }
    let offset = origin.minutes_until(point);
    origin.plus_minutes((offset / step).round() * step)
}

/// `None` when the offset is beyond what a [`Duration`] can hold.
#[expect(
    clippy::cast_possible_truncation,
    reason = "the float-to-int cast saturates and out-of-range values are rejected below"
)]
fn duration_from_minutes(minutes: f64) -> Option<Duration> {
    Duration::try_milliseconds((minutes * MILLIS_PER_MINUTE).round() as i64)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "millisecond counts within a calendar range are exact in f64"
)]
fn minutes_in(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / MILLIS_PER_MINUTE
}

/// Last millisecond of a day, the finest step the engine's arithmetic takes.
fn day_end() -> NaiveTime {
    NaiveTime::MIN - Duration::milliseconds(1)
}

/// Clock times live on a single day: translation saturates at midnight and at
/// the last millisecond of the day rather than wrapping around. A span pushed
/// past either bound is therefore shortened.
impl TimePoint for NaiveTime {
    fn minutes_until(self, later: Self) -> f64 {
        minutes_in(later - self)
    }

    fn plus_minutes(self, minutes: f64) -> Self {
        let saturated = if minutes < 0.0 { Self::MIN } else { day_end() };
        let Some(delta) = duration_from_minutes(minutes) else {
            return saturated;
        };
        match self.overflowing_add_signed(delta) {
            (shifted, 0) => shifted,
            _ => saturated,
        }
    }

    fn round_to_minutes(self, step: f64) -> Self {
        round_from(Self::MIN, self, step)
    }
}

impl TimePoint for NaiveDateTime {
    fn minutes_until(self, later: Self) -> f64 {
        minutes_in(later - self)
    }

    fn plus_minutes(self, minutes: f64) -> Self {
        duration_from_minutes(minutes)
            .and_then(|delta| self.checked_add_signed(delta))
            .unwrap_or(if minutes < 0.0 { Self::MIN } else { Self::MAX })
    }

    fn round_to_minutes(self, step: f64) -> Self {
        round_from(self.date().and_time(NaiveTime::MIN), self, step)
    }
}

impl TimePoint for DateTime<Utc> {
    fn minutes_until(self, later: Self) -> f64 {
        minutes_in(later - self)
    }

    fn plus_minutes(self, minutes: f64) -> Self {
        self.naive_utc().plus_minutes(minutes).and_utc()
    }

    fn round_to_minutes(self, step: f64) -> Self {
        self.naive_utc().round_to_minutes(step).and_utc()
    }
}

/// Dates count one day as 1440 minutes; translation rounds to whole days.
impl TimePoint for NaiveDate {
    #[expect(
        clippy::cast_precision_loss,
        reason = "day counts within the chrono date range are exact in f64"
    )]
    fn minutes_until(self, later: Self) -> f64 {
        (later - self).num_days() as f64 * MINUTES_PER_DAY
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "day offsets within the chrono date range fit in i64"
    )]
    fn plus_minutes(self, minutes: f64) -> Self {
        let days = (minutes / MINUTES_PER_DAY).round() as i64;
        Duration::try_days(days)
            .and_then(|delta| self.checked_add_signed(delta))
            .unwrap_or(if days < 0 { Self::MIN } else { Self::MAX })
    }

    fn round_to_minutes(self, _step: f64) -> Self {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "whole-minute differences are exact")]
    fn test_naive_time_minutes_are_signed() {
        assert_eq!(t(9, 0).minutes_until(t(10, 30)), 90.0);
        assert_eq!(t(10, 30).minutes_until(t(9, 0)), -90.0);
    }

    #[test]
    fn test_naive_time_translation_saturates_at_day_bounds() {
        assert_eq!(t(23, 0).plus_minutes(120.0), day_end());
        assert_eq!(t(0, 30).plus_minutes(-60.0), NaiveTime::MIN);
        assert_eq!(t(9, 0).plus_minutes(15.0), t(9, 15));
    }

    #[test]
    fn test_day_end_is_millisecond_exact() {
        let end = day_end();
        assert_eq!(end, NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap());
        assert_eq!(end.plus_minutes(0.0), end);
        assert_eq!(t(23, 59).plus_minutes(t(23, 59).minutes_until(end)), end);
    }

    #[test]
    fn test_huge_offsets_saturate_instead_of_panicking() {
        assert_eq!(t(10, 0).plus_minutes(-1e15), NaiveTime::MIN);
        assert_eq!(t(10, 0).plus_minutes(1e15), day_end());
        assert_eq!(t(10, 0).plus_minutes(f64::MAX), day_end());

        let dt = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_time(t(10, 0));
        assert_eq!(dt.plus_minutes(-1e18), NaiveDateTime::MIN);
        assert_eq!(dt.plus_minutes(1e18), NaiveDateTime::MAX);

        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(d.plus_minutes(-1e18), NaiveDate::MIN);
        assert_eq!(d.plus_minutes(1e18), NaiveDate::MAX);
    }

    #[test]
    fn test_interior_point_interpolates() {
        assert_eq!(t(10, 30).interior_point(t(11, 0), 0.5), t(10, 45));
        assert_eq!(t(10, 0).interior_point(t(11, 0), 0.0), t(10, 0));
        assert_eq!(t(10, 0).interior_point(t(11, 0), 1.0), t(11, 0));
    }

    #[test]
    fn test_rounding_uses_midnight_origin() {
        assert_eq!(t(9, 40).round_to_minutes(60.0), t(10, 0));
        assert_eq!(t(9, 20).round_to_minutes(30.0), t(9, 30));
        assert_eq!(t(9, 20).round_to_minutes(0.0), t(9, 20));
    }

    #[test]
    fn test_datetime_rounds_within_its_own_day() {
        let dt = NaiveDate::from_ymd_opt(2025, 10, 10)
            .unwrap()
            .and_time(t(13, 50));
        let rounded = dt.round_to_minutes(60.0);
        assert_eq!(rounded.time(), t(14, 0));
        assert_eq!(rounded.date(), dt.date());
    }

    #[test]
    fn test_utc_datetime_crosses_midnight() {
        let dt = NaiveDate::from_ymd_opt(2025, 10, 10)
            .unwrap()
            .and_time(t(23, 30))
            .and_utc();
        let later = dt.plus_minutes(60.0);
        assert_eq!(later.date_naive(), NaiveDate::from_ymd_opt(2025, 10, 11).unwrap());
        assert!((dt.minutes_until(later) - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dates_move_in_whole_days() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(
            d.plus_minutes(2.0 * MINUTES_PER_DAY),
            NaiveDate::from_ymd_opt(2025, 1, 3).unwrap()
        );
        let mid = d.interior_point(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(), 0.5);
        assert_eq!(mid, NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
    }
}
