//! Half-open intervals over a [`TimePoint`] axis.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::scalar::TimePoint;

/// Slack, in minutes, when a length is checked against a minimum.
pub(crate) const MINUTES_TOLERANCE: f64 = 1e-9;

/// A half-open interval `[start, end)` with an optional name.
///
/// Equality and hashing only consider the boundaries; the name is metadata.
/// Spans are immutable: every operation returns a new value. Construction does
/// not reject inverted boundaries (see [`Span::try_new`] for a checked variant),
/// and derived lengths are negative for an inverted span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span<T> {
    start: T,
    end: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

/// The fixed boundary used when a span is rescaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor<T> {
    /// Keep the start, move the end.
    Start(T),
    /// Keep the end, move the start.
    End(T),
}

impl<T> Anchor<T> {
    /// Builds an anchor from an optional start and an optional end.
    ///
    /// Exactly one of the two must be present.
    pub fn from_options(start: Option<T>, end: Option<T>) -> Result<Self> {
        match (start, end) {
            (Some(start), None) => Ok(Self::Start(start)),
            (None, Some(end)) => Ok(Self::End(end)),
            _ => Err(ScheduleError::AmbiguousAnchor),
        }
    }
}

impl<T: TimePoint> Span<T> {
    /// Creates an unnamed span without validating the boundaries.
    pub const fn new(start: T, end: T) -> Self {
        Self {
            start,
            end,
            name: None,
        }
    }

    /// Creates a named span without validating the boundaries.
    pub fn named(start: T, end: T, name: impl Into<String>) -> Self {
        Self {
            start,
            end,
            name: Some(name.into()),
        }
    }

    /// Creates a span, rejecting `start > end`.
    pub fn try_new(start: T, end: T) -> Result<Self> {
        if start > end {
            return Err(ScheduleError::inverted(start, end));
        }
        Ok(Self::new(start, end))
    }

    /// Returns a copy carrying `name`.
    #[must_use]
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Returns a copy carrying `name`, or no name at all.
    #[must_use]
    pub fn with_optional_name(self, name: Option<String>) -> Self {
        Self { name, ..self }
    }

    pub const fn start(&self) -> T {
        self.start
    }

    pub const fn end(&self) -> T {
        self.end
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Same name, new boundaries.
    fn rebuilt(&self, start: T, end: T) -> Self {
        Self {
            start,
            end,
            name: self.name.clone(),
        }
    }

    /// True unless `end > start`.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn minutes(&self) -> f64 {
        self.start.minutes_until(self.end)
    }

    pub fn seconds(&self) -> f64 {
        self.minutes() * 60.0
    }

    pub fn hours(&self) -> f64 {
        self.minutes() / 60.0
    }

    pub fn days(&self) -> f64 {
        self.minutes() / 1440.0
    }

    /// Smallest span covering both.
    #[must_use]
    pub fn hull(&self, other: &Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// The shared part of two spans, or `None` if they merely touch or are disjoint.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then(|| Self::new(start, end))
    }

    /// The span strictly between two disjoint spans, in either order.
    pub fn gap(&self, other: &Self) -> Option<Self> {
        if self.end < other.start {
            Some(Self::new(self.end, other.start))
        } else if other.end < self.start {
            Some(Self::new(other.end, self.start))
        } else {
            None
        }
    }

    /// Cuts the span at `point`, which must lie within `[start, end]`.
    pub fn split(&self, point: T) -> Result<(Self, Self)> {
        if point < self.start || point > self.end {
            return Err(ScheduleError::out_of_bounds(point, self.start, self.end));
        }
        Ok((
            self.rebuilt(self.start, point),
            self.rebuilt(point, self.end),
        ))
    }

    #[must_use]
    pub fn snap_start_to(&self, start: T) -> Self {
        self.rebuilt(start, self.end)
    }

    #[must_use]
    pub fn snap_end_to(&self, end: T) -> Self {
        self.rebuilt(self.start, end)
    }

    /// Moves the span so it starts at `start`, keeping its length.
    #[must_use]
    pub fn shift_start_rigid(&self, start: T) -> Self {
        self.shift_by(self.start.minutes_until(start))
    }

    /// Moves the span so it ends at `end`, keeping its length.
    #[must_use]
    pub fn shift_end_rigid(&self, end: T) -> Self {
        self.shift_by(self.end.minutes_until(end))
    }

    /// Translates both boundaries by a signed number of minutes.
    #[must_use]
    pub fn shift_by(&self, minutes: f64) -> Self {
        self.rebuilt(
            self.start.plus_minutes(minutes),
            self.end.plus_minutes(minutes),
        )
    }

    pub fn interior_point(&self, alpha: f64) -> T {
        self.start.interior_point(self.end, alpha)
    }

    pub fn midpoint(&self) -> T {
        self.interior_point(0.5)
    }

    /// Half-open containment: `start <= point < end`.
    pub fn contains(&self, point: T) -> bool {
        self.contains_with(point, true, false)
    }

    /// Containment with explicit treatment of each boundary.
    pub fn contains_with(&self, point: T, include_start: bool, include_end: bool) -> bool {
        let after_start = if include_start {
            point >= self.start
        } else {
            point > self.start
        };
        let before_end = if include_end {
            point <= self.end
        } else {
            point < self.end
        };
        after_start && before_end
    }

    /// True when `other` lies entirely within this span.
    pub fn contains_span(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Rescales the length by `scale_factor` and pins the result to `anchor`.
    pub fn affine_transform(
        &self,
        scale_factor: f64,
        anchor: Anchor<T>,
        min_minutes: f64,
    ) -> Result<Self> {
        self.resized(anchor, scale_factor * self.minutes(), min_minutes)
    }

    /// Gives the span a new length of `minutes`, pinned to `anchor`.
    pub fn resized(&self, anchor: Anchor<T>, minutes: f64, min_minutes: f64) -> Result<Self> {
        if minutes + MINUTES_TOLERANCE < min_minutes {
            return Err(ScheduleError::BelowMinimum {
                minutes,
                min_minutes,
            });
        }
        Ok(match anchor {
            Anchor::Start(start) => self.rebuilt(start, start.plus_minutes(minutes)),
            Anchor::End(end) => self.rebuilt(end.plus_minutes(-minutes), end),
        })
    }

    /// Rounds both boundaries to multiples of `step` minutes.
    #[must_use]
    pub fn round_minutes(&self, step: f64) -> Self {
        self.rebuilt(
            self.start.round_to_minutes(step),
            self.end.round_to_minutes(step),
        )
    }

    #[must_use]
    pub fn round_hours(&self, step: f64) -> Self {
        self.round_minutes(step * 60.0)
    }
}

impl<T: PartialEq> PartialEq for Span<T> {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl<T: Eq> Eq for Span<T> {}

impl<T: Hash> Hash for Span<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.end.hash(state);
    }
}

impl<T: fmt::Display> fmt::Display for Span<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)?;
        if let Some(name) = &self.name {
            write!(f, " {name}")?;
        }
        Ok(())
    }
}
