//! Error type shared by every fallible engine operation.

use thiserror::Error;

/// Errors raised by span arithmetic, sequence shapers and partition construction.
///
/// Time points are carried in their rendered form so the error stays independent
/// of the point type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleError {
    /// A policy mode string did not name a known mode.
    #[error("invalid mode for '{operation}': '{value}'")]
    UnknownMode {
        operation: &'static str,
        value: String,
    },

    /// Adjacent segments of a partition do not share a boundary.
    #[error("segments {index} and {next} are not contiguous: {end} != {start}", next = .index + 1)]
    NotContiguous {
        index: usize,
        end: String,
        start: String,
    },

    /// An operation that needs at least one element received none.
    #[error("{operation} requires at least one element")]
    EmptySequence { operation: &'static str },

    /// A parallel name sequence does not match the number of spans.
    #[error("expected {expected} names, got {actual}")]
    NameCountMismatch { expected: usize, actual: usize },

    /// Both or neither of a start and end anchor were supplied.
    #[error("exactly one of a start or end anchor must be supplied")]
    AmbiguousAnchor,

    /// A reshaped span would be shorter than the allowed minimum.
    #[error("resulting span of {minutes:.2} minutes is below the minimum of {min_minutes} minutes")]
    BelowMinimum { minutes: f64, min_minutes: f64 },

    /// A point lies outside the span or partition it was applied to.
    #[error("{point} is outside [{start}, {end}]")]
    OutOfBounds {
        point: String,
        start: String,
        end: String,
    },

    /// A start lies after its end.
    #[error("start {start} is after end {end}")]
    InvertedSpan { start: String, end: String },

    /// Relative lengths were negative or summed to zero.
    #[error("invalid relative lengths: {reason}")]
    InvalidLengths { reason: &'static str },

    /// No segment carries the requested name.
    #[error("no segment named '{0}'")]
    UnknownName(String),

    /// Two schedule items share a name.
    #[error("duplicate item name: '{0}'")]
    DuplicateItem(String),
}

impl ScheduleError {
    pub(crate) fn inverted(start: impl ToString, end: impl ToString) -> Self {
        Self::InvertedSpan {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    pub(crate) fn out_of_bounds(
        point: impl ToString,
        start: impl ToString,
        end: impl ToString,
    ) -> Self {
        Self::OutOfBounds {
            point: point.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

/// Convenience alias for results carrying a [`ScheduleError`].
pub type Result<T, E = ScheduleError> = std::result::Result<T, E>;
