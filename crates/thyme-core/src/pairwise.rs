//! Pairwise transforms: one policy each for reconciling two adjacent spans.
//!
//! Every function takes `(first, second)` with `first` preceding `second` and
//! returns the reconciled pair. They never fail, and they hand back the inputs
//! unchanged when the pair already satisfies the target relationship (no overlap
//! for the overlap splitters, no gap for the gap closers).

use crate::scalar::TimePoint;
use crate::span::Span;

/// A pairwise transform as a plain function pointer.
pub type PairTransform<T> = fn(&Span<T>, &Span<T>) -> (Span<T>, Span<T>);

/// Share of a contested region that goes to `first`, by relative length.
///
/// Falls back to an even split when both spans are empty.
fn share_of_first<T: TimePoint>(first: &Span<T>, second: &Span<T>, inverse: bool) -> f64 {
    let (a, b) = (first.minutes(), second.minutes());
    let total = a + b;
    if total.abs() < f64::EPSILON {
        return 0.5;
    }
    if inverse { b / total } else { a / total }
}

/// Moves the shared boundary of the pair to `border`.
fn meet_at<T: TimePoint>(first: &Span<T>, second: &Span<T>, border: T) -> (Span<T>, Span<T>) {
    (first.snap_end_to(border), second.snap_start_to(border))
}

fn split_overlap<T: TimePoint>(
    first: &Span<T>,
    second: &Span<T>,
    alpha: f64,
) -> (Span<T>, Span<T>) {
    if first.end() <= second.start() {
        return (first.clone(), second.clone());
    }
    let overlap = Span::new(second.start(), first.end());
    meet_at(first, second, overlap.interior_point(alpha))
}

fn split_gap<T: TimePoint>(first: &Span<T>, second: &Span<T>, alpha: f64) -> (Span<T>, Span<T>) {
    if first.end() >= second.start() {
        return (first.clone(), second.clone());
    }
    let gap = Span::new(first.end(), second.start());
    meet_at(first, second, gap.interior_point(alpha))
}

/// Cuts an overlap at its midpoint.
pub fn split_overlap_equal<T: TimePoint>(first: &Span<T>, second: &Span<T>) -> (Span<T>, Span<T>) {
    split_overlap(first, second, 0.5)
}

/// Cuts an overlap so the longer span keeps the larger share of it.
pub fn split_overlap_proportional<T: TimePoint>(
    first: &Span<T>,
    second: &Span<T>,
) -> (Span<T>, Span<T>) {
    split_overlap(first, second, share_of_first(first, second, false))
}

/// Cuts an overlap so the shorter span keeps the larger share of it.
pub fn split_overlap_inverse_proportional<T: TimePoint>(
    first: &Span<T>,
    second: &Span<T>,
) -> (Span<T>, Span<T>) {
    split_overlap(first, second, share_of_first(first, second, true))
}

/// Closes a gap by growing both spans to its midpoint.
pub fn split_gap_equal<T: TimePoint>(first: &Span<T>, second: &Span<T>) -> (Span<T>, Span<T>) {
    split_gap(first, second, 0.5)
}

/// Closes a gap so the longer span takes the larger share of it.
pub fn split_gap_proportional<T: TimePoint>(
    first: &Span<T>,
    second: &Span<T>,
) -> (Span<T>, Span<T>) {
    split_gap(first, second, share_of_first(first, second, false))
}

/// Closes a gap so the shorter span takes the larger share of it.
pub fn split_gap_inverse_proportional<T: TimePoint>(
    first: &Span<T>,
    second: &Span<T>,
) -> (Span<T>, Span<T>) {
    split_gap(first, second, share_of_first(first, second, true))
}

/// Closes a gap by extending `first` up to `second`.
pub fn snap_forward<T: TimePoint>(first: &Span<T>, second: &Span<T>) -> (Span<T>, Span<T>) {
    if first.end() >= second.start() {
        return (first.clone(), second.clone());
    }
    (first.snap_end_to(second.start()), second.clone())
}

/// Closes a gap by pulling `second` back to `first`.
pub fn snap_back<T: TimePoint>(first: &Span<T>, second: &Span<T>) -> (Span<T>, Span<T>) {
    if first.end() >= second.start() {
        return (first.clone(), second.clone());
    }
    (first.clone(), second.snap_start_to(first.end()))
}

/// Clamps a span into whichever of `earliest` / `latest` are given.
///
/// A span lying entirely outside the bounds comes back degenerate.
pub fn snap_between<T: TimePoint>(
    span: &Span<T>,
    earliest: Option<T>,
    latest: Option<T>,
) -> Span<T> {
    let mut clamped = span.clone();
    if let Some(earliest) = earliest {
        if clamped.start() < earliest {
            clamped = clamped.snap_start_to(earliest);
        }
    }
    if let Some(latest) = latest {
        if clamped.end() > latest {
            clamped = clamped.snap_end_to(latest);
        }
    }
    clamped
}
