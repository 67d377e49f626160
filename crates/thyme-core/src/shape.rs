//! Sequence-level shaping: the pairwise reducer and the shapers built on it.
//!
//! # Shapers
//!
//! - **Resolvers** thread a pairwise transform across a sequence
//!   ([`resolve_overlaps`], [`resolve_gaps`]).
//! - **Stacking** moves spans rigidly so they sit end to end
//!   ([`stack_forward`], [`stack_backward`], [`stack_from_middle`]).
//! - **Squeezing** rescales spans to share a new window ([`squeeze`],
//!   [`squeeze_with_rollover`]).
//! - **Eclipsing** clips overlaps in favour of sequence order
//!   ([`eclipse_forward`], [`eclipse_backward`]).
//! - **Truncation** clips a sequence to a window ([`truncate`],
//!   [`truncate_nodiscard`]).
//!
//! Every shaper is a single pass over its input and returns new spans.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::mode::{GapMode, OverlapMode, SqueezeMode, StackMode};
use crate::pairwise::{
    snap_back, snap_between, snap_forward, split_gap_equal, split_gap_inverse_proportional,
    split_gap_proportional, split_overlap_equal, split_overlap_inverse_proportional,
    split_overlap_proportional,
};
use crate::scalar::TimePoint;
use crate::span::{Anchor, MINUTES_TOLERANCE, Span};

/// Default lower bound, in minutes, for squeezed spans.
pub const DEFAULT_MIN_MINUTES: f64 = 5.0;

/// Threads `transform` across `seq`, left to right.
///
/// Each output element is the first half of `transform(carry, next)`; the second
/// half becomes the carry for the following pair. Only adjacent pairs are
/// reconciled, so a conflict reaching across three spans may need another pass.
/// Sequences of length zero or one come back unchanged.
pub fn apply_pairwise<T, F>(transform: F, seq: &[Span<T>]) -> Vec<Span<T>>
where
    T: TimePoint,
    F: Fn(&Span<T>, &Span<T>) -> (Span<T>, Span<T>),
{
    let Some((first, rest)) = seq.split_first() else {
        return Vec::new();
    };

    let mut spans = Vec::with_capacity(seq.len());
    let mut carry = first.clone();
    for next in rest {
        let (resolved, new_carry) = transform(&carry, next);
        spans.push(resolved);
        carry = new_carry;
    }
    spans.push(carry);
    spans
}

pub fn resolve_overlaps<T: TimePoint>(seq: &[Span<T>], mode: OverlapMode) -> Vec<Span<T>> {
    match mode {
        OverlapMode::Equal => apply_pairwise(split_overlap_equal, seq),
        OverlapMode::Proportional => apply_pairwise(split_overlap_proportional, seq),
        OverlapMode::Inverse => apply_pairwise(split_overlap_inverse_proportional, seq),
    }
}

pub fn resolve_gaps<T: TimePoint>(seq: &[Span<T>], mode: GapMode) -> Vec<Span<T>> {
    match mode {
        GapMode::Equal => apply_pairwise(split_gap_equal, seq),
        GapMode::Proportional => apply_pairwise(split_gap_proportional, seq),
        GapMode::Inverse => apply_pairwise(split_gap_inverse_proportional, seq),
        GapMode::SnapForward => apply_pairwise(snap_forward, seq),
        GapMode::SnapBack => apply_pairwise(snap_back, seq),
    }
}

pub fn earliest_start<T: TimePoint>(seq: &[Span<T>]) -> Option<T> {
    seq.iter().map(Span::start).min()
}

pub fn latest_end<T: TimePoint>(seq: &[Span<T>]) -> Option<T> {
    seq.iter().map(Span::end).max()
}

/// Sum of the spans' lengths in minutes.
pub fn total_minutes<T: TimePoint>(seq: &[Span<T>]) -> f64 {
    seq.iter().map(Span::minutes).sum()
}

/// Each span's length as a fraction of the total.
///
/// When the total is zero every span gets an equal share.
pub fn relative_lengths<T: TimePoint>(seq: &[Span<T>]) -> Vec<f64> {
    let total = total_minutes(seq);
    if total.abs() < f64::EPSILON {
        return equal_shares(seq.len());
    }
    seq.iter().map(|span| span.minutes() / total).collect()
}

#[expect(
    clippy::cast_precision_loss,
    reason = "sequence lengths are far below 2^52"
)]
fn equal_shares(n: usize) -> Vec<f64> {
    vec![1.0 / n as f64; n]
}

/// Index of the span whose midpoint is nearest the midpoint of the whole sequence.
///
/// Ties go to the earlier span.
pub fn most_central<T: TimePoint>(seq: &[Span<T>]) -> Option<usize> {
    let start = earliest_start(seq)?;
    let end = latest_end(seq)?;
    let centre = start.interior_point(end, 0.5);
    seq.iter()
        .map(|span| centre.minutes_until(span.midpoint()).abs())
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(index, _)| index)
}

/// True when every span ends exactly where the next one starts.
pub fn is_contiguous<T: TimePoint>(seq: &[Span<T>]) -> bool {
    seq.windows(2).all(|pair| pair[0].end() == pair[1].start())
}

/// Lays spans end to end from `anchor` (default: the earliest start), in order.
pub fn stack_forward<T: TimePoint>(seq: &[Span<T>], anchor: Option<T>) -> Vec<Span<T>> {
    let Some(mut cursor) = anchor.or_else(|| earliest_start(seq)) else {
        return Vec::new();
    };
    seq.iter()
        .map(|span| {
            let shifted = span.shift_start_rigid(cursor);
            cursor = shifted.end();
            shifted
        })
        .collect()
}

/// Lays spans end to end so the last one ends at `anchor` (default: the latest end).
pub fn stack_backward<T: TimePoint>(seq: &[Span<T>], anchor: Option<T>) -> Vec<Span<T>> {
    let Some(mut cursor) = anchor.or_else(|| latest_end(seq)) else {
        return Vec::new();
    };
    let mut spans: Vec<Span<T>> = seq
        .iter()
        .rev()
        .map(|span| {
            let shifted = span.shift_end_rigid(cursor);
            cursor = shifted.start();
            shifted
        })
        .collect();
    spans.reverse();
    spans
}

/// Stacks outward from the most central span.
///
/// Spans before it are stacked backward onto its start and spans after it
/// forward from its end. With an `anchor`, the central span is first moved so
/// its midpoint sits on the anchor.
pub fn stack_from_middle<T: TimePoint>(seq: &[Span<T>], anchor: Option<T>) -> Vec<Span<T>> {
    let Some(index) = most_central(seq) else {
        return Vec::new();
    };
    let mut central = seq[index].clone();
    if let Some(anchor) = anchor {
        central = central.shift_by(central.midpoint().minutes_until(anchor));
    }

    let mut spans = stack_backward(&seq[..index], Some(central.start()));
    let after = stack_forward(&seq[index + 1..], Some(central.end()));
    spans.push(central);
    spans.extend(after);
    spans
}

pub fn stack<T: TimePoint>(seq: &[Span<T>], mode: StackMode, anchor: Option<T>) -> Vec<Span<T>> {
    match mode {
        StackMode::Forward => stack_forward(seq, anchor),
        StackMode::Outward => stack_from_middle(seq, anchor),
        StackMode::Backward => stack_backward(seq, anchor),
    }
}

fn squeeze_shares<T: TimePoint>(seq: &[Span<T>], mode: SqueezeMode) -> Vec<f64> {
    match mode {
        SqueezeMode::Proportional => relative_lengths(seq),
        SqueezeMode::Equal => equal_shares(seq.len()),
    }
}

/// Resolves the squeeze window, defaulting to the sequence's own extent.
fn squeeze_window<T: TimePoint>(
    seq: &[Span<T>],
    earliest: Option<T>,
    latest: Option<T>,
) -> Option<Result<(T, T)>> {
    let earliest = earliest.or_else(|| earliest_start(seq))?;
    let latest = latest.or_else(|| latest_end(seq))?;
    if earliest > latest {
        return Some(Err(ScheduleError::inverted(earliest, latest)));
    }
    Some(Ok((earliest, latest)))
}

/// Rescales `seq` so it exactly fills `[earliest, latest]`, in order.
///
/// Bounds default to the earliest start and latest end of `seq`. Each span
/// receives its share of the window (by length, or uniformly) and is anchored
/// at the previous span's end. Fails rather than clamping if any span would
/// come out shorter than `min_minutes`.
pub fn squeeze<T: TimePoint>(
    seq: &[Span<T>],
    mode: SqueezeMode,
    earliest: Option<T>,
    latest: Option<T>,
    min_minutes: f64,
) -> Result<Vec<Span<T>>> {
    let Some(window) = squeeze_window(seq, earliest, latest) else {
        return Ok(Vec::new());
    };
    let (earliest, latest) = window?;
    let new_total = earliest.minutes_until(latest);

    let mut spans = Vec::with_capacity(seq.len());
    let mut cursor = earliest;
    for (span, share) in seq.iter().zip(squeeze_shares(seq, mode)) {
        let squeezed = span.resized(Anchor::Start(cursor), share * new_total, min_minutes)?;
        cursor = squeezed.end();
        spans.push(squeezed);
    }
    // Absorb rounding so the run ends exactly on the window.
    if let Some(last) = spans.last_mut() {
        *last = last.snap_end_to(latest);
    }
    Ok(spans)
}

/// Squeezes the longest prefix of `seq` that fits `[earliest, latest]` without
/// any span dropping below `min_minutes`, and returns the rest untouched.
///
/// Bounds default to the extent of the whole sequence.
pub fn squeeze_with_rollover<T: TimePoint>(
    seq: &[Span<T>],
    mode: SqueezeMode,
    earliest: Option<T>,
    latest: Option<T>,
    min_minutes: f64,
) -> Result<(Vec<Span<T>>, Vec<Span<T>>)> {
    let Some(window) = squeeze_window(seq, earliest, latest) else {
        return Ok((Vec::new(), Vec::new()));
    };
    let (earliest, latest) = window?;
    let new_total = earliest.minutes_until(latest);

    // The smallest share only shrinks as the prefix grows, so the first prefix
    // that fails bounds the answer.
    let mut keep = 0;
    let mut total = 0.0;
    let mut shortest = f64::INFINITY;
    for (count, span) in (1_u32..).zip(seq) {
        total += span.minutes();
        shortest = shortest.min(span.minutes());
        let smallest_share = match mode {
            SqueezeMode::Proportional if total.abs() >= f64::EPSILON => shortest / total,
            _ => 1.0 / f64::from(count),
        };
        if smallest_share * new_total + MINUTES_TOLERANCE < min_minutes {
            break;
        }
        keep = usize::try_from(count).unwrap_or(usize::MAX);
    }

    tracing::debug!(
        kept = keep,
        rolled_over = seq.len() - keep,
        "squeezed with rollover"
    );
    let squeezed = squeeze(
        &seq[..keep],
        mode,
        Some(earliest),
        Some(latest),
        min_minutes,
    )?;
    Ok((squeezed, seq[keep..].to_vec()))
}

/// Cuts `span` at `point` without a bounds check: `(up to point, from point)`.
fn cut_at<T: TimePoint>(span: &Span<T>, point: T) -> (Span<T>, Span<T>) {
    (span.snap_end_to(point), span.snap_start_to(point))
}

/// Resolves overlaps by letting earlier spans win.
///
/// The first span is kept whole. Every later span loses whatever part of it
/// lies before the frontier of what has been kept so far. Returns the kept
/// spans and the rejected fragments, both in sequence order.
pub fn eclipse_forward<T: TimePoint>(seq: &[Span<T>]) -> (Vec<Span<T>>, Vec<Span<T>>) {
    let Some((first, rest)) = seq.split_first() else {
        return (Vec::new(), Vec::new());
    };

    let mut kept = vec![first.clone()];
    let mut rejected = Vec::new();
    let mut frontier = first.end();
    for span in rest {
        let cut = frontier.max(span.start()).min(span.end());
        let (lost, remainder) = cut_at(span, cut);
        if !remainder.is_empty() {
            frontier = frontier.max(remainder.end());
            kept.push(remainder);
        }
        if !lost.is_empty() {
            tracing::trace!(%lost, "eclipsed");
            rejected.push(lost);
        }
    }
    (kept, rejected)
}

/// Resolves overlaps by letting later spans win.
///
/// Mirror image of [`eclipse_forward`]: the last span is kept whole and earlier
/// spans lose whatever part of them lies after the frontier.
pub fn eclipse_backward<T: TimePoint>(seq: &[Span<T>]) -> (Vec<Span<T>>, Vec<Span<T>>) {
    let Some((last, rest)) = seq.split_last() else {
        return (Vec::new(), Vec::new());
    };

    let mut kept = vec![last.clone()];
    let mut rejected = Vec::new();
    let mut frontier = last.start();
    for span in rest.iter().rev() {
        let cut = frontier.min(span.end()).max(span.start());
        let (remainder, lost) = cut_at(span, cut);
        if !remainder.is_empty() {
            frontier = frontier.min(remainder.start());
            kept.push(remainder);
        }
        if !lost.is_empty() {
            tracing::trace!(%lost, "eclipsed");
            rejected.push(lost);
        }
    }
    kept.reverse();
    rejected.reverse();
    (kept, rejected)
}

/// Spans sorted by a truncation window into `(before, kept, after)`.
pub type Truncated<T> = (Vec<Span<T>>, Vec<Span<T>>, Vec<Span<T>>);

/// Clips `seq` to `[earliest, latest]`.
///
/// Spans entirely before or after the window go to `before` / `after`; spans
/// straddling a bound are split and their pieces distributed. Nothing is lost:
/// the three lists together cover exactly what `seq` covered.
pub fn truncate<T: TimePoint>(seq: &[Span<T>], earliest: T, latest: T) -> Result<Truncated<T>> {
    if earliest > latest {
        return Err(ScheduleError::inverted(earliest, latest));
    }

    let mut before = Vec::new();
    let mut kept = Vec::new();
    let mut after = Vec::new();
    for span in seq {
        if span.start() > span.end() {
            return Err(ScheduleError::inverted(span.start(), span.end()));
        }
        if span.end() <= earliest {
            before.push(span.clone());
            continue;
        }
        if span.start() >= latest {
            after.push(span.clone());
            continue;
        }

        let mut rest = span.clone();
        if rest.start() < earliest {
            let (outside, inside) = rest.split(earliest)?;
            tracing::trace!(%span, at = %earliest, "split at window start");
            before.push(outside);
            rest = inside;
        }
        if rest.end() > latest {
            let (inside, outside) = rest.split(latest)?;
            tracing::trace!(%span, at = %latest, "split at window end");
            kept.push(inside);
            after.push(outside);
        } else {
            kept.push(rest);
        }
    }
    Ok((before, kept, after))
}

/// Clamps every span into `[earliest, latest]`, or returns `None` if that would
/// discard a span entirely rather than merely shorten it.
pub fn truncate_nodiscard<T: TimePoint>(
    seq: &[Span<T>],
    earliest: T,
    latest: T,
) -> Option<Vec<Span<T>>> {
    if seq
        .iter()
        .any(|span| span.end() <= earliest || span.start() >= latest)
    {
        return None;
    }
    Some(
        seq.iter()
            .map(|span| snap_between(span, Some(earliest), Some(latest)))
            .filter(|span| !span.is_empty())
            .collect(),
    )
}

const fn default_min_minutes() -> f64 {
    DEFAULT_MIN_MINUTES
}

/// One step of a shaping pipeline.
///
/// Steps that produce several lists keep only their main output: eclipsing keeps
/// the surviving spans and truncation keeps the part inside the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Shape<T> {
    ResolveOverlaps {
        mode: OverlapMode,
    },
    ResolveGaps {
        mode: GapMode,
    },
    Stack {
        mode: StackMode,
        #[serde(default)]
        anchor: Option<T>,
    },
    Squeeze {
        mode: SqueezeMode,
        #[serde(default)]
        earliest: Option<T>,
        #[serde(default)]
        latest: Option<T>,
        #[serde(default = "default_min_minutes")]
        min_minutes: f64,
    },
    EclipseForward,
    EclipseBackward,
    Truncate {
        earliest: T,
        latest: T,
    },
}

impl<T: TimePoint> Shape<T> {
    /// Applies this step to `seq`.
    pub fn apply(&self, seq: &[Span<T>]) -> Result<Vec<Span<T>>> {
        Ok(match self {
            Self::ResolveOverlaps { mode } => resolve_overlaps(seq, *mode),
            Self::ResolveGaps { mode } => resolve_gaps(seq, *mode),
            Self::Stack { mode, anchor } => stack(seq, *mode, *anchor),
            Self::Squeeze {
                mode,
                earliest,
                latest,
                min_minutes,
            } => squeeze(seq, *mode, *earliest, *latest, *min_minutes)?,
            Self::EclipseForward => eclipse_forward(seq).0,
            Self::EclipseBackward => eclipse_backward(seq).0,
            Self::Truncate { earliest, latest } => truncate(seq, *earliest, *latest)?.1,
        })
    }
}

/// Runs `steps` in order, feeding each step the previous step's output.
pub fn run_pipeline<T: TimePoint>(seq: &[Span<T>], steps: &[Shape<T>]) -> Result<Vec<Span<T>>> {
    let mut spans = seq.to_vec();
    for step in steps {
        spans = step.apply(&spans)?;
        tracing::trace!(?step, len = spans.len(), "pipeline step applied");
    }
    Ok(spans)
}
