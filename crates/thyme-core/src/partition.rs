//! Contiguous, possibly nested sequences of spans.
//!
//! A [`Partition`] is validated once at construction: it is non-empty and every
//! segment ends exactly where the next one starts. Segments are either leaf
//! [`Span`]s or nested partitions, so an agenda can be modelled as a tree of
//! named blocks. Every operation that looks like a mutation returns a new
//! partition.

use std::fmt;

use serde::Serialize;

use crate::error::{Result, ScheduleError};
use crate::item::ScheduleItems;
use crate::mode::{InsertMode, SqueezeMode};
use crate::scalar::TimePoint;
use crate::shape::{Shape, run_pipeline, squeeze, squeeze_with_rollover};
use crate::span::{Anchor, Span};

/// One element of a partition: a leaf span or a nested partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Segment<T> {
    Span(Span<T>),
    Partition(Partition<T>),
}

impl<T: TimePoint> Segment<T> {
    pub fn start(&self) -> T {
        match self {
            Self::Span(span) => span.start(),
            Self::Partition(partition) => partition.start(),
        }
    }

    pub fn end(&self) -> T {
        match self {
            Self::Span(span) => span.end(),
            Self::Partition(partition) => partition.end(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Span(span) => span.name(),
            Self::Partition(partition) => partition.name(),
        }
    }

    /// The segment's extent as a single span, carrying its name.
    pub fn span(&self) -> Span<T> {
        match self {
            Self::Span(span) => span.clone(),
            Self::Partition(partition) => partition.span(),
        }
    }

    pub fn minutes(&self) -> f64 {
        self.start().minutes_until(self.end())
    }

    /// Applies `f` to every boundary, recursively.
    ///
    /// Shared boundaries map to the same point, so contiguity is preserved.
    fn map_points(&self, f: &impl Fn(T) -> T) -> Self {
        match self {
            Self::Span(span) => Self::Span(
                span.snap_start_to(f(span.start()))
                    .snap_end_to(f(span.end())),
            ),
            Self::Partition(partition) => Self::Partition(partition.map_points(f)),
        }
    }

    fn shift_by(&self, minutes: f64) -> Self {
        self.map_points(&|point: T| point.plus_minutes(minutes))
    }

    fn snap_start_to(&self, start: T) -> Result<Self> {
        match self {
            Self::Span(span) if start > span.end() => {
                Err(ScheduleError::inverted(start, span.end()))
            }
            Self::Span(span) => Ok(Self::Span(span.snap_start_to(start))),
            Self::Partition(partition) => partition.snap_start_to(start).map(Self::Partition),
        }
    }

    fn snap_end_to(&self, end: T) -> Result<Self> {
        match self {
            Self::Span(span) if end < span.start() => {
                Err(ScheduleError::inverted(span.start(), end))
            }
            Self::Span(span) => Ok(Self::Span(span.snap_end_to(end))),
            Self::Partition(partition) => partition.snap_end_to(end).map(Self::Partition),
        }
    }

    fn split(&self, point: T) -> Result<(Self, Self)> {
        match self {
            Self::Span(span) => {
                let (before, after) = span.split(point)?;
                Ok((Self::Span(before), Self::Span(after)))
            }
            Self::Partition(partition) => {
                let (before, after) = partition.split(point)?;
                Ok((Self::Partition(before), Self::Partition(after)))
            }
        }
    }

    fn rescaled(&self, start: T, end: T) -> Result<Self> {
        match self {
            Self::Span(span) => Ok(Self::Span(span.snap_start_to(start).snap_end_to(end))),
            Self::Partition(partition) => partition.rescaled(start, end).map(Self::Partition),
        }
    }
}

impl<T> From<Span<T>> for Segment<T> {
    fn from(span: Span<T>) -> Self {
        Self::Span(span)
    }
}

impl<T> From<Partition<T>> for Segment<T> {
    fn from(partition: Partition<T>) -> Self {
        Self::Partition(partition)
    }
}

/// A validated, contiguous sequence of segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partition<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    segments: Vec<Segment<T>>,
}

/// Attaches a parallel list of names to `spans`.
fn apply_names<T: TimePoint>(
    spans: Vec<Span<T>>,
    names: Option<Vec<String>>,
) -> Result<Vec<Span<T>>> {
    let Some(names) = names else {
        return Ok(spans);
    };
    if names.len() != spans.len() {
        return Err(ScheduleError::NameCountMismatch {
            expected: spans.len(),
            actual: names.len(),
        });
    }
    Ok(spans
        .into_iter()
        .zip(names)
        .map(|(span, name)| span.with_name(name))
        .collect())
}

fn check_non_negative(lengths: &[f64]) -> Result<()> {
    if lengths.iter().any(|length| !length.is_finite() || *length < 0.0) {
        return Err(ScheduleError::InvalidLengths {
            reason: "lengths must be finite and non-negative",
        });
    }
    Ok(())
}

impl<T: TimePoint> Partition<T> {
    /// Validates `segments` and wraps them in a partition.
    pub fn new(segments: Vec<Segment<T>>) -> Result<Self> {
        if segments.is_empty() {
            return Err(ScheduleError::EmptySequence {
                operation: "partition",
            });
        }
        for (index, pair) in segments.windows(2).enumerate() {
            if pair[0].end() != pair[1].start() {
                return Err(ScheduleError::NotContiguous {
                    index,
                    end: pair[0].end().to_string(),
                    start: pair[1].start().to_string(),
                });
            }
        }
        Ok(Self {
            name: None,
            segments,
        })
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds a flat partition from contiguous spans, optionally naming them.
    pub fn from_partition(spans: Vec<Span<T>>, names: Option<Vec<String>>) -> Result<Self> {
        let spans = apply_names(spans, names)?;
        Self::new(spans.into_iter().map(Segment::Span).collect())
    }

    /// Builds a partition from non-decreasing boundary points.
    pub fn from_boundaries(points: &[T], names: Option<Vec<String>>) -> Result<Self> {
        if points.len() < 2 {
            return Err(ScheduleError::EmptySequence {
                operation: "from_boundaries",
            });
        }
        if let Some(pair) = points.windows(2).find(|pair| pair[0] > pair[1]) {
            return Err(ScheduleError::inverted(pair[0], pair[1]));
        }
        let spans = points.windows(2).map(|pair| Span::new(pair[0], pair[1])).collect();
        Self::from_partition(spans, names)
    }

    /// Divides `[start, end]` in proportion to `lengths`.
    ///
    /// The last boundary is exactly `end` regardless of rounding.
    pub fn from_relative_lengths(
        start: T,
        end: T,
        lengths: &[f64],
        names: Option<Vec<String>>,
    ) -> Result<Self> {
        if lengths.is_empty() {
            return Err(ScheduleError::EmptySequence {
                operation: "from_relative_lengths",
            });
        }
        check_non_negative(lengths)?;
        let total: f64 = lengths.iter().sum();
        if total <= 0.0 {
            return Err(ScheduleError::InvalidLengths {
                reason: "lengths must sum to a positive value",
            });
        }
        if start > end {
            return Err(ScheduleError::inverted(start, end));
        }

        let mut points = Vec::with_capacity(lengths.len() + 1);
        points.push(start);
        let mut cumulative = 0.0;
        for length in &lengths[..lengths.len() - 1] {
            cumulative += length;
            points.push(start.interior_point(end, cumulative / total));
        }
        points.push(end);
        Self::from_boundaries(&points, names)
    }

    /// Lays `durations` (minutes) forward from a start anchor or backward from
    /// an end anchor.
    pub fn from_durations(
        durations: &[f64],
        anchor: Anchor<T>,
        names: Option<Vec<String>>,
    ) -> Result<Self> {
        if durations.is_empty() {
            return Err(ScheduleError::EmptySequence {
                operation: "from_durations",
            });
        }
        check_non_negative(durations)?;

        let points: Vec<T> = match anchor {
            Anchor::Start(start) => std::iter::once(start)
                .chain(durations.iter().scan(start, |cursor, minutes| {
                    *cursor = cursor.plus_minutes(*minutes);
                    Some(*cursor)
                }))
                .collect(),
            Anchor::End(end) => {
                let mut points: Vec<T> = std::iter::once(end)
                    .chain(durations.iter().rev().scan(end, |cursor, minutes| {
                        *cursor = cursor.plus_minutes(-minutes);
                        Some(*cursor)
                    }))
                    .collect();
                points.reverse();
                points
            }
        };
        Self::from_boundaries(&points, names)
    }

    /// Runs a shaping pipeline over `spans` and partitions the result.
    pub fn from_pipeline(
        spans: &[Span<T>],
        steps: &[Shape<T>],
        names: Option<Vec<String>>,
    ) -> Result<Self> {
        Self::from_partition(run_pipeline(spans, steps)?, names)
    }

    /// Lays `items` end to end from `start` at their default lengths.
    pub fn from_items(start: T, items: &ScheduleItems) -> Result<Self> {
        Self::from_partition(items.to_spans(start), None)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Top-level segments, in order.
    pub fn segments(&self) -> &[Segment<T>] {
        &self.segments
    }

    /// Leaf spans, depth-first.
    pub fn spans(&self) -> Vec<Span<T>> {
        self.iter_nested().map(|(_, span)| span.clone()).collect()
    }

    /// Names of the top-level segments.
    pub fn names(&self) -> Vec<Option<&str>> {
        self.segments.iter().map(Segment::name).collect()
    }

    pub fn start(&self) -> T {
        self.segments
            .iter()
            .map(Segment::start)
            .fold(self.segments[0].start(), Ord::min)
    }

    pub fn end(&self) -> T {
        self.segments
            .iter()
            .map(Segment::end)
            .fold(self.segments[0].end(), Ord::max)
    }

    /// Starts of the top-level segments.
    pub fn starts(&self) -> Vec<T> {
        self.segments.iter().map(Segment::start).collect()
    }

    /// Ends of the top-level segments.
    pub fn ends(&self) -> Vec<T> {
        self.segments.iter().map(Segment::end).collect()
    }

    /// The covered interval, carrying the partition's name.
    pub fn span(&self) -> Span<T> {
        Span::new(self.start(), self.end()).with_optional_name(self.name.clone())
    }

    pub fn days(&self) -> f64 {
        self.span().days()
    }

    pub fn hours(&self) -> f64 {
        self.span().hours()
    }

    pub fn minutes(&self) -> f64 {
        self.span().minutes()
    }

    pub fn seconds(&self) -> f64 {
        self.span().seconds()
    }

    /// True when the partition covers no time at all.
    pub fn is_empty(&self) -> bool {
        self.span().is_empty()
    }

    pub fn contains(&self, point: T) -> bool {
        self.span().contains(point)
    }

    /// The first leaf span containing `point`, depth-first.
    pub fn span_containing(&self, point: T) -> Option<&Span<T>> {
        self.iter_nested()
            .map(|(_, span)| span)
            .find(|span| span.contains(point))
    }

    /// Position of the first top-level segment named `name`.
    pub fn index_from_name(&self, name: &str) -> Option<usize> {
        self.segments.iter().position(|segment| segment.name() == Some(name))
    }

    /// Position of the top-level segment containing `point`.
    pub fn index_from_time(&self, point: T) -> Option<usize> {
        self.segments
            .iter()
            .position(|segment| segment.start() <= point && point < segment.end())
    }

    /// Every segment with its nesting depth, pre-order. Top-level segments are
    /// at depth zero.
    pub fn outline(&self) -> Vec<(usize, &Segment<T>)> {
        let mut out = Vec::new();
        self.collect_outline(0, &mut out);
        out
    }

    fn collect_outline<'a>(&'a self, depth: usize, out: &mut Vec<(usize, &'a Segment<T>)>) {
        for segment in &self.segments {
            out.push((depth, segment));
            if let Segment::Partition(nested) = segment {
                nested.collect_outline(depth + 1, out);
            }
        }
    }

    /// Leaf spans with their nesting depth, depth-first.
    pub fn iter_nested(&self) -> impl Iterator<Item = (usize, &Span<T>)> {
        self.outline()
            .into_iter()
            .filter_map(|(depth, segment)| match segment {
                Segment::Span(span) => Some((depth, span)),
                Segment::Partition(_) => None,
            })
    }

    /// Levels of nesting; a flat partition has depth one.
    pub fn depth(&self) -> usize {
        1 + self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Span(_) => 0,
                Segment::Partition(nested) => nested.depth(),
            })
            .max()
            .unwrap_or(0)
    }

    /// Rebuilds from segments known to be contiguous, keeping the name.
    fn rebuilt(&self, segments: Vec<Segment<T>>) -> Self {
        Self {
            name: self.name.clone(),
            segments,
        }
    }

    /// Rebuilds from segments that still need validating, keeping the name.
    fn revalidated(&self, segments: Vec<Segment<T>>) -> Result<Self> {
        let mut partition = Self::new(segments)?;
        partition.name.clone_from(&self.name);
        Ok(partition)
    }

    fn map_points(&self, f: &impl Fn(T) -> T) -> Self {
        self.rebuilt(self.segments.iter().map(|segment| segment.map_points(f)).collect())
    }

    #[must_use]
    pub fn round_minutes(&self, step: f64) -> Self {
        self.map_points(&|point: T| point.round_to_minutes(step))
    }

    #[must_use]
    pub fn round_hours(&self, step: f64) -> Self {
        self.round_minutes(step * 60.0)
    }

    /// Sorts the top-level segments by `key` and stacks them forward from the
    /// original start.
    #[must_use]
    pub fn reordered<K: Ord>(&self, key: impl FnMut(&Segment<T>) -> K) -> Self {
        let mut segments = self.segments.clone();
        segments.sort_by_key(key);
        let mut cursor = self.start();
        let stacked = segments
            .iter()
            .map(|segment| {
                let moved = segment.shift_by(segment.start().minutes_until(cursor));
                cursor = moved.end();
                moved
            })
            .collect();
        self.rebuilt(stacked)
    }

    /// Moves the whole partition so it starts at `start`.
    #[must_use]
    pub fn shift_start_rigid(&self, start: T) -> Self {
        let minutes = self.start().minutes_until(start);
        self.map_points(&|point: T| point.plus_minutes(minutes))
    }

    /// Moves the whole partition so it ends at `end`.
    #[must_use]
    pub fn shift_end_rigid(&self, end: T) -> Self {
        let minutes = self.end().minutes_until(end);
        self.map_points(&|point: T| point.plus_minutes(minutes))
    }

    /// Moves the start boundary, resizing only the first segment.
    pub fn snap_start_to(&self, start: T) -> Result<Self> {
        let mut segments = self.segments.clone();
        segments[0] = segments[0].snap_start_to(start)?;
        Ok(self.rebuilt(segments))
    }

    /// Moves the end boundary, resizing only the last segment.
    pub fn snap_end_to(&self, end: T) -> Result<Self> {
        let mut segments = self.segments.clone();
        let last = segments.len() - 1;
        segments[last] = segments[last].snap_end_to(end)?;
        Ok(self.rebuilt(segments))
    }

    /// Cuts the partition in two at a strictly interior `point`.
    ///
    /// A segment straddling the point is itself split, recursively.
    pub fn split(&self, point: T) -> Result<(Self, Self)> {
        if point <= self.start() || point >= self.end() {
            return Err(ScheduleError::out_of_bounds(point, self.start(), self.end()));
        }
        let mut before = Vec::new();
        let mut after = Vec::new();
        for segment in &self.segments {
            if segment.end() <= point {
                before.push(segment.clone());
            } else if segment.start() >= point {
                after.push(segment.clone());
            } else {
                let (left, right) = segment.split(point)?;
                before.push(left);
                after.push(right);
            }
        }
        Ok((self.rebuilt(before), self.rebuilt(after)))
    }

    /// Splits at `point` where that leaves something on both sides.
    fn split_around(&self, point: T) -> Result<(Option<Self>, Option<Self>)> {
        if point <= self.start() {
            Ok((None, Some(self.clone())))
        } else if point >= self.end() {
            Ok((Some(self.clone()), None))
        } else {
            let (before, after) = self.split(point)?;
            Ok((Some(before), Some(after)))
        }
    }

    /// Inserts `span`, making room according to `mode`.
    ///
    /// - [`InsertMode::PushForward`]: everything from the span's start on moves
    ///   later by the span's length.
    /// - [`InsertMode::PushBack`]: everything before the span's end moves
    ///   earlier by the span's length.
    /// - [`InsertMode::Squeeze`]: the partition keeps its bounds and everything
    ///   after the span's start is compressed into what remains.
    pub fn insert(&self, span: Span<T>, mode: InsertMode) -> Result<Self> {
        if span.start() > span.end() {
            return Err(ScheduleError::inverted(span.start(), span.end()));
        }
        let point = match mode {
            InsertMode::PushBack => span.end(),
            InsertMode::PushForward | InsertMode::Squeeze => span.start(),
        };
        if !self.span().contains_with(point, true, true) {
            return Err(ScheduleError::out_of_bounds(point, self.start(), self.end()));
        }
        let (before, after) = self.split_around(point)?;
        let length = span.minutes();

        let (before, after) = match mode {
            InsertMode::PushForward => (before, after.map(|after| after.shift_by(length))),
            InsertMode::PushBack => (before.map(|before| before.shift_by(-length)), after),
            InsertMode::Squeeze => {
                if span.end() > self.end() {
                    return Err(ScheduleError::out_of_bounds(span.end(), self.start(), self.end()));
                }
                let after = after
                    .map(|after| after.rescaled(span.end(), self.end()))
                    .transpose()?;
                (before, after)
            }
        };

        tracing::debug!(%span, %mode, "inserting span");
        let mut segments = before.map(|before| before.segments).unwrap_or_default();
        segments.push(Segment::Span(span));
        segments.extend(after.map(|after| after.segments).unwrap_or_default());
        self.revalidated(segments)
    }

    fn shift_by(&self, minutes: f64) -> Self {
        self.map_points(&|point: T| point.plus_minutes(minutes))
    }

    /// Maps every boundary affinely so the partition covers `[start, end]`.
    pub fn rescaled(&self, start: T, end: T) -> Result<Self> {
        if start > end {
            return Err(ScheduleError::inverted(start, end));
        }
        let (old_start, old_end) = (self.start(), self.end());
        let old_minutes = old_start.minutes_until(old_end);
        if old_minutes.abs() < f64::EPSILON {
            if start == end {
                return Ok(self.shift_start_rigid(start));
            }
            return Err(ScheduleError::InvalidLengths {
                reason: "cannot rescale a partition of zero length",
            });
        }
        let factor = start.minutes_until(end) / old_minutes;
        Ok(self.map_points(&|point: T| {
            if point == old_end {
                end
            } else {
                start.plus_minutes(old_start.minutes_until(point) * factor)
            }
        }))
    }

    /// Squeezes the top-level segments into `[earliest, latest]`.
    ///
    /// Nested partitions are rescaled along with the segment they form.
    pub fn squeeze(
        &self,
        mode: SqueezeMode,
        earliest: Option<T>,
        latest: Option<T>,
        min_minutes: f64,
    ) -> Result<Self> {
        let spans: Vec<Span<T>> = self.segments.iter().map(Segment::span).collect();
        let squeezed = squeeze(&spans, mode, earliest, latest, min_minutes)?;
        let segments = self
            .segments
            .iter()
            .zip(&squeezed)
            .map(|(segment, target)| segment.rescaled(target.start(), target.end()))
            .collect::<Result<Vec<_>>>()?;
        self.revalidated(segments)
    }

    /// Keeps only the part of the partition inside `[earliest, latest]`.
    pub fn truncate(&self, earliest: T, latest: T) -> Result<Self> {
        if earliest > latest {
            return Err(ScheduleError::inverted(earliest, latest));
        }
        let earliest = earliest.max(self.start());
        let latest = latest.min(self.end());
        if earliest >= latest {
            return Err(ScheduleError::EmptySequence {
                operation: "truncate",
            });
        }
        let (_, inside) = self.split_around(earliest)?;
        let inside = inside.unwrap_or_else(|| self.clone());
        let (inside, _) = inside.split_around(latest)?;
        Ok(inside.unwrap_or_else(|| self.clone()))
    }

    /// Applies shaping `steps` to the leaf spans and partitions the result.
    pub fn reshaped(&self, steps: &[Shape<T>]) -> Result<Self> {
        let mut partition = Self::from_pipeline(&self.spans(), steps, None)?;
        partition.name.clone_from(&self.name);
        Ok(partition)
    }

    /// The first leaf named `name`, depth-first.
    pub fn find_leaf(&self, name: &str) -> Option<&Span<T>> {
        self.iter_nested()
            .map(|(_, span)| span)
            .find(|span| span.name() == Some(name))
    }

    /// Replaces the first leaf named `name` with `replacement`.
    fn replace_leaf(&self, name: &str, replacement: Segment<T>) -> Self {
        let mut replacement = Some(replacement);
        self.replace_leaf_inner(name, &mut replacement)
    }

    fn replace_leaf_inner(&self, name: &str, replacement: &mut Option<Segment<T>>) -> Self {
        let segments = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Span(span) if span.name() == Some(name) => {
                    replacement.take().unwrap_or_else(|| segment.clone())
                }
                Segment::Partition(nested) if replacement.is_some() => {
                    Segment::Partition(nested.replace_leaf_inner(name, replacement))
                }
                _ => segment.clone(),
            })
            .collect();
        self.rebuilt(segments)
    }

    /// Turns the leaf named `name` into a nested partition divided by
    /// relative `lengths`.
    pub fn subdivide(
        &self,
        name: &str,
        lengths: &[f64],
        names: Option<Vec<String>>,
    ) -> Result<Self> {
        let leaf = self
            .find_leaf(name)
            .ok_or_else(|| ScheduleError::UnknownName(name.to_string()))?;
        let nested =
            Self::from_relative_lengths(leaf.start(), leaf.end(), lengths, names)?.with_name(name);
        Ok(self.replace_leaf(name, Segment::Partition(nested)))
    }

    /// Fills the leaf named `name` with as many `items` as fit.
    ///
    /// The fitting prefix of `items` is squeezed into the leaf as a nested
    /// partition; the remaining items are returned for scheduling elsewhere.
    /// When not even the first item fits, the leaf is left as it was.
    pub fn fill(
        &self,
        name: &str,
        items: &ScheduleItems,
        mode: SqueezeMode,
        min_minutes: f64,
    ) -> Result<(Self, ScheduleItems)> {
        let leaf = self
            .find_leaf(name)
            .ok_or_else(|| ScheduleError::UnknownName(name.to_string()))?;
        let spans = items.to_spans(leaf.start());
        let (squeezed, _) =
            squeeze_with_rollover(&spans, mode, Some(leaf.start()), Some(leaf.end()), min_minutes)?;
        let leftover = items.tail(squeezed.len());
        tracing::debug!(
            block = name,
            scheduled = squeezed.len(),
            leftover = leftover.len(),
            "filled block"
        );
        if squeezed.is_empty() {
            return Ok((self.clone(), leftover));
        }
        let nested = Self::from_partition(squeezed, None)?.with_name(name);
        Ok((self.replace_leaf(name, Segment::Partition(nested)), leftover))
    }

    fn write_outline(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, segment) in self.outline() {
            let indent = "  ".repeat(depth);
            writeln!(f, "{indent}{}  {}", segment.start(), segment.name().unwrap_or("-"))?;
        }
        write!(f, "{}  <END>", self.end())
    }
}

impl<T: TimePoint> fmt::Display for Partition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_outline(f)
    }
}
