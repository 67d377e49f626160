//! Schedule items: named lengths with flexible bounds, to be laid into a partition.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::{Result, ScheduleError};
use crate::scalar::TimePoint;
use crate::span::Span;

/// A named activity with a default length and the range it may stretch over.
///
/// All lengths are in minutes. Bounds are normalised on construction so that
/// `minimum <= default <= maximum` and `minimum <= ideal <= maximum`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleItem {
    name: String,
    default: f64,
    minimum: f64,
    ideal: f64,
    maximum: f64,
}

impl ScheduleItem {
    /// An item whose bounds all equal `default`.
    pub fn new(name: impl Into<String>, default: f64) -> Self {
        Self::with_bounds(name, default, None, None, None)
    }

    /// An item with optional bounds; a missing `ideal` is the default.
    pub fn with_bounds(
        name: impl Into<String>,
        default: f64,
        minimum: Option<f64>,
        ideal: Option<f64>,
        maximum: Option<f64>,
    ) -> Self {
        let ideal = ideal.unwrap_or(default);
        Self {
            name: name.into(),
            default,
            minimum: default.min(minimum.unwrap_or(default)).min(ideal),
            ideal,
            maximum: default.max(maximum.unwrap_or(default)).max(ideal),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn default_minutes(&self) -> f64 {
        self.default
    }

    pub const fn minimum(&self) -> f64 {
        self.minimum
    }

    pub const fn ideal(&self) -> f64 {
        self.ideal
    }

    pub const fn maximum(&self) -> f64 {
        self.maximum
    }

    /// Multiplies every length by `factor`.
    #[must_use]
    pub fn rescaled(&self, factor: f64) -> Self {
        Self::with_bounds(
            self.name.clone(),
            self.default * factor,
            Some(self.minimum * factor),
            Some(self.ideal * factor),
            Some(self.maximum * factor),
        )
    }
}

impl fmt::Display for ScheduleItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} <= {} <= {}, ideal {})",
            self.name, self.minimum, self.default, self.maximum, self.ideal
        )
    }
}

/// An ordered list of schedule items with unique names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScheduleItems(Vec<ScheduleItem>);

impl ScheduleItems {
    pub fn new(items: Vec<ScheduleItem>) -> Result<Self> {
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.name()) {
                return Err(ScheduleError::DuplicateItem(item.name().to_string()));
            }
        }
        Ok(Self(items))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScheduleItem> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn default_minutes(&self) -> f64 {
        self.0.iter().map(ScheduleItem::default_minutes).sum()
    }

    pub fn minimum(&self) -> f64 {
        self.0.iter().map(ScheduleItem::minimum).sum()
    }

    pub fn ideal(&self) -> f64 {
        self.0.iter().map(ScheduleItem::ideal).sum()
    }

    pub fn maximum(&self) -> f64 {
        self.0.iter().map(ScheduleItem::maximum).sum()
    }

    /// Lays the items end to end from `start` at their default lengths.
    pub fn to_spans<T: TimePoint>(&self, start: T) -> Vec<Span<T>> {
        let mut cursor = start;
        self.0
            .iter()
            .map(|item| {
                let end = cursor.plus_minutes(item.default);
                let span = Span::named(cursor, end, item.name.clone());
                cursor = end;
                span
            })
            .collect()
    }

    /// The items from position `index` on.
    #[must_use]
    pub fn tail(&self, index: usize) -> Self {
        Self(self.0.get(index..).unwrap_or_default().to_vec())
    }
}

impl<'a> IntoIterator for &'a ScheduleItems {
    type Item = &'a ScheduleItem;
    type IntoIter = std::slice::Iter<'a, ScheduleItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for ScheduleItems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.0 {
            writeln!(f, "{item}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::is_contiguous;
    use crate::span::tests::{span, t};

    #[test]
    #[expect(clippy::float_cmp, reason = "bounds are copied, not computed")]
    fn test_bounds_are_normalised() {
        let item = ScheduleItem::with_bounds("email", 30.0, Some(45.0), Some(20.0), Some(10.0));
        assert_eq!(item.minimum(), 20.0);
        assert_eq!(item.ideal(), 20.0);
        assert_eq!(item.maximum(), 30.0);
        assert!(item.minimum() <= item.default_minutes());
        assert!(item.default_minutes() <= item.maximum());
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "bounds are copied, not computed")]
    fn test_ideal_defaults_to_default() {
        let item = ScheduleItem::with_bounds("read", 40.0, Some(30.0), None, Some(60.0));
        assert_eq!(item.ideal(), 40.0);
        assert_eq!(item.minimum(), 30.0);
        assert_eq!(item.maximum(), 60.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "halving whole minutes is exact")]
    fn test_rescaled_scales_every_bound() {
        let item = ScheduleItem::with_bounds("gym", 60.0, Some(40.0), Some(50.0), Some(90.0))
            .rescaled(0.5);
        assert_eq!(
            (item.minimum(), item.default_minutes(), item.ideal(), item.maximum()),
            (20.0, 30.0, 25.0, 45.0)
        );
        assert_eq!(item.name(), "gym");
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let err = ScheduleItems::new(vec![
            ScheduleItem::new("email", 15.0),
            ScheduleItem::new("email", 30.0),
        ])
        .unwrap_err();
        assert_eq!(err, ScheduleError::DuplicateItem("email".to_string()));
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "sums of whole minutes are exact")]
    fn test_totals_sum_over_items() {
        let items = ScheduleItems::new(vec![
            ScheduleItem::with_bounds("a", 30.0, Some(20.0), None, Some(40.0)),
            ScheduleItem::new("b", 15.0),
        ])
        .unwrap();
        assert_eq!(items.default_minutes(), 45.0);
        assert_eq!(items.minimum(), 35.0);
        assert_eq!(items.ideal(), 45.0);
        assert_eq!(items.maximum(), 55.0);
    }

    #[test]
    fn test_to_spans_stacks_named_spans() {
        let items = ScheduleItems::new(vec![
            ScheduleItem::new("email", 30.0),
            ScheduleItem::new("standup", 15.0),
        ])
        .unwrap();
        let spans = items.to_spans(t(9, 0));
        assert_eq!(spans, vec![span((9, 0), (9, 30)), span((9, 30), (9, 45))]);
        assert_eq!(spans[1].name(), Some("standup"));
        assert!(is_contiguous(&spans));
    }

    #[test]
    fn test_tail_past_the_end_is_empty() {
        let items = ScheduleItems::new(vec![ScheduleItem::new("a", 5.0)]).unwrap();
        assert_eq!(items.tail(0).len(), 1);
        assert!(items.tail(1).is_empty());
        assert!(items.tail(7).is_empty());
    }
}
