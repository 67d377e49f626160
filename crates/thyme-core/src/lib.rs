//! Time-interval algebra and partition engine.
//!
//! This crate contains the fundamental types and logic for:
//! - Spans: half-open intervals over any [`TimePoint`] axis
//! - Pairwise transforms: reconciling overlaps and gaps between neighbours
//! - Shapers: stacking, squeezing, eclipsing and truncating span sequences
//! - Partitions: validated, contiguous and possibly nested agendas

pub mod error;
pub mod item;
pub mod mode;
pub mod pairwise;
pub mod partition;
pub mod scalar;
pub mod shape;
pub mod span;

pub use error::{Result, ScheduleError};
pub use item::{ScheduleItem, ScheduleItems};
pub use mode::{GapMode, InsertMode, OverlapMode, SqueezeMode, StackMode};
pub use pairwise::PairTransform;
pub use partition::{Partition, Segment};
pub use scalar::TimePoint;
pub use shape::{
    DEFAULT_MIN_MINUTES, Shape, Truncated, apply_pairwise, eclipse_backward, eclipse_forward,
    resolve_gaps, resolve_overlaps, run_pipeline, squeeze, squeeze_with_rollover, stack,
    truncate, truncate_nodiscard,
};
pub use span::{Anchor, Span};
