//! Closed policy enumerations accepted by the dispatching shapers.
//!
//! Each mode has a canonical upper-case spelling (`SNAP_FORWARD`), which is what
//! `Display` writes and serde uses. Parsing also accepts lower-case and
//! kebab-case spellings so the same strings work on a command line.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Generates a policy enum with its canonical strings, `Display`, and `FromStr`.
macro_rules! define_mode {
    (
        $(#[$meta:meta])*
        $name:ident, $operation:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Canonical spelling.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ScheduleError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let canonical = s.trim().replace('-', "_").to_ascii_uppercase();
                match canonical.as_str() {
                    $( $text => Ok(Self::$variant), )+
                    _ => Err(ScheduleError::UnknownMode {
                        operation: $operation,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = ScheduleError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(mode: $name) -> Self {
                mode.as_str().to_string()
            }
        }
    };
}

define_mode!(
    /// How the overlap between two adjacent spans is shared out.
    OverlapMode, "resolve_overlaps" {
        /// Cut the overlap at its midpoint.
        Equal => "EQUAL",
        /// The longer span keeps the larger share.
        Proportional => "PROPORTIONAL",
        /// The shorter span keeps the larger share.
        Inverse => "INVERSE",
    }
);

define_mode!(
    /// How the gap between two adjacent spans is closed.
    GapMode, "resolve_gaps" {
        /// Both spans grow to the gap's midpoint.
        Equal => "EQUAL",
        /// The longer span takes the larger share of the gap.
        Proportional => "PROPORTIONAL",
        /// The shorter span takes the larger share of the gap.
        Inverse => "INVERSE",
        /// The earlier span grows forward over the whole gap.
        SnapForward => "SNAP_FORWARD",
        /// The later span grows back over the whole gap.
        SnapBack => "SNAP_BACK",
    }
);

define_mode!(
    /// Direction in which spans are packed against each other.
    StackMode, "stack" {
        Forward => "FORWARD",
        /// Outward from the most central span.
        Outward => "OUTWARD",
        Backward => "BACKWARD",
    }
);

define_mode!(
    /// How a new window is shared among squeezed spans.
    SqueezeMode, "squeeze" {
        Proportional => "PROPORTIONAL",
        Equal => "EQUAL",
    }
);

define_mode!(
    /// Where room is made when a span is inserted into a partition.
    InsertMode, "insert" {
        /// Keep the partition's bounds, compress everything after the insertion point.
        Squeeze => "SQUEEZE",
        /// Move everything before the insertion point earlier.
        PushBack => "PUSH_BACK",
        /// Move everything from the insertion point on later.
        PushForward => "PUSH_FORWARD",
    }
);
