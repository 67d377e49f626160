//! Shared utilities for CLI commands.

use std::fmt::Write;
use std::sync::LazyLock;

use anyhow::{Context, anyhow, bail};
use chrono::NaiveTime;
use regex::Regex;
use thyme_core::{GapMode, OverlapMode, Shape, SqueezeMode, StackMode};

use crate::Config;

/// Pre-compiled regex for clock times (`9:30`, `09:30`, `09:30:15`).
static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$").unwrap());

/// Pre-compiled regex for pipeline steps (`op`, `op=arg`, `op=arg@HH:MM`).
static STEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<op>[a-z-]+)(?:=(?P<arg>[^@]+))?(?:@(?P<at>[0-9:]+))?$").unwrap()
});

/// Pre-compiled regex for a window argument (`HH:MM-HH:MM`).
static WINDOW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9:]+)-([0-9:]+)$").unwrap());

/// Parse a clock time of the form `H:MM`, `HH:MM` or `HH:MM:SS`.
pub fn parse_clock(s: &str) -> anyhow::Result<NaiveTime> {
    let Some(caps) = CLOCK_RE.captures(s.trim()) else {
        bail!("Invalid time: {s}. Use HH:MM (e.g., 09:30)");
    };
    let hour: u32 = caps[1].parse().context("failed to parse hour")?;
    let minute: u32 = caps[2].parse().context("failed to parse minute")?;
    let second: u32 = caps
        .get(3)
        .map_or(Ok(0), |m| m.as_str().parse())
        .context("failed to parse second")?;
    NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(|| anyhow!("Time out of range: {s}"))
}

/// Serde adapter for clock times written as `HH:MM` strings.
pub mod clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_clock(&s).map_err(serde::de::Error::custom)
    }
}

/// Format a time with a user-supplied `strftime` pattern.
///
/// Invalid patterns are reported as errors instead of panicking.
pub fn format_time(time: NaiveTime, pattern: &str) -> anyhow::Result<String> {
    let mut out = String::new();
    write!(out, "{}", time.format(pattern)).map_err(|_| anyhow!("Invalid time format: {pattern}"))?;
    Ok(out)
}

/// Parse one pipeline step.
///
/// Supports:
/// - `resolve-overlaps=<mode>`, `resolve-gaps=<mode>`
/// - `stack=<mode>` with an optional `@HH:MM` anchor
/// - `squeeze` or `squeeze=<mode>` (mode and minimum default from config)
/// - `eclipse-forward`, `eclipse-backward`
/// - `truncate=HH:MM-HH:MM`
pub fn parse_step(s: &str, config: &Config) -> anyhow::Result<Shape<NaiveTime>> {
    let Some(caps) = STEP_RE.captures(s.trim()) else {
        bail!("Invalid step: {s}");
    };
    let op = &caps["op"];
    let arg = caps.name("arg").map(|m| m.as_str());
    let anchor = caps.name("at").map(|m| parse_clock(m.as_str())).transpose()?;
    if anchor.is_some() && op != "stack" {
        bail!("Only stack takes an @ anchor: {s}");
    }
    let require = |what: &str| arg.ok_or_else(|| anyhow!("{op} needs {what}: {s}"));
    let bare = |shape: Shape<NaiveTime>| match arg {
        Some(_) => Err(anyhow!("{op} takes no argument: {s}")),
        None => Ok(shape),
    };

    let shape = match op {
        "resolve-overlaps" => Shape::ResolveOverlaps {
            mode: require("a mode")?.parse::<OverlapMode>()?,
        },
        "resolve-gaps" => Shape::ResolveGaps {
            mode: require("a mode")?.parse::<GapMode>()?,
        },
        "stack" => Shape::Stack {
            mode: require("a mode")?.parse::<StackMode>()?,
            anchor,
        },
        "squeeze" => Shape::Squeeze {
            mode: arg.map_or(Ok(config.squeeze_mode), str::parse::<SqueezeMode>)?,
            earliest: None,
            latest: None,
            min_minutes: config.min_minutes,
        },
        "eclipse-forward" => bare(Shape::EclipseForward)?,
        "eclipse-backward" => bare(Shape::EclipseBackward)?,
        "truncate" => {
            let window = require("a window")?;
            let Some(bounds) = WINDOW_RE.captures(window) else {
                bail!("Invalid window: {window}. Use HH:MM-HH:MM");
            };
            Shape::Truncate {
                earliest: parse_clock(&bounds[1])?,
                latest: parse_clock(&bounds[2])?,
            }
        }
        other => bail!("Unknown step: {other}"),
    };
    Ok(shape)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_parse_clock_formats() {
        assert_eq!(parse_clock("9:30").unwrap(), t(9, 30));
        assert_eq!(parse_clock("09:30").unwrap(), t(9, 30));
        assert_eq!(
            parse_clock("09:30:15").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 15).unwrap()
        );
    }

    #[test]
    fn test_parse_clock_rejects_garbage() {
        assert!(parse_clock("930").is_err());
        assert!(parse_clock("25:00").is_err());
        assert!(parse_clock("noon").is_err());
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(t(9, 5), "%H:%M").unwrap(), "09:05");
        assert_eq!(format_time(t(14, 0), "%-I%P").unwrap(), "2pm");
        assert!(format_time(t(9, 0), "%Q").is_err());
    }

    #[test]
    fn test_parse_step_modes() {
        let config = Config::default();
        assert_eq!(
            parse_step("resolve-gaps=snap-back", &config).unwrap(),
            Shape::ResolveGaps {
                mode: GapMode::SnapBack
            }
        );
        assert_eq!(
            parse_step("stack=forward@9:00", &config).unwrap(),
            Shape::Stack {
                mode: StackMode::Forward,
                anchor: Some(t(9, 0)),
            }
        );
        assert_eq!(
            parse_step("truncate=09:30-12:30", &config).unwrap(),
            Shape::Truncate {
                earliest: t(9, 30),
                latest: t(12, 30),
            }
        );
        assert_eq!(
            parse_step("eclipse-backward", &config).unwrap(),
            Shape::EclipseBackward
        );
    }

    #[test]
    fn test_parse_step_squeeze_uses_config() {
        let config = Config {
            min_minutes: 12.0,
            squeeze_mode: SqueezeMode::Equal,
            ..Config::default()
        };
        assert_eq!(
            parse_step("squeeze", &config).unwrap(),
            Shape::Squeeze {
                mode: SqueezeMode::Equal,
                earliest: None,
                latest: None,
                min_minutes: 12.0,
            }
        );
        assert_eq!(
            parse_step("squeeze=proportional", &config).unwrap(),
            Shape::Squeeze {
                mode: SqueezeMode::Proportional,
                earliest: None,
                latest: None,
                min_minutes: 12.0,
            }
        );
    }

    #[test]
    fn test_parse_step_errors() {
        let config = Config::default();
        let err = parse_step("stack=sideways", &config).unwrap_err();
        assert_eq!(err.to_string(), "invalid mode for 'stack': 'sideways'");
        assert!(parse_step("resolve-overlaps", &config).is_err());
        assert!(parse_step("truncate=9:30", &config).is_err());
        assert!(parse_step("eclipse-forward=now", &config).is_err());
        assert!(parse_step("squeeze@10:00", &config).is_err());
        assert!(parse_step("frobnicate", &config).is_err());
    }
}
