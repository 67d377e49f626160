//! On-disk agenda and span-list formats.
//!
//! Both are TOML. An agenda is a list of named blocks, each starting where the
//! previous one ends, optionally listing the items to fit inside it:
//!
//! ```toml
//! end = "13:00"
//!
//! [[block]]
//! name = "morning"
//! start = "09:00"
//! items = [{ name = "email", minutes = 30 }, { name = "deep work", minutes = 90 }]
//!
//! [[block]]
//! name = "lunch"
//! start = "12:00"
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveTime;
use figment::Figment;
use figment::providers::{Format, Toml};
use serde::{Deserialize, Serialize};
use thyme_core::{Partition, ScheduleItem, ScheduleItems, Span};

use crate::Config;
use crate::commands::util::clock;

/// Reads a TOML file into `T`.
fn load_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Figment::from(Toml::string(&text))
        .extract()
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// An activity to fit into a block.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemEntry {
    pub name: String,
    pub minutes: f64,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub ideal: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

impl From<&ItemEntry> for ScheduleItem {
    fn from(entry: &ItemEntry) -> Self {
        Self::with_bounds(
            entry.name.clone(),
            entry.minutes,
            entry.minimum,
            entry.ideal,
            entry.maximum,
        )
    }
}

/// A named block of the day.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockEntry {
    pub name: String,
    #[serde(deserialize_with = "clock::deserialize")]
    pub start: NaiveTime,
    #[serde(default)]
    pub items: Vec<ItemEntry>,
}

/// A whole agenda file.
#[derive(Debug, Clone, Deserialize)]
pub struct AgendaFile {
    #[serde(deserialize_with = "clock::deserialize")]
    pub end: NaiveTime,
    #[serde(rename = "block", default)]
    pub blocks: Vec<BlockEntry>,
}

/// Items that did not fit into their block.
#[derive(Debug, Clone, Serialize)]
pub struct Unscheduled {
    pub block: String,
    pub items: ScheduleItems,
}

/// A laid-out agenda.
#[derive(Debug, Clone)]
pub struct Plan {
    pub partition: Partition<NaiveTime>,
    pub unscheduled: Vec<Unscheduled>,
}

impl AgendaFile {
    pub fn load(path: &Path) -> Result<Self> {
        load_toml(path)
    }

    /// Builds the day from the block starts and fills every block that lists
    /// items.
    pub fn plan(&self, config: &Config) -> Result<Plan> {
        if self.blocks.is_empty() {
            bail!("agenda has no blocks");
        }
        let mut seen = HashSet::new();
        if let Some(block) = self.blocks.iter().find(|block| !seen.insert(&block.name)) {
            bail!("duplicate block name: {}", block.name);
        }

        let points: Vec<NaiveTime> = self
            .blocks
            .iter()
            .map(|block| block.start)
            .chain(std::iter::once(self.end))
            .collect();
        let names = self.blocks.iter().map(|block| block.name.clone()).collect();
        let mut partition = Partition::from_boundaries(&points, Some(names))
            .context("blocks must be in time order and finish by the agenda end")?;

        // Fill from the last block so nested item names never shadow a later block.
        let mut unscheduled = Vec::new();
        for block in self.blocks.iter().rev().filter(|block| !block.items.is_empty()) {
            let items = ScheduleItems::new(block.items.iter().map(ScheduleItem::from).collect())
                .with_context(|| format!("invalid items in block {}", block.name))?;
            let (filled, leftover) = partition
                .fill(&block.name, &items, config.squeeze_mode, config.min_minutes)
                .with_context(|| format!("failed to fill block {}", block.name))?;
            partition = filled;
            if !leftover.is_empty() {
                tracing::debug!(block = %block.name, count = leftover.len(), "items left over");
                unscheduled.push(Unscheduled {
                    block: block.name.clone(),
                    items: leftover,
                });
            }
        }
        unscheduled.reverse();

        Ok(Plan {
            partition,
            unscheduled,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SpanEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(deserialize_with = "clock::deserialize")]
    start: NaiveTime,
    #[serde(deserialize_with = "clock::deserialize")]
    end: NaiveTime,
}

#[derive(Debug, Clone, Deserialize)]
struct SpansFile {
    #[serde(rename = "span", default)]
    spans: Vec<SpanEntry>,
}

/// Loads a `[[span]]` list.
pub fn load_spans(path: &Path) -> Result<Vec<Span<NaiveTime>>> {
    let file: SpansFile = load_toml(path)?;
    Ok(file
        .spans
        .into_iter()
        .map(|entry| Span::new(entry.start, entry.end).with_optional_name(entry.name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn write(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("file.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_agenda() {
        let temp = tempfile::tempdir().unwrap();
        let path = write(
            &temp,
            r#"
end = "13:00"

[[block]]
name = "morning"
start = "9:00"
items = [{ name = "email", minutes = 30, maximum = 45 }]

[[block]]
name = "lunch"
start = "12:00"
"#,
        );
        let agenda = AgendaFile::load(&path).unwrap();
        assert_eq!(agenda.end, t(13, 0));
        assert_eq!(agenda.blocks.len(), 2);
        assert_eq!(agenda.blocks[0].start, t(9, 0));
        assert_eq!(agenda.blocks[0].items[0].maximum, Some(45.0));
        assert!(agenda.blocks[1].items.is_empty());
    }

    #[test]
    fn test_plan_rejects_out_of_order_blocks() {
        let temp = tempfile::tempdir().unwrap();
        let path = write(
            &temp,
            r#"
end = "13:00"

[[block]]
name = "late"
start = "12:00"

[[block]]
name = "early"
start = "09:00"
"#,
        );
        let err = AgendaFile::load(&path)
            .unwrap()
            .plan(&Config::default())
            .unwrap_err();
        assert!(err.to_string().contains("time order"), "{err}");
    }

    #[test]
    fn test_plan_rejects_duplicate_blocks() {
        let temp = tempfile::tempdir().unwrap();
        let path = write(
            &temp,
            r#"
end = "13:00"

[[block]]
name = "focus"
start = "09:00"

[[block]]
name = "focus"
start = "11:00"
"#,
        );
        let err = AgendaFile::load(&path)
            .unwrap()
            .plan(&Config::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "duplicate block name: focus");
    }

    #[test]
    fn test_item_named_like_later_block_does_not_shadow_it() {
        let temp = tempfile::tempdir().unwrap();
        let path = write(
            &temp,
            r#"
end = "12:00"

[[block]]
name = "morning"
start = "09:00"
items = [{ name = "review", minutes = 60 }]

[[block]]
name = "review"
start = "10:00"
items = [{ name = "pull requests", minutes = 60 }, { name = "docs", minutes = 60 }]
"#,
        );
        let plan = AgendaFile::load(&path)
            .unwrap()
            .plan(&Config::default())
            .unwrap();
        let leaves: Vec<_> = plan
            .partition
            .iter_nested()
            .map(|(_, span)| span.name().unwrap_or_default().to_string())
            .collect();
        assert_eq!(leaves, vec!["review", "pull requests", "docs"]);
        assert!(plan.unscheduled.is_empty());
    }

    #[test]
    fn test_load_spans() {
        let temp = tempfile::tempdir().unwrap();
        let path = write(
            &temp,
            r#"
[[span]]
name = "email"
start = "09:00"
end = "09:30"

[[span]]
start = "10:00"
end = "10:15"
"#,
        );
        let spans = load_spans(&path).unwrap();
        assert_eq!(spans, vec![Span::new(t(9, 0), t(9, 30)), Span::new(t(10, 0), t(10, 15))]);
        assert_eq!(spans[0].name(), Some("email"));
        assert_eq!(spans[1].name(), None);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = load_spans(Path::new("/nonexistent/spans.toml")).unwrap_err();
        assert!(err.to_string().starts_with("failed to read"), "{err}");
    }
}
