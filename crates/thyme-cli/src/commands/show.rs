//! Show command for printing an agenda.
//!
//! This module implements `thyme show` which lays out the blocks of an agenda
//! file, fits each block's items into it, and lists whatever did not fit.

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::util::format_time;
use crate::Config;
use crate::agenda::{AgendaFile, Plan, Unscheduled};

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Agenda file (TOML).
    pub agenda: PathBuf,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

// ========== Human-Readable Output ==========

/// Format a plan as an indented agenda.
pub fn format_plan(plan: &Plan, pattern: &str) -> Result<String> {
    let mut output = String::new();

    for (depth, segment) in plan.partition.outline() {
        let indent = "  ".repeat(depth);
        let name = segment.name().unwrap_or("(unnamed)");
        writeln!(output, "{indent}{}  {name}", format_time(segment.start(), pattern)?)?;
    }
    writeln!(output, "{}  <END>", format_time(plan.partition.end(), pattern)?)?;

    if !plan.unscheduled.is_empty() {
        writeln!(output)?;
        writeln!(output, "Unscheduled:")?;
        for entry in &plan.unscheduled {
            let items: Vec<String> = entry
                .items
                .iter()
                .map(|item| format!("{} ({} min)", item.name(), item.default_minutes()))
                .collect();
            writeln!(output, "  {}: {}", entry.block, items.join(", "))?;
        }
    }

    Ok(output)
}

// ========== JSON Output ==========

#[derive(Debug, Serialize)]
struct JsonEntry {
    depth: usize,
    name: Option<String>,
    start: String,
    end: String,
}

#[derive(Debug, Serialize)]
struct JsonPlan<'a> {
    agenda: Vec<JsonEntry>,
    unscheduled: &'a [Unscheduled],
}

/// Format a plan as JSON, one agenda entry per block or item.
pub fn format_plan_json(plan: &Plan, pattern: &str) -> Result<String> {
    let agenda = plan
        .partition
        .outline()
        .into_iter()
        .map(|(depth, segment)| {
            Ok(JsonEntry {
                depth,
                name: segment.name().map(str::to_string),
                start: format_time(segment.start(), pattern)?,
                end: format_time(segment.end(), pattern)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(serde_json::to_string_pretty(&JsonPlan {
        agenda,
        unscheduled: &plan.unscheduled,
    })?)
}

// ========== Public Interface ==========

/// Runs the show command.
pub fn run<W: Write>(writer: &mut W, args: &ShowArgs, config: &Config) -> Result<()> {
    let agenda = AgendaFile::load(&args.agenda)?;
    let plan = agenda.plan(config)?;
    tracing::debug!(
        blocks = plan.partition.segments().len(),
        depth = plan.partition.depth(),
        "agenda planned"
    );

    if args.json {
        writeln!(writer, "{}", format_plan_json(&plan, &config.time_format)?)?;
    } else {
        write!(writer, "{}", format_plan(&plan, &config.time_format)?)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    const AGENDA: &str = r#"
end = "14:00"

[[block]]
name = "morning"
start = "09:00"
items = [
    { name = "email", minutes = 30 },
    { name = "deep work", minutes = 90 },
]

[[block]]
name = "lunch"
start = "12:00"

[[block]]
name = "errands"
start = "13:00"
items = [
    { name = "bank", minutes = 30 },
    { name = "post", minutes = 30 },
    { name = "groceries", minutes = 30 },
    { name = "pharmacy", minutes = 30 },
]
"#;

    fn show(json: bool, config: &Config) -> String {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("agenda.toml");
        std::fs::write(&path, AGENDA).unwrap();

        let mut output = Vec::new();
        let args = ShowArgs { agenda: path, json };
        run(&mut output, &args, config).unwrap();
        String::from_utf8(output).unwrap()
    }

    fn roomy_config() -> Config {
        Config {
            min_minutes: 25.0,
            ..Config::default()
        }
    }

    #[test]
    fn test_show_prints_nested_agenda() {
        assert_snapshot!(show(false, &roomy_config()), @r"
        09:00  morning
          09:00  email
          09:45  deep work
        12:00  lunch
        13:00  errands
          13:00  bank
          13:30  post
        14:00  <END>
        
        Unscheduled:
          errands: groceries (30 min), pharmacy (30 min)
        ");
    }

    #[test]
    fn test_show_respects_time_format() {
        let config = Config {
            time_format: "%-I:%M%P".to_string(),
            ..roomy_config()
        };
        let output = show(false, &config);
        assert!(output.starts_with("9:00am  morning\n"), "{output}");
        assert!(output.contains("2:00pm  <END>"), "{output}");
    }

    #[test]
    fn test_show_json_lists_entries_and_leftovers() {
        let output = show(true, &roomy_config());
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        let agenda = json["agenda"].as_array().unwrap();
        assert_eq!(agenda.len(), 7);
        assert_eq!(agenda[0]["name"], "morning");
        assert_eq!(agenda[0]["end"], "12:00");
        assert_eq!(agenda[2]["depth"], 1);
        assert_eq!(agenda[2]["start"], "09:45");

        let unscheduled = json["unscheduled"].as_array().unwrap();
        assert_eq!(unscheduled[0]["block"], "errands");
        assert_eq!(unscheduled[0]["items"][0]["name"], "groceries");
    }

    #[test]
    fn test_show_fits_everything_with_small_minimum() {
        let output = show(false, &Config::default());
        assert!(!output.contains("Unscheduled"), "{output}");
        assert!(output.contains("  13:45  pharmacy"), "{output}");
    }
}
