//! Shape command for reshaping a list of spans.
//!
//! This module implements `thyme shape` which loads `[[span]]` tables, runs
//! them through the requested pipeline steps in order, and prints the result.

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use clap::Args;
use serde::Serialize;
use thyme_core::{Span, run_pipeline};

use super::util::{format_time, parse_step};
use crate::Config;
use crate::agenda::load_spans;

#[derive(Debug, Args)]
pub struct ShapeArgs {
    /// Spans file (TOML).
    pub spans: PathBuf,

    /// Pipeline step, repeatable (e.g. `resolve-gaps=snap-forward`, `stack=forward@09:00`).
    #[arg(short, long = "step")]
    pub steps: Vec<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Format spans one per line.
pub fn format_spans(spans: &[Span<NaiveTime>], pattern: &str) -> Result<String> {
    let mut output = String::new();
    for span in spans {
        writeln!(
            output,
            "{} - {}  {}",
            format_time(span.start(), pattern)?,
            format_time(span.end(), pattern)?,
            span.name().unwrap_or("(unnamed)")
        )?;
    }
    Ok(output)
}

#[derive(Debug, Serialize)]
struct JsonSpan<'a> {
    name: Option<&'a str>,
    start: String,
    end: String,
    minutes: f64,
}

/// Format spans as a JSON array.
pub fn format_spans_json(spans: &[Span<NaiveTime>], pattern: &str) -> Result<String> {
    let entries = spans
        .iter()
        .map(|span| {
            Ok(JsonSpan {
                name: span.name(),
                start: format_time(span.start(), pattern)?,
                end: format_time(span.end(), pattern)?,
                minutes: span.minutes(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(serde_json::to_string_pretty(&entries)?)
}

/// Runs the shape command.
pub fn run<W: Write>(writer: &mut W, args: &ShapeArgs, config: &Config) -> Result<()> {
    let spans = load_spans(&args.spans)?;
    let steps = args
        .steps
        .iter()
        .map(|step| parse_step(step, config))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(spans = spans.len(), steps = steps.len(), "shaping spans");

    let shaped = run_pipeline(&spans, &steps).context("failed to apply steps")?;

    if args.json {
        writeln!(writer, "{}", format_spans_json(&shaped, &config.time_format)?)?;
    } else {
        write!(writer, "{}", format_spans(&shaped, &config.time_format)?)?;
    }

    Ok(())
}
