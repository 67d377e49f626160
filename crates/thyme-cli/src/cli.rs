//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::shape::ShapeArgs;
use crate::commands::show::ShowArgs;

/// Agenda builder.
///
/// Lays named time blocks out as a contiguous day, fits activities into them,
/// and reshapes loose lists of time spans.
#[derive(Debug, Parser)]
#[command(name = "thyme", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the agenda described by a TOML file.
    Show(ShowArgs),

    /// Apply shaping steps to a TOML list of spans.
    Shape(ShapeArgs),
}
