//! CLI subcommand implementations.

pub mod shape;
pub mod show;
pub mod util;
