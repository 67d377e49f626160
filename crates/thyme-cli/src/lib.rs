//! Agenda builder CLI library.
//!
//! This crate provides the CLI interface on top of `thyme-core`.

pub mod agenda;
mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
