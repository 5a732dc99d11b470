//! CLI module for the appdef tool.
//!
//! This module provides the command-line interface for validating and
//! inspecting application definitions.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::{ComponentView, OutputFormatter, PodSummary, ValidationReport};
