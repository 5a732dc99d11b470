//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Appdef - declarative application definition validator.
#[derive(Parser, Debug)]
#[command(name = "appdef")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the definition file.
    #[arg(short, long, global = true, env = "APPDEF_FILE")]
    pub file: Option<PathBuf>,

    /// Organization the definition is validated for.
    #[arg(long, global = true, env = "APPDEF_ORG")]
    pub org: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the application definition.
    Validate {
        /// Apply defaults and print the effective definition.
        #[arg(short, long)]
        effective: bool,
    },

    /// Show the deployment order for the given components.
    Order {
        /// Component names (defaults to every component).
        names: Vec<String>,
    },

    /// List pods and their members.
    Pods,

    /// Show the resolved view of one component.
    Inspect {
        /// Component name.
        component: String,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
