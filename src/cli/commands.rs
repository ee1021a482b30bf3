//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - detect: show whether a query needs several tools, and the extracted intent
//! - plan: show the execution plan for a query
//! - run: plan and execute a query against the dry-run tools

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Wellflow - multi-tool orchestration for well-data queries
#[derive(Parser, Debug)]
#[command(name = "wellflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect whether a query needs multi-tool handling
    Detect {
        /// Natural-language query
        query: String,
    },

    /// Build and print the execution plan for a query
    Plan {
        /// Natural-language query
        query: String,

        /// Print the plan as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Plan, execute with dry-run tools and synthesize a response
    Run {
        /// Natural-language query
        query: String,

        /// Also print the raw step results as JSON
        #[arg(short, long)]
        json: bool,
    },
}
