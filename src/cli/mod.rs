//! CLI module for wellflow - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
