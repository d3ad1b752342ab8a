//! Command-line interface for friendbook.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, ListCommand, RemoveAtCommand, RemoveCommand, ShowCommand,
    StatusCommand,
};

/// friendbook - keep track of the people you meet
///
/// Stores contact records with an optional photo and the position where each
/// one was added.
#[derive(Debug, Parser)]
#[command(name = "friendbook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List records, newest name first
    List(ListCommand),

    /// Show one record
    Show(ShowCommand),

    /// Add a record stamped with the current location
    Add(AddCommand),

    /// Remove records by id
    Remove(RemoveCommand),

    /// Remove records by stored position
    RemoveAt(RemoveAtCommand),

    /// Show store status
    Status(StatusCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
