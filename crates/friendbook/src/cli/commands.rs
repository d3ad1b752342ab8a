//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::location::Coordinate;

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show records whose name contains this text (case-insensitive)
    #[arg(short, long)]
    pub search: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Record id
    pub id: Uuid,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Display name
    #[arg(short, long)]
    pub name: String,

    /// Phone number
    #[arg(short, long, default_value = "")]
    pub phone: String,

    /// Social media handle
    #[arg(short, long, default_value = "")]
    pub social: String,

    /// Free-text note
    #[arg(long, default_value = "")]
    pub note: String,

    /// Image file to attach as the photo
    #[arg(long, value_name = "FILE")]
    pub photo: Option<PathBuf>,

    /// Report this position instead of the configured one
    #[arg(
        long,
        value_name = "LAT,LNG",
        value_parser = parse_coordinate,
        allow_hyphen_values = true
    )]
    pub at: Option<Coordinate>,
}

/// Remove command arguments.
#[derive(Debug, Args)]
pub struct RemoveCommand {
    /// Ids of the records to remove
    #[arg(required = true)]
    pub ids: Vec<Uuid>,
}

/// Remove-at command arguments.
#[derive(Debug, Args)]
pub struct RemoveAtCommand {
    /// Stored positions (as printed by `list`) to remove in one step
    #[arg(required = true)]
    pub positions: Vec<usize>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn parse_coordinate(s: &str) -> Result<Coordinate, String> {
    s.parse::<Coordinate>().map_err(|e| e.to_string())
}
