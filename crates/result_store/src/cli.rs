//! Command-line interface for result_store.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use result_store::Collection;

/// Result Store - inspect and record local game results
#[derive(Parser, Debug)]
#[command(name = "result_store")]
#[command(about = "Local persistence for classic, daily and stat records", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the database (overrides config and environment)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record a classic-mode game
    Classic {
        /// The game was won
        #[arg(long, conflicts_with = "loss", required_unless_present = "loss")]
        win: bool,

        /// The game was lost
        #[arg(long)]
        loss: bool,

        /// Number of guesses used
        #[arg(short, long)]
        guesses: i32,
    },

    /// Record the daily-mode game
    Daily {
        /// Number of guesses used
        #[arg(short, long)]
        guesses: i32,
    },

    /// Set a named statistic
    Stat {
        /// Statistic name
        name: String,

        /// New value
        value: f64,
    },

    /// Add to a named statistic
    Bump {
        /// Statistic name
        name: String,

        /// Amount to add
        #[arg(long, default_value = "1")]
        by: f64,
    },

    /// List the records of one collection (all when omitted)
    List {
        /// Collection to list
        collection: Option<Collection>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print win rate and guess distribution for classic games
    Summary {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the declared database layout
    Schema,
}
