//! Command-line interface for the `bingo` binary.

use bingo_card::CardId;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Yearly Bingo - goal cards you fill in over a year
#[derive(Parser, Debug)]
#[command(name = "bingo")]
#[command(about = "Create, fill, and track yearly goal bingo cards", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Card storage directory (overrides the config file)
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Grid)]
    pub format: OutputFormat,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// How cards are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Rendered grid plus a summary line
    Grid,
    /// Pretty-printed JSON
    Json,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty draft card
    New {
        /// Calendar year
        #[arg(short, long)]
        year: i32,

        /// Grid side length (2-5)
        #[arg(short, long, default_value = "5")]
        size: usize,

        /// Leave the centre square as a normal square
        #[arg(long)]
        no_free_space: bool,

        /// Card title
        #[arg(long)]
        title: Option<String>,

        /// Category name
        #[arg(long)]
        category: Option<String>,
    },

    /// Add a goal, at a random square when no position is given
    Add {
        /// Card id
        #[arg(short, long)]
        card: CardId,

        /// Square index
        #[arg(short, long)]
        position: Option<usize>,

        /// Goal text
        content: String,
    },

    /// Add several goals at random squares
    Fill {
        /// Card id
        #[arg(short, long)]
        card: CardId,

        /// Goal texts
        #[arg(required = true)]
        contents: Vec<String>,
    },

    /// Redistribute a draft card's goals at random
    Shuffle {
        /// Card id
        #[arg(short, long)]
        card: CardId,
    },

    /// Remove the goal at a square
    Remove {
        /// Card id
        #[arg(short, long)]
        card: CardId,

        /// Square index
        #[arg(short, long)]
        position: usize,
    },

    /// Lock the layout of a full card
    Finalize {
        /// Card id
        #[arg(short, long)]
        card: CardId,
    },

    /// Archive a finalized card
    Archive {
        /// Card id
        #[arg(short, long)]
        card: CardId,
    },

    /// Mark a goal complete
    Complete {
        /// Card id
        #[arg(short, long)]
        card: CardId,

        /// Square index
        #[arg(short, long)]
        position: usize,

        /// Notes about the achievement
        #[arg(long)]
        notes: Option<String>,

        /// Link or reference proving it
        #[arg(long)]
        proof: Option<String>,
    },

    /// Mark a goal incomplete again
    Uncomplete {
        /// Card id
        #[arg(short, long)]
        card: CardId,

        /// Square index
        #[arg(short, long)]
        position: usize,
    },

    /// Print a card
    Show {
        /// Card id
        #[arg(short, long)]
        card: CardId,
    },

    /// Print progress statistics
    Stats {
        /// Card id
        #[arg(short, long)]
        card: CardId,
    },

    /// List stored cards
    List,

    /// Run admission checks against a configured rate-limit scope
    Admit {
        /// Scope name from the config (api, auth, suggestions, ...)
        #[arg(short, long, default_value = "api")]
        scope: String,

        /// Client key to count under
        #[arg(long, default_value = "127.0.0.1")]
        client: String,

        /// Number of checks to run
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,
    },
}
