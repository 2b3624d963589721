//! Game-data command CLI definitions

use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum DataCommand {
    /// List named game entities from the localization CSVs
    Entities {
        /// Archive path (uses the configured default if omitted)
        #[arg(short, long, env = "MEW_ARCHIVE")]
        archive: Option<PathBuf>,

        /// Only one category (enemies, familiars, player_units, items, furniture)
        #[arg(short, long)]
        category: Option<String>,

        /// Language column to display
        #[arg(short, long, default_value = "en")]
        lang: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// List the cat-name pools
    Pools {
        /// Archive path (uses the configured default if omitted)
        #[arg(short, long, env = "MEW_ARCHIVE")]
        archive: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Print every name instead of counts
        #[arg(long)]
        full: bool,
    },
}
