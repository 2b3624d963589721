//! Save command CLI definitions

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum SaveCommand {
    /// List cat rows with their decoded names
    List {
        /// Only show one category (team_cats, profile_cat, winning_teams)
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Rename one cat
    Rename {
        /// Row key (integer for cats/winning_teams, text for files)
        key: String,

        /// Replacement name, 1-24 printable characters
        new_name: String,

        /// Category holding the row
        #[arg(short, long, default_value = "team_cats")]
        category: String,

        /// Skip the automatic backup
        #[arg(long)]
        no_backup: bool,

        /// Write even if the game appears to be running
        #[arg(long)]
        force: bool,
    },

    /// Create a timestamped, verified backup of this save
    Backup,

    /// List this save's backups, newest first
    Backups,

    /// Restore a backup over this save
    Restore {
        /// Backup file to restore from
        backup: PathBuf,

        /// Restore even if the game appears to be running
        #[arg(long)]
        force: bool,
    },
}
