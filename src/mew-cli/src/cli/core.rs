//! Core CLI definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::archive::ArchiveCommand;
use super::data::DataCommand;
use super::save::SaveCommand;

#[derive(Parser)]
#[command(name = "mew")]
#[command(about = "Mewgenics save renamer and game-data browser", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List save files under the Mewgenics profile directory
    Saves {
        /// Directory to scan (uses configured/default location if omitted)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Save file operations (list, rename, backup, restore)
    #[command(visible_alias = "s")]
    Save {
        /// Path to .sav file
        input: PathBuf,

        #[command(subcommand)]
        command: SaveCommand,
    },

    /// Packed archive operations (list, read, extract)
    #[command(visible_alias = "a")]
    Archive {
        /// Path to the archive file
        input: PathBuf,

        #[command(subcommand)]
        command: ArchiveCommand,
    },

    /// Game-data listings parsed from the archive
    #[command(visible_alias = "d")]
    Data {
        #[command(subcommand)]
        command: DataCommand,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set the default archive path
        #[arg(long)]
        archive: Option<PathBuf>,

        /// Set the save scan directory
        #[arg(long)]
        save_dir: Option<PathBuf>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
