//! Archive command CLI definitions

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum ArchiveCommand {
    /// List directory entries
    List {
        /// Only show entries whose name contains this substring
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Print one entry's decompressed bytes
    Read {
        /// Entry name, e.g. data/text/units.csv
        entry: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract entries into a directory
    Extract {
        /// Output directory
        out_dir: PathBuf,

        /// Entry names to extract (everything if omitted)
        entries: Vec<String>,
    },
}
