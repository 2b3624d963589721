//! CLI argument definitions for mew
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod archive;
mod core;
mod data;
mod save;

pub use archive::ArchiveCommand;
pub use core::{Cli, Commands};
pub use data::{DataCommand, OutputFormat};
pub use save::SaveCommand;
