//! Command handlers for the mew CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod archive;
pub mod configure;
pub mod data;
pub mod save;
