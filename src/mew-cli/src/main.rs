mod cli;
mod commands;
mod config;
mod file_io;

use anyhow::Result;
use clap::Parser;

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Saves { dir } => {
            commands::save::saves(dir.as_deref())?;
        }

        Commands::Save { input, command } => match command {
            SaveCommand::List { category } => {
                commands::save::list(&input, category.as_deref())?;
            }

            SaveCommand::Rename {
                key,
                new_name,
                category,
                no_backup,
                force,
            } => {
                commands::save::rename(&input, &key, &new_name, &category, no_backup, force)?;
            }

            SaveCommand::Backup => {
                commands::save::backup(&input)?;
            }

            SaveCommand::Backups => {
                commands::save::backups(&input)?;
            }

            SaveCommand::Restore { backup, force } => {
                commands::save::restore(&input, &backup, force)?;
            }
        },

        Commands::Archive { input, command } => match command {
            ArchiveCommand::List { filter } => {
                commands::archive::list(&input, filter.as_deref())?;
            }

            ArchiveCommand::Read { entry, output } => {
                commands::archive::read(&input, &entry, output.as_deref())?;
            }

            ArchiveCommand::Extract { out_dir, entries } => {
                commands::archive::extract(&input, &out_dir, &entries)?;
            }
        },

        Commands::Data { command } => match command {
            DataCommand::Entities {
                archive,
                category,
                lang,
                format,
            } => {
                commands::data::entities(archive, category.as_deref(), &lang, format)?;
            }

            DataCommand::Pools {
                archive,
                format,
                full,
            } => {
                commands::data::pools(archive, format, full)?;
            }
        },

        Commands::Configure {
            archive,
            save_dir,
            show,
        } => {
            commands::configure::handle(archive, save_dir, show)?;
        }
    }

    Ok(())
}
