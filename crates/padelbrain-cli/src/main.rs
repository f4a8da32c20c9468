//! PadelBrain CLI - match and training journal from the terminal
//!
//! Records, statistics and backup import/export for one or more player
//! profiles stored in a local database.

mod cli;
mod commands;
mod config;
mod error;

use std::io::IsTerminal;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, MatchCommands, TrainingCommands};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::export::run_export;
use crate::commands::import::{run_import, ImportOptions};
use crate::commands::profile::run_profile;
use crate::commands::record::{run_add_match, run_add_training, run_list, run_remove};
use crate::commands::stats::run_stats;
use crate::commands::voice::{run_voice, VoiceOptions};
use crate::config::{CliConfig, DB_PATH_ENV, PROFILE_ENV};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "padelbrain=info".parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = CliConfig::load().map_err(CliError::Config)?;
    let db_path =
        config.resolve_db_path(cli.db_path, std::env::var_os(DB_PATH_ENV).map(Into::into));
    let profile = config.resolve_profile(cli.profile.as_deref(), std::env::var(PROFILE_ENV).ok());
    let profile = profile.as_deref();

    match cli.command {
        Some(Commands::Profile { command }) => run_profile(command, profile, &db_path).await?,
        Some(Commands::Match {
            command: MatchCommands::Add(args),
        }) => run_add_match(args, profile, &db_path).await?,
        Some(Commands::Training {
            command: TrainingCommands::Add(args),
        }) => run_add_training(args, profile, &db_path).await?,
        Some(Commands::List { kind, limit, json }) => {
            run_list(kind, limit, json, profile, &db_path).await?;
        }
        Some(Commands::Remove { kind, id }) => run_remove(kind, &id, profile, &db_path).await?,
        Some(Commands::Export { output }) => {
            run_export(output.as_deref(), profile, &db_path).await?;
        }
        Some(Commands::Import {
            path,
            strategy,
            detect_only,
            expect_profile,
            json,
        }) => {
            let options = ImportOptions {
                path,
                strategy: config.resolve_strategy(strategy),
                detect_only,
                expect_profile,
                json,
                interactive: std::io::stdin().is_terminal(),
            };
            run_import(options, profile, &db_path).await?;
        }
        Some(Commands::Stats { window, json }) => {
            run_stats(window, json, profile, &db_path).await?;
        }
        Some(Commands::Voice {
            text,
            save,
            date,
            json,
        }) => {
            let options = VoiceOptions {
                text,
                save,
                date,
                json,
            };
            run_voice(options, profile, &db_path).await?;
        }
        Some(Commands::Config { command }) => run_config(command)?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
