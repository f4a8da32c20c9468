use std::path::PathBuf;

use crate::cli::ConfigCommands;
use crate::commands::common::parse_strategy_name;
use crate::config::{default_config_path, normalize_text_option, CliConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands) -> Result<(), CliError> {
    let mut config = CliConfig::load().map_err(CliError::Config)?;

    match command {
        ConfigCommands::Show => {
            println!("# {}", default_config_path().display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Set {
            database,
            default_profile,
            strategy,
        } => {
            apply_config_changes(&mut config, database, default_profile, strategy)?;
            let path = config.save().map_err(CliError::Config)?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

/// Apply `config set` flags; an empty value clears the stored default
pub fn apply_config_changes(
    config: &mut CliConfig,
    database: Option<PathBuf>,
    default_profile: Option<String>,
    strategy: Option<String>,
) -> Result<(), CliError> {
    if let Some(database) = database {
        config.db_path = (!database.as_os_str().is_empty()).then_some(database);
    }
    if let Some(default_profile) = default_profile {
        config.default_profile = normalize_text_option(Some(default_profile));
    }
    if let Some(strategy) = strategy {
        config.default_strategy = match normalize_text_option(Some(strategy)) {
            Some(name) => Some(parse_strategy_name(&name)?.as_str().to_string()),
            None => None,
        };
    }
    Ok(())
}
