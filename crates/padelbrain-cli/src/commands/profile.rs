use std::path::Path;

use padelbrain_core::Profile;
use serde::Serialize;

use crate::cli::ProfileCommands;
use crate::commands::common::{format_profile_lines, open_session};
use crate::error::CliError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView<'a> {
    #[serde(flatten)]
    pub profile: &'a Profile,
    pub matches: usize,
    pub trainings: usize,
}

pub async fn run_profile(
    command: ProfileCommands,
    selector: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    match command {
        ProfileCommands::Create {
            name,
            email,
            avatar,
        } => {
            let mut session = open_session(db_path, None).await?;
            let profile = session.create_profile(&name, email, avatar).await?;
            println!("{}", profile.id);
        }
        ProfileCommands::List { json } => {
            let session = open_session(db_path, None).await?;
            let active = session.active_profile().map(|profile| profile.id);
            if json {
                println!("{}", serde_json::to_string_pretty(session.list_profiles())?);
            } else if session.list_profiles().is_empty() {
                println!(
                    "No profiles yet. Create one with `padelbrain profile create --name <NAME>`."
                );
            } else {
                for line in format_profile_lines(session.list_profiles(), active.as_ref()) {
                    println!("{line}");
                }
            }
        }
        ProfileCommands::Switch { query } => {
            let mut session = open_session(db_path, None).await?;
            let id = session.resolve_profile(&query)?.id;
            let active = session.switch_profile(&id).await?;
            println!("{} ({})", active.name, active.id);
        }
        ProfileCommands::Show { json } => {
            let session = open_session(db_path, selector).await?;
            let profile = session
                .active_profile()
                .ok_or(padelbrain_core::Error::NoActiveProfile)?;
            let view = ProfileView {
                profile,
                matches: session.records().matches().len(),
                trainings: session.records().trainings().len(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                for line in format_profile_view(&view) {
                    println!("{line}");
                }
            }
        }
        ProfileCommands::Delete { query } => {
            let mut session = open_session(db_path, None).await?;
            let id = session.resolve_profile(&query)?.id;
            let removed = session.delete_profile(&id).await?;
            println!("{}", removed.id);
        }
    }

    Ok(())
}

pub fn format_profile_view(view: &ProfileView<'_>) -> Vec<String> {
    let profile = view.profile;
    let mut lines = vec![
        format!("Name:       {}", profile.name),
        format!("ID:         {}", profile.id),
    ];
    if let Some(email) = &profile.email {
        lines.push(format!("Email:      {email}"));
    }
    if let Some(avatar) = &profile.avatar {
        lines.push(format!("Avatar:     {avatar}"));
    }
    lines.push(format!(
        "Created:    {}",
        profile.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    lines.push(format!(
        "Last sync:  {}",
        profile.last_sync_at.map_or_else(
            || "never".to_string(),
            |synced| synced.format("%Y-%m-%d %H:%M UTC").to_string()
        )
    ));
    if let Some(device_id) = &profile.device_id {
        lines.push(format!("Device:     {device_id}"));
    }
    lines.push(format!("Matches:    {}", view.matches));
    lines.push(format!("Trainings:  {}", view.trainings));
    lines
}
