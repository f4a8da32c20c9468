use std::path::{Path, PathBuf};

use chrono::Utc;
use padelbrain_core::backup::{encode, suggested_backup_file_name};

use crate::commands::common::open_session;
use crate::error::CliError;

pub async fn run_export(
    output_path: Option<&Path>,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let session = open_session(db_path, profile).await?;
    let document = session.export_active()?;
    let rendered = encode(&document)?;

    let path = output_path.map_or_else(
        || {
            PathBuf::from(suggested_backup_file_name(
                &document.user.name,
                Utc::now().timestamp_millis(),
            ))
        },
        Path::to_path_buf,
    );
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, rendered)?;

    tracing::info!(
        "Exported {} matches and {} trainings for {}",
        document.matches.len(),
        document.trainings.len(),
        document.user.name
    );
    println!("{}", path.display());
    Ok(())
}
