use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Generator, Shell};

use crate::cli::{Cli, CompletionShell};
use crate::error::CliError;

const BIN_NAME: &str = "padelbrain";

pub fn run_completions(shell: CompletionShell, output: Option<&Path>) -> Result<(), CliError> {
    let script = render_completions(shell);

    match output {
        Some(path) => {
            let target = completion_target(shell, path);
            std::fs::write(&target, &script)?;
            tracing::debug!("Wrote {shell:?} completions to {}", target.display());
            println!("{}", target.display());
        }
        None => io::stdout().write_all(&script)?,
    }
    Ok(())
}

pub fn render_completions(shell: CompletionShell) -> Vec<u8> {
    let mut command = Cli::command();
    let mut script = Vec::new();
    generate(Shell::from(shell), &mut command, BIN_NAME, &mut script);
    script
}

/// An existing directory receives the shell's conventional file name
pub fn completion_target(shell: CompletionShell, output: &Path) -> PathBuf {
    if output.is_dir() {
        output.join(Shell::from(shell).file_name(BIN_NAME))
    } else {
        output.to_path_buf()
    }
}
