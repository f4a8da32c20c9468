use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use padelbrain_core::models::MatchOutcome;
use padelbrain_core::RecordKind;

#[derive(Parser)]
#[command(name = "padelbrain")]
#[command(about = "Track padel matches and trainings, with portable backups")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Player profile (id, id prefix or name) to act on
    #[arg(long, global = true, value_name = "PROFILE")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage player profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Record matches
    Match {
        #[command(subcommand)]
        command: MatchCommands,
    },
    /// Record training sessions
    Training {
        #[command(subcommand)]
        command: TrainingCommands,
    },
    /// List recent records of the active profile
    List {
        /// Collection to list
        #[arg(value_enum)]
        kind: KindArg,
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a record
    #[command(alias = "rm")]
    Remove {
        /// Collection holding the record
        #[arg(value_enum)]
        kind: KindArg,
        /// Record ID or unique ID prefix
        id: String,
    },
    /// Export the active profile as a backup file
    Export {
        /// Output path (defaults to a generated file name in the current directory)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import a backup file
    Import {
        /// Backup file to import
        path: PathBuf,
        /// Merge strategy: use-local, use-remote, merge-smart or keep-both
        #[arg(short, long, value_name = "STRATEGY")]
        strategy: Option<String>,
        /// Only report conflicts, change nothing
        #[arg(long)]
        detect_only: bool,
        /// Refuse backups that belong to another profile (id or name)
        #[arg(long, value_name = "PROFILE")]
        expect_profile: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show statistics for the active profile
    Stats {
        /// Number of matches in the trailing win-rate window
        #[arg(short, long, default_value = "5")]
        window: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract a record from dictated text
    Voice {
        /// Transcript text
        #[arg(required = true)]
        text: Vec<String>,
        /// Store the extracted record
        #[arg(long)]
        save: bool,
        /// Record date (defaults to today)
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change CLI defaults
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KindArg {
    #[value(alias = "match")]
    Matches,
    #[value(alias = "training")]
    Trainings,
}

impl From<KindArg> for RecordKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Matches => Self::Matches,
            KindArg::Trainings => Self::Trainings,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ResultArg {
    Win,
    Loss,
    Draw,
}

impl From<ResultArg> for MatchOutcome {
    fn from(value: ResultArg) -> Self {
        match value {
            ResultArg::Win => Self::Win,
            ResultArg::Loss => Self::Loss,
            ResultArg::Draw => Self::Draw,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
    Elvish,
}

impl From<CompletionShell> for clap_complete::Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Self::Bash,
            CompletionShell::Zsh => Self::Zsh,
            CompletionShell::Fish => Self::Fish,
            CompletionShell::PowerShell => Self::PowerShell,
            CompletionShell::Elvish => Self::Elvish,
        }
    }
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Create a profile; the first one becomes active
    Create {
        /// Display name
        #[arg(long)]
        name: String,
        /// Contact email
        #[arg(long)]
        email: Option<String>,
        /// Avatar URL or emoji
        #[arg(long)]
        avatar: Option<String>,
    },
    /// List profiles
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Make a profile active
    Switch {
        /// Profile ID, ID prefix or name
        #[arg(value_name = "PROFILE")]
        query: String,
    },
    /// Show the active profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a profile and all of its records
    Delete {
        /// Profile ID, ID prefix or name
        #[arg(value_name = "PROFILE")]
        query: String,
    },
}

#[derive(Subcommand)]
pub enum MatchCommands {
    /// Record a match
    Add(MatchArgs),
}

#[derive(Subcommand)]
pub enum TrainingCommands {
    /// Record a training session
    Add(TrainingArgs),
}

/// Fields shared by every record
#[derive(Args, Debug, Clone, Default)]
pub struct CommonRecordArgs {
    /// Date (YYYY-MM-DD or RFC 3339), defaults to today
    #[arg(long)]
    pub date: Option<String>,
    /// Club or court
    #[arg(long)]
    pub location: Option<String>,
    /// Playing partner
    #[arg(long)]
    pub partner: Option<String>,
    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,
    /// Mood from 1 to 5
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub mood: Option<u8>,
    /// Extra attribute as key=value (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub attributes: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct MatchArgs {
    #[command(flatten)]
    pub common: CommonRecordArgs,
    /// Match result
    #[arg(long, value_enum)]
    pub result: Option<ResultArg>,
    /// Set scores, e.g. "6-4 3-6 7-5"
    #[arg(long)]
    pub score: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TrainingArgs {
    #[command(flatten)]
    pub common: CommonRecordArgs,
    /// Duration in minutes
    #[arg(long)]
    pub duration: Option<u32>,
    /// Focus areas, comma separated
    #[arg(long, value_delimiter = ',')]
    pub focus: Vec<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the current configuration
    Show,
    /// Update stored defaults
    Set {
        /// Default database path
        #[arg(long = "database", value_name = "PATH")]
        database: Option<PathBuf>,
        /// Default profile (id, id prefix or name)
        #[arg(long = "default-profile", value_name = "PROFILE")]
        default_profile: Option<String>,
        /// Default merge strategy for imports with conflicts
        #[arg(long, value_name = "STRATEGY")]
        strategy: Option<String>,
    },
}
