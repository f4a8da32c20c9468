pub mod common;
pub mod completions;
pub mod config;
pub mod export;
pub mod import;
pub mod profile;
pub mod record;
pub mod stats;
pub mod voice;
