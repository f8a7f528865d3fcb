//! Command implementations for the CLI.
//!
//! Every command returns an [`Envelope`]; `main` prints it and exits with its
//! exit code.

pub mod init;
pub mod query;

use crate::cli::Commands;
use crate::config::Settings;
use crate::io::Envelope;
use std::path::PathBuf;
use std::sync::Arc;

pub fn run(command: Commands, settings: Arc<Settings>, root: Option<PathBuf>) -> Envelope {
    match command {
        Commands::Init { force } => init::run_init(force),
        Commands::Config => init::run_config(&settings),
        Commands::Index => query::run_index(settings, root),
        Commands::Search {
            query: text,
            limit,
            min_score,
        } => query::run_search(settings, root, &text, limit, min_score),
        Commands::Service { name, resolution } => {
            query::run_service(settings, root, &name, resolution)
        }
        Commands::Message { name, resolution } => {
            query::run_message(settings, root, &name, resolution)
        }
        Commands::Enum { name } => query::run_enum(settings, root, &name),
        Commands::Usages { type_name } => query::run_usages(settings, root, &type_name),
        Commands::Stats => query::run_stats(settings, root),
    }
}
