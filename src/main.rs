use clap::Parser;
use protoindex::cli::{Cli, commands};
use protoindex::config::Settings;
use protoindex::error::IndexError;
use protoindex::io::Envelope;
use protoindex::logging;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let envelope = match loaded {
        Ok(settings) => {
            logging::init_with_config(&settings.logging);
            commands::run(cli.command, Arc::new(settings), cli.root)
        }
        Err(e) => Envelope::from_index_error(&IndexError::from(e)),
    };

    let json = if cli.compact {
        envelope.to_json_compact()?
    } else {
        envelope.to_json()?
    };
    println!("{json}");

    Ok(ExitCode::from(envelope.exit_code))
}
