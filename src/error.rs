//! Error types for indexing and configuration.

use crate::parsing::ParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building the index.
///
/// Lookups never produce these; a miss is an `Option::None`.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to read file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {} at {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl IndexError {
    /// Hints printed by the CLI beneath the error message.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::DirectoryNotFound { .. } => vec![
                "Check the path passed to the command",
                "Set indexing.root in .protoindex/settings.toml",
            ],
            Self::FileRead { .. } => vec![
                "Check that the file exists and is readable",
                "Files must be valid UTF-8",
            ],
            Self::Parse { .. } => vec![
                "Look for an unterminated string literal or block comment near the reported line",
            ],
            Self::Config(_) => vec![
                "Run 'protoindex init --force' to regenerate the configuration file",
                "Check PROTOINDEX_* environment variables for typos",
            ],
        }
    }
}

pub type IndexResult<T> = Result<T, IndexError>;
