//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Index protocol definition files and query services, messages and enums
#[derive(Parser)]
#[command(
    name = "protoindex",
    version = env!("CARGO_PKG_VERSION"),
    about = "Index .proto files and query their definitions",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory to index (overrides indexing.root)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Print single-line JSON
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create .protoindex/settings.toml in the current directory
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Index the tree and report what was found
    Index,

    /// Fuzzy search over names, comments, fields and RPCs
    #[command(after_help = "Examples:\n  protoindex search User\n  protoindex search \"account lifecycle\" --limit 5")]
    Search {
        query: String,

        /// Maximum number of results (overrides search.limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum score 0-100 (overrides search.min_score)
        #[arg(long)]
        min_score: Option<u32>,
    },

    /// Show a service and the types its RPCs reference
    Service {
        /// Full name, simple name or name suffix
        name: String,

        #[command(flatten)]
        resolution: ResolutionArgs,
    },

    /// Show a message and the types its fields reference
    Message {
        /// Full name, simple name or name suffix
        name: String,

        #[command(flatten)]
        resolution: ResolutionArgs,
    },

    /// Show an enum and its values
    Enum {
        /// Full name, simple name or name suffix
        name: String,
    },

    /// List RPCs whose request or response reaches a type
    Usages {
        /// Message or enum name
        type_name: String,
    },

    /// Counts of indexed files and definitions
    Stats,
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct ResolutionArgs {
    /// Skip resolving referenced types
    #[arg(long)]
    pub no_resolve: bool,

    /// Resolution depth (overrides resolution.max_depth)
    #[arg(short = 'd', long)]
    pub max_depth: Option<usize>,
}
