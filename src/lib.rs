pub mod cli;
pub mod config;
pub mod error;
pub mod indexing;
pub mod io;
pub mod logging;
pub mod parsing;
pub mod search;
pub mod types;

pub use config::Settings;
pub use error::{IndexError, IndexResult};
pub use indexing::{
    EnumView, IndexStats, MessageView, ProtoIndexer, ResolvedDefinition, ServiceView, TypeUsage,
    UsageContext,
};
pub use parsing::{ParseError, ProtoFile, parse};
pub use search::{MatchType, Scorer, ScorerKind, SearchEngine, SearchResult};
pub use types::{EntityKind, Label, Range};
