//! Commands that index the tree and then query it.
//!
//! The index lives in memory, so each invocation rebuilds it from
//! `indexing.root` (or `--root`) before answering.

use crate::cli::args::ResolutionArgs;
use crate::config::Settings;
use crate::indexing::{FileWalker, ProtoIndexer};
use crate::io::{EntityType, Envelope, ResultCode, Status};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Build the index, or the error envelope explaining why it could not be built.
fn build_index(settings: Arc<Settings>, root: Option<PathBuf>) -> Result<ProtoIndexer, Envelope> {
    let root = root.unwrap_or_else(|| settings.indexing.root.clone());
    let indexer = ProtoIndexer::new(settings);

    indexer
        .index_directory(&root)
        .map_err(|e| Envelope::from_index_error(&e))?;
    Ok(indexer)
}

fn to_envelope<T: Serialize>(data: &T, entity_type: EntityType) -> Envelope {
    match serde_json::to_value(data) {
        Ok(value) => Envelope::success(value).with_entity_type(entity_type),
        Err(e) => Envelope::error(ResultCode::IndexError, e.to_string()),
    }
}

fn not_found(kind: &str, name: &str) -> Envelope {
    Envelope::not_found(format!("{kind} '{name}' not found"))
        .with_query(name)
        .with_hint(format!("Try 'protoindex search {name}'"))
}

pub fn run_index(settings: Arc<Settings>, root: Option<PathBuf>) -> Envelope {
    let root = root.unwrap_or_else(|| settings.indexing.root.clone());
    let started = Instant::now();
    let walker = FileWalker::new(Arc::clone(&settings));
    let indexer = ProtoIndexer::new(settings);

    let indexed = match indexer.index_directory(&root) {
        Ok(indexed) => indexed,
        Err(e) => return Envelope::from_index_error(&e),
    };

    let stats = indexer.get_stats();
    let discovered = walker.count_files(&root);
    let mut envelope = to_envelope(&stats, EntityType::Stats)
        .with_message(format!("Indexed {indexed} files under {}", root.display()))
        .with_duration_ms(started.elapsed().as_millis() as u64);

    if indexed < discovered {
        envelope = envelope
            .with_status(Status::PartialSuccess)
            .with_hint(format!(
                "{} files were skipped, run with RUST_LOG=indexer=warn to see why",
                discovered - indexed
            ));
    }
    envelope
}

pub fn run_search(
    settings: Arc<Settings>,
    root: Option<PathBuf>,
    query: &str,
    limit: Option<usize>,
    min_score: Option<u32>,
) -> Envelope {
    if query.trim().is_empty() {
        return Envelope::error(ResultCode::InvalidQuery, "Search query is empty");
    }

    let limit = limit.unwrap_or(settings.search.limit);
    let min_score = min_score.unwrap_or(settings.search.min_score);
    let indexer = match build_index(settings, root) {
        Ok(indexer) => indexer,
        Err(envelope) => return envelope,
    };

    let results = indexer.search(query, limit, min_score);
    if results.is_empty() {
        return Envelope::not_found(format!("No matches for '{query}'"))
            .with_query(query)
            .with_hint("Lower --min-score or try a shorter query");
    }

    let count = results.len();
    to_envelope(&results, EntityType::SearchResult)
        .with_count(count)
        .with_query(query)
}

pub fn run_service(
    settings: Arc<Settings>,
    root: Option<PathBuf>,
    name: &str,
    resolution: ResolutionArgs,
) -> Envelope {
    let depth = resolution
        .max_depth
        .unwrap_or(settings.resolution.max_depth);
    let indexer = match build_index(settings, root) {
        Ok(indexer) => indexer,
        Err(envelope) => return envelope,
    };

    match indexer.get_service(name, !resolution.no_resolve, depth) {
        Some(service) => to_envelope(&service, EntityType::Service)
            .with_query(name)
            .with_depth(depth),
        None => not_found("Service", name),
    }
}

pub fn run_message(
    settings: Arc<Settings>,
    root: Option<PathBuf>,
    name: &str,
    resolution: ResolutionArgs,
) -> Envelope {
    let depth = resolution
        .max_depth
        .unwrap_or(settings.resolution.max_depth);
    let indexer = match build_index(settings, root) {
        Ok(indexer) => indexer,
        Err(envelope) => return envelope,
    };

    match indexer.get_message(name, !resolution.no_resolve, depth) {
        Some(message) => to_envelope(&message, EntityType::Message)
            .with_query(name)
            .with_depth(depth),
        None => not_found("Message", name),
    }
}

pub fn run_enum(settings: Arc<Settings>, root: Option<PathBuf>, name: &str) -> Envelope {
    let indexer = match build_index(settings, root) {
        Ok(indexer) => indexer,
        Err(envelope) => return envelope,
    };

    match indexer.get_enum(name) {
        Some(proto_enum) => to_envelope(&proto_enum, EntityType::Enum).with_query(name),
        None => not_found("Enum", name),
    }
}

pub fn run_usages(settings: Arc<Settings>, root: Option<PathBuf>, type_name: &str) -> Envelope {
    let indexer = match build_index(settings, root) {
        Ok(indexer) => indexer,
        Err(envelope) => return envelope,
    };

    match indexer.find_type_usages(type_name) {
        Some(usages) => {
            let count = usages.len();
            to_envelope(&usages, EntityType::TypeUsage)
                .with_count(count)
                .with_query(type_name)
        }
        None => not_found("Type", type_name),
    }
}

pub fn run_stats(settings: Arc<Settings>, root: Option<PathBuf>) -> Envelope {
    match build_index(settings, root) {
        Ok(indexer) => to_envelope(&indexer.get_stats(), EntityType::Stats),
        Err(envelope) => envelope,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn workspace() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("users.proto"),
            r#"
package api.v1;
service UserService { rpc GetUser(GetUserRequest) returns (User); }
message GetUserRequest { string id = 1; }
message User { string name = 1; UserRole role = 2; }
enum UserRole { ADMIN = 0; MEMBER = 1; }
"#,
        )
        .unwrap();
        temp_dir
    }

    fn run_with_root(temp_dir: &TempDir) -> Option<PathBuf> {
        Some(temp_dir.path().to_path_buf())
    }

    #[test]
    fn test_message_envelope() {
        let temp_dir = workspace();
        let envelope = run_message(
            Arc::new(Settings::default()),
            run_with_root(&temp_dir),
            "User",
            ResolutionArgs {
                no_resolve: false,
                max_depth: None,
            },
        );

        assert_eq!(envelope.exit_code, 0);
        assert_eq!(envelope.meta.depth, Some(10));
        let data = envelope.data.unwrap();
        assert_eq!(data["full_name"], "api.v1.User");
        assert_eq!(data["resolved_types"]["UserRole"]["kind"], "enum");
    }

    #[test]
    fn test_unknown_names_exit_with_one() {
        let temp_dir = workspace();
        let settings = Arc::new(Settings::default());

        let envelope = run_enum(Arc::clone(&settings), run_with_root(&temp_dir), "Missing");
        assert_eq!(envelope.exit_code, 1);
        assert_eq!(envelope.code, ResultCode::NotFound);

        let envelope = run_usages(settings, run_with_root(&temp_dir), "Missing");
        assert_eq!(envelope.exit_code, 1);
    }

    #[test]
    fn test_usages_envelope_counts() {
        let temp_dir = workspace();
        let envelope = run_usages(
            Arc::new(Settings::default()),
            run_with_root(&temp_dir),
            "UserRole",
        );

        assert_eq!(envelope.exit_code, 0);
        assert_eq!(envelope.meta.count, Some(1));
        let data = envelope.data.unwrap();
        assert_eq!(data[0]["rpc"], "GetUser");
        assert_eq!(data[0]["context"], "Response");
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let envelope = run_stats(
            Arc::new(Settings::default()),
            Some(PathBuf::from("/definitely/not/here")),
        );
        assert_eq!(envelope.exit_code, 2);
        assert_eq!(envelope.code, ResultCode::IndexError);
    }

    #[test]
    fn test_empty_search_query_is_rejected() {
        let envelope = run_search(Arc::new(Settings::default()), None, "  ", None, None);
        assert_eq!(envelope.code, ResultCode::InvalidQuery);
    }

    #[test]
    fn test_partial_index_is_flagged() {
        let temp_dir = workspace();
        fs::write(temp_dir.path().join("broken.proto"), "message A { /* open").unwrap();

        let envelope = run_index(Arc::new(Settings::default()), run_with_root(&temp_dir));
        assert_eq!(envelope.status, Status::PartialSuccess);
        assert_eq!(envelope.data.unwrap()["file_count"], 1);
    }
}
