//! ProtoIndexer - the public entry point for indexing and queries.
//!
//! ## Architecture
//!
//! ```text
//! ProtoIndexer
//!   ├── SymbolIndex (Arc<RwLock>) - tables and search entries
//!   ├── SearchEngine - scorers picked from settings
//!   └── Settings (Arc) - walker, depth and search defaults
//! ```
//!
//! Parsing happens before the write lock is taken. Queries hold the read lock
//! while they copy results into owned views.
//!
//! ## Usage
//!
//! ```ignore
//! let indexer = ProtoIndexer::new(Arc::new(Settings::default()));
//! indexer.index_directory(Path::new("protos"))?;
//! let user = indexer.get_message("User", true, 10);
//! ```

use super::index::{IndexStats, SymbolIndex};
use super::resolver::TypeResolver;
use super::usages::{TypeUsage, UsageFinder};
use super::views::{EnumView, MessageView, ServiceView};
use super::walker::FileWalker;
use crate::config::Settings;
use crate::error::{IndexError, IndexResult};
use crate::parsing::parse;
use crate::search::{SearchEngine, SearchResult};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

pub struct ProtoIndexer {
    index: Arc<RwLock<SymbolIndex>>,
    engine: SearchEngine,
    settings: Arc<Settings>,
}

impl Default for ProtoIndexer {
    fn default() -> Self {
        Self::new(Arc::new(Settings::default()))
    }
}

impl ProtoIndexer {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            index: Arc::new(RwLock::new(SymbolIndex::new())),
            engine: SearchEngine::new(&settings.search),
            settings,
        }
    }

    /// Replace the search engine, e.g. to plug in custom scorers.
    pub fn with_search_engine(mut self, engine: SearchEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Index every matching file under `root`. Files that cannot be read or
    /// parsed are logged and skipped. Returns the number indexed.
    pub fn index_directory(&self, root: &Path) -> IndexResult<usize> {
        if !root.is_dir() {
            return Err(IndexError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let walker = FileWalker::new(Arc::clone(&self.settings));
        let mut indexed = 0;
        let mut failed = 0;

        for path in walker.walk(root) {
            match self.index_file(&path) {
                Ok(()) => indexed += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(target: "indexer", "skipping {}: {e}", path.display());
                }
            }
        }

        crate::log_event!(
            "indexer",
            "indexed",
            "{indexed} files under {} ({failed} skipped)",
            root.display()
        );
        Ok(indexed)
    }

    /// Index one file, replacing whatever an earlier version of it contributed.
    pub fn index_file(&self, path: &Path) -> IndexResult<()> {
        let source = std::fs::read_to_string(path).map_err(|source| IndexError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file = parse(&source, path).map_err(|source| IndexError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut index = self.index.write();
        if index.evict(path).is_some() {
            crate::debug_event!("indexer", "reindex", "{}", path.display());
        }
        index.ingest(Arc::new(file));
        Ok(())
    }

    /// Forget a file. Returns `false` if it was never indexed.
    pub fn remove_file(&self, path: &Path) -> bool {
        let removed = self.index.write().evict(path).is_some();
        if removed {
            crate::debug_event!("indexer", "removed", "{}", path.display());
        }
        removed
    }

    pub fn search(&self, query: &str, limit: usize, min_score: u32) -> Vec<SearchResult> {
        let index = self.index.read();
        self.engine.search(index.entries(), query, limit, min_score)
    }

    /// Search with the configured limit and minimum score.
    pub fn search_default(&self, query: &str) -> Vec<SearchResult> {
        let search = &self.settings.search;
        self.search(query, search.limit, search.min_score)
    }

    /// Service by full name, else by simple name or name suffix.
    pub fn get_service(
        &self,
        name: &str,
        resolve_types: bool,
        max_depth: usize,
    ) -> Option<ServiceView> {
        let index = self.index.read();
        let entry = index.find_service(name)?;
        let resolved = if resolve_types {
            TypeResolver::new(&index).resolve_service(&entry.item, max_depth)
        } else {
            IndexMap::new()
        };
        Some(ServiceView::new(entry, resolved))
    }

    /// Message by full name, else by simple name or name suffix.
    pub fn get_message(
        &self,
        name: &str,
        resolve_types: bool,
        max_depth: usize,
    ) -> Option<MessageView> {
        let index = self.index.read();
        let entry = index.find_message(name)?;
        let resolved = if resolve_types {
            TypeResolver::new(&index).resolve_message(&entry.item, max_depth)
        } else {
            IndexMap::new()
        };
        Some(MessageView::new(entry, resolved))
    }

    pub fn get_enum(&self, name: &str) -> Option<EnumView> {
        let index = self.index.read();
        index.find_enum(name).map(EnumView::from)
    }

    /// RPCs whose request or response reaches the named message or enum.
    /// `None` when the type is not indexed.
    pub fn find_type_usages(&self, type_name: &str) -> Option<Vec<TypeUsage>> {
        let index = self.index.read();
        UsageFinder::new(&index, self.settings.resolution.max_depth).find(type_name)
    }

    pub fn get_stats(&self) -> IndexStats {
        self.index.read().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_index_file_replaces_previous_version() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.proto");
        let indexer = ProtoIndexer::default();

        fs::write(&path, "package p; message Old { int32 a = 1; }").unwrap();
        indexer.index_file(&path).unwrap();
        fs::write(&path, "package p; message New { int32 a = 1; }").unwrap();
        indexer.index_file(&path).unwrap();

        assert!(indexer.get_message("p.Old", false, 0).is_none());
        assert!(indexer.get_message("p.New", false, 0).is_some());
        assert_eq!(indexer.get_stats().file_count, 1);
        assert_eq!(indexer.get_stats().entry_count, 1);
    }

    #[test]
    fn test_index_file_is_strict() {
        let temp_dir = TempDir::new().unwrap();
        let indexer = ProtoIndexer::default();

        let missing = indexer.index_file(&temp_dir.path().join("missing.proto"));
        assert!(matches!(missing, Err(IndexError::FileRead { .. })));

        let broken = temp_dir.path().join("broken.proto");
        fs::write(&broken, "message A { string s = 1 [default = \"open];\n}").unwrap();
        assert!(matches!(indexer.index_file(&broken), Err(IndexError::Parse { .. })));
        assert_eq!(indexer.get_stats(), IndexStats::default());
    }

    #[test]
    fn test_missing_directory() {
        let indexer = ProtoIndexer::default();
        let result = indexer.index_directory(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(IndexError::DirectoryNotFound { .. })));
    }

    #[test]
    fn test_remove_unknown_file_is_noop() {
        let indexer = ProtoIndexer::default();
        assert!(!indexer.remove_file(Path::new("nothing.proto")));
        assert_eq!(indexer.get_stats(), IndexStats::default());
    }

    #[test]
    fn test_lookup_misses_are_none() {
        let indexer = ProtoIndexer::default();
        assert!(indexer.get_service("Nope", true, 10).is_none());
        assert!(indexer.get_message("Nope", true, 10).is_none());
        assert!(indexer.get_enum("Nope").is_none());
        assert!(indexer.find_type_usages("Nope").is_none());
        assert!(indexer.search_default("Nope").is_empty());
    }
}
