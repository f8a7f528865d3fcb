//! Directory traversal for IDL sources.
//!
//! Honors `.gitignore` (even outside a git repository), configured ignore
//! globs and the configured extension list. Hidden files are skipped.

use crate::config::Settings;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Walks directories to find files to index
pub struct FileWalker {
    settings: Arc<Settings>,
}

impl FileWalker {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Files under `root` that should be indexed, in walk order
    pub fn walk(&self, root: &Path) -> impl Iterator<Item = PathBuf> + use<> {
        let indexing = &self.settings.indexing;
        let mut builder = WalkBuilder::new(root);

        builder
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(indexing.follow_links)
            .max_depth(None)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b));

        // Overrides are whitelists by default, so patterns go in negated
        let mut override_builder = ignore::overrides::OverrideBuilder::new(root);
        for pattern in &indexing.ignore_patterns {
            if let Err(e) = override_builder.add(&format!("!{pattern}")) {
                tracing::warn!(target: "indexer", "invalid ignore pattern '{pattern}': {e}");
            }
        }

        match override_builder.build() {
            Ok(overrides) => {
                builder.overrides(overrides);
            }
            Err(e) => tracing::warn!(target: "indexer", "ignore patterns disabled: {e}"),
        }

        let extensions = indexing.extensions.clone();

        builder
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .filter_map(move |entry| {
                let path = entry.path();

                let hidden = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with('.'));
                if hidden {
                    return None;
                }

                let matches = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext));

                matches.then(|| path.to_path_buf())
            })
    }

    /// Number of files a walk of `root` would yield
    pub fn count_files(&self, root: &Path) -> usize {
        self.walk(root).count()
    }
}
