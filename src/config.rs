//! Layered configuration.
//!
//! Sources, later ones winning:
//! - built-in defaults
//! - `.protoindex/settings.toml`, found by walking up from the current directory
//! - environment variables prefixed with `PROTOINDEX_`
//!
//! # Environment Variables
//!
//! Double underscores separate nested levels:
//! - `PROTOINDEX_SEARCH__MIN_SCORE=75` sets `search.min_score`
//! - `PROTOINDEX_RESOLUTION__MAX_DEPTH=3` sets `resolution.max_depth`
//! - `PROTOINDEX_INDEXING__ROOT=protos` sets `indexing.root`

use crate::search::ScorerKind;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Directory holding the settings file, relative to the workspace root.
pub const CONFIG_DIR: &str = ".protoindex";
pub const CONFIG_FILE: &str = "settings.toml";
pub const ENV_PREFIX: &str = "PROTOINDEX_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IndexingConfig {
    /// Directory indexed by CLI commands
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// File extensions treated as IDL sources, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Glob patterns excluded from directory walks
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    #[serde(default)]
    pub follow_links: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ResolutionConfig {
    /// Recursion limit for type resolution and usage walks
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Minimum score (0-100) for a hit to be returned
    #[serde(default = "default_min_score")]
    pub min_score: u32,

    /// Scorer for fully-qualified names
    #[serde(default = "default_name_scorer")]
    pub name_scorer: ScorerKind,

    /// Scorer for documentation comments
    #[serde(default = "default_comment_scorer")]
    pub comment_scorer: ScorerKind,

    /// Scorer for field and RPC names
    #[serde(default = "default_child_scorer")]
    pub child_scorer: ScorerKind,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Level applied to every target without an override
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `parser = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}
fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_extensions() -> Vec<String> {
    vec!["proto".to_string()]
}
fn default_max_depth() -> usize {
    10
}
fn default_limit() -> usize {
    20
}
fn default_min_score() -> u32 {
    60
}
fn default_name_scorer() -> ScorerKind {
    ScorerKind::Weighted
}
fn default_comment_scorer() -> ScorerKind {
    ScorerKind::Partial
}
fn default_child_scorer() -> ScorerKind {
    ScorerKind::Plain
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            indexing: IndexingConfig::default(),
            resolution: ResolutionConfig::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            extensions: default_extensions(),
            ignore_patterns: vec![
                "target/**".to_string(),
                "node_modules/**".to_string(),
                ".git/**".to_string(),
            ],
            follow_links: false,
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            min_score: default_min_score(),
            name_scorer: default_name_scorer(),
            comment_scorer: default_comment_scorer(),
            child_scorer: default_child_scorer(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration using a specific settings file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::layered(path.as_ref(), ENV_PREFIX)
            .extract()
            .map_err(Box::new)
    }

    fn layered(path: &Path, env_prefix: &str) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            // `__` separates nested levels, single `_` stays inside field names
            .merge(
                Env::prefixed(env_prefix)
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
    }

    /// Find `.protoindex/settings.toml` from the current directory upwards
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Directory containing `.protoindex`, if any ancestor has one
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Write a default settings file under `dir`. Returns its path.
    pub fn init_config_file(dir: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.indexing.extensions, vec!["proto"]);
        assert_eq!(settings.resolution.max_depth, 10);
        assert_eq!(settings.search.limit, 20);
        assert_eq!(settings.search.min_score, 60);
        assert_eq!(settings.search.name_scorer, ScorerKind::Weighted);
        assert_eq!(settings.logging.default, "warn");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
[search]
min_score = 80
comment_scorer = "weighted"

[logging.modules]
parser = "debug"
"#;
        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::layered(&config_path, "PROTOINDEX_TEST_PARTIAL_")
            .extract::<Settings>()
            .unwrap();

        assert_eq!(settings.search.min_score, 80);
        assert_eq!(settings.search.comment_scorer, ScorerKind::Weighted);
        assert_eq!(settings.logging.modules["parser"], "debug");

        // Untouched values fall back to defaults
        assert_eq!(settings.search.limit, 20);
        assert_eq!(settings.resolution.max_depth, 10);
        assert!(!settings.indexing.ignore_patterns.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(".protoindex").join("settings.toml");

        let mut settings = Settings::default();
        settings.resolution.max_depth = 3;
        settings.indexing.extensions = vec!["proto".to_string(), "idl".to_string()];
        settings.save(&config_path).unwrap();

        let loaded = Settings::layered(&config_path, "PROTOINDEX_TEST_SAVE_")
            .extract::<Settings>()
            .unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_environment_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(
            &config_path,
            "[resolution]\nmax_depth = 4\n\n[search]\nlimit = 5\n",
        )
        .unwrap();

        // A prefix no other test uses keeps this isolated from parallel tests
        unsafe {
            std::env::set_var("PROTOINDEX_TEST_LAYER_RESOLUTION__MAX_DEPTH", "7");
            std::env::set_var("PROTOINDEX_TEST_LAYER_SEARCH__MIN_SCORE", "90");
        }

        let settings = Settings::layered(&config_path, "PROTOINDEX_TEST_LAYER_")
            .extract::<Settings>()
            .unwrap();

        unsafe {
            std::env::remove_var("PROTOINDEX_TEST_LAYER_RESOLUTION__MAX_DEPTH");
            std::env::remove_var("PROTOINDEX_TEST_LAYER_SEARCH__MIN_SCORE");
        }

        assert_eq!(settings.resolution.max_depth, 7);
        assert_eq!(settings.search.min_score, 90);
        // File value survives where no variable is set
        assert_eq!(settings.search.limit, 5);
    }

    #[test]
    fn test_init_config_file_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();

        let path = Settings::init_config_file(temp_dir.path(), false).unwrap();
        assert!(path.ends_with(".protoindex/settings.toml"));
        assert!(Settings::init_config_file(temp_dir.path(), false).is_err());
        assert!(Settings::init_config_file(temp_dir.path(), true).is_ok());
    }
}
