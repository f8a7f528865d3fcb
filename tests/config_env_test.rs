//! Settings files and environment variables feeding the indexer

use protoindex::{ProtoIndexer, ScorerKind, Settings};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_settings_file_drives_walker() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.toml");
    fs::write(
        &config_path,
        r#"
[indexing]
extensions = ["idl"]
ignore_patterns = ["generated/**"]

[search]
child_scorer = "partial"
"#,
    )
    .unwrap();

    let protos = temp_dir.path().join("protos");
    fs::create_dir_all(protos.join("generated")).unwrap();
    fs::write(protos.join("api.idl"), "package api; message Kept { string id = 1; }").unwrap();
    fs::write(protos.join("api.proto"), "package api; message WrongExt {}").unwrap();
    fs::write(protos.join("generated/out.idl"), "package api; message Generated {}").unwrap();

    let settings = Settings::load_from(&config_path).unwrap();
    assert_eq!(settings.search.child_scorer, ScorerKind::Partial);

    let indexer = ProtoIndexer::new(Arc::new(settings));
    assert_eq!(indexer.index_directory(&protos).unwrap(), 1);
    assert!(indexer.get_message("api.Kept", false, 0).is_some());
    assert!(indexer.get_message("api.WrongExt", false, 0).is_none());
    assert!(indexer.get_message("api.Generated", false, 0).is_none());
}

#[test]
fn test_environment_overrides_settings_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.toml");
    fs::write(&config_path, "[resolution]\nmax_depth = 2\n").unwrap();

    unsafe {
        std::env::set_var("PROTOINDEX_RESOLUTION__MAX_DEPTH", "6");
        std::env::set_var("PROTOINDEX_SEARCH__NAME_SCORER", "plain");
    }
    let settings = Settings::load_from(&config_path);
    unsafe {
        std::env::remove_var("PROTOINDEX_RESOLUTION__MAX_DEPTH");
        std::env::remove_var("PROTOINDEX_SEARCH__NAME_SCORER");
    }

    let settings = settings.unwrap();
    assert_eq!(settings.resolution.max_depth, 6);
    assert_eq!(settings.search.name_scorer, ScorerKind::Plain);
}

#[test]
fn test_missing_settings_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings = Settings::load_from(temp_dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.search.limit, 20);
    assert_eq!(settings.indexing.extensions, ["proto"]);
}
