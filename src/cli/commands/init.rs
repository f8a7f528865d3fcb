//! Init and Config commands.

use crate::config::Settings;
use crate::io::{EntityType, Envelope, ResultCode};

/// Create `.protoindex/settings.toml` in the current directory.
pub fn run_init(force: bool) -> Envelope {
    let dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => return Envelope::error(ResultCode::ConfigError, e.to_string()),
    };

    match Settings::init_config_file(&dir, force) {
        Ok(path) => {
            crate::log_event!("cli", "init", "{}", path.display());
            Envelope::success(serde_json::json!({ "path": path }))
                .with_message(format!("Created configuration file at {}", path.display()))
                .with_hint("Edit this file to customize your settings")
        }
        Err(e) => Envelope::error(ResultCode::ConfigError, e.to_string())
            .with_hint("Use --force to overwrite"),
    }
}

/// Current configuration after all layers are merged.
pub fn run_config(settings: &Settings) -> Envelope {
    match serde_json::to_value(settings) {
        Ok(value) => Envelope::success(value).with_entity_type(EntityType::Settings),
        Err(e) => Envelope::error(ResultCode::ConfigError, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Status;

    #[test]
    fn test_config_envelope_contains_sections() {
        let envelope = run_config(&Settings::default());
        assert_eq!(envelope.status, Status::Success);

        let data = envelope.data.unwrap();
        assert_eq!(data["resolution"]["max_depth"], 10);
        assert_eq!(data["search"]["name_scorer"], "weighted");
    }
}
