//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{anyhow, bail, Result};
use std::path::Path;

/// Run the config command against the file at `config_path`.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = set_value(&settings, key, value)?;
            updated.save_to(&config_path.to_path_buf())?;
            Output::success(&format!("Set {} = {}", key, value));
        }

        ConfigAction::Edit => {
            // Create default config if it doesn't exist
            if !config_path.exists() {
                settings.save_to(&config_path.to_path_buf())?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Return a copy of `settings` with the dotted `key` set to `value`.
///
/// The value is read as a TOML literal (`500`, `true`, `"x"`), falling back to
/// a plain string, and the result must still deserialize into [`Settings`].
fn set_value(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let mut root = toml::Value::try_from(settings)?;

    let parts: Vec<&str> = key.split('.').map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        bail!("Invalid key: {}", key);
    }
    let (last, sections) = parts
        .split_last()
        .ok_or_else(|| anyhow!("Invalid key: {}", key))?;

    let mut table = root
        .as_table_mut()
        .ok_or_else(|| anyhow!("Configuration is not a table"))?;
    for section in sections {
        table = table
            .get_mut(*section)
            .and_then(toml::Value::as_table_mut)
            .ok_or_else(|| anyhow!("Unknown config section: {}", section))?;
    }
    if sections.is_empty() {
        bail!("Key must name a setting inside a section, e.g. chat.model");
    }

    table.insert(last.to_string(), parse_value(value));

    let updated = root
        .try_into::<Settings>()
        .map_err(|e| anyhow!("Invalid value for {}: {}", key, e))?;

    // Unknown keys are dropped by deserialization, so they never reach the output.
    let written = toml::Value::try_from(&updated)?;
    if parts.iter().try_fold(&written, |v, p| v.get(*p)).is_none() {
        bail!("Unknown config key: {}", key);
    }
    Ok(updated)
}

fn parse_value(value: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {}", value))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_typed_values() {
        let settings = Settings::default();

        let updated = set_value(&settings, "chat.model", "gemini-1.5-flash").unwrap();
        assert_eq!(updated.chat.model, "gemini-1.5-flash");

        let updated = set_value(&updated, "server.port", "8080").unwrap();
        assert_eq!(updated.server.port, 8080);
        assert_eq!(updated.chat.model, "gemini-1.5-flash");

        let updated = set_value(&updated, "store.provider", "memory").unwrap();
        assert_eq!(updated.store.provider, crate::config::StoreProvider::Memory);
    }

    #[test]
    fn test_set_rejects_bad_keys_and_values() {
        let settings = Settings::default();
        assert!(set_value(&settings, "nope.model", "x").is_err());
        assert!(set_value(&settings, "chat", "x").is_err());
        assert!(set_value(&settings, "server.port", "not-a-port").is_err());
        assert!(set_value(&settings, "chat..model", "x").is_err());
    }

    #[test]
    fn test_set_rejects_misspelled_key() {
        let settings = Settings::default();
        let err = set_value(&settings, "chat.modle", "x").unwrap_err();
        assert!(err.to_string().contains("Unknown config key"));
        assert!(set_value(&settings, "server.prot", "8080").is_err());
    }

    #[test]
    fn test_set_optional_key() {
        let settings = Settings::default();
        assert!(settings.chat.system_prompt.is_none());

        let updated = set_value(&settings, "chat.system_prompt", "Be brief.").unwrap();
        assert_eq!(updated.chat.system_prompt.as_deref(), Some("Be brief."));

        let updated = set_value(&updated, "general.log_level", "debug").unwrap();
        assert_eq!(updated.general.log_level, "debug");
    }

    #[test]
    fn test_set_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        run_config(
            &ConfigAction::Set {
                key: "speech.voice".to_string(),
                value: "nova".to_string(),
            },
            Settings::default(),
            &path,
        )
        .unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.speech.voice, "nova");
    }
}
