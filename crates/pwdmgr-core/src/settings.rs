use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mask_password: bool,
    pub column_length: usize,
    pub max_password_file_backups: usize,
    pub show_debug: bool,
    pub pwgen_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mask_password: true,
            column_length: 10,
            max_password_file_backups: 10,
            show_debug: false,
            pwgen_length: 16,
        }
    }
}

impl Settings {
    pub const KEYS: [&'static str; 5] = [
        "mask_password",
        "column_length",
        "max_password_file_backups",
        "show_debug",
        "pwgen_length",
    ];

    /// Read settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)
            .with_context(|| format!("read settings {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parse settings {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("write settings {}", path.display()))?;
        Ok(())
    }

    /// Current values as `(key, value)` pairs, in [`Self::KEYS`] order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("mask_password", self.mask_password.to_string()),
            ("column_length", self.column_length.to_string()),
            (
                "max_password_file_backups",
                self.max_password_file_backups.to_string(),
            ),
            ("show_debug", self.show_debug.to_string()),
            ("pwgen_length", self.pwgen_length.to_string()),
        ]
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "mask_password" => self.mask_password = parse_bool(value)?,
            "show_debug" => self.show_debug = parse_bool(value)?,
            "column_length" => self.column_length = parse_number(key, value)?,
            "max_password_file_backups" => {
                self.max_password_file_backups = parse_number(key, value)?
            }
            "pwgen_length" => self.pwgen_length = parse_number(key, value)?,
            other => return Err(anyhow!("unknown setting {other:?}")),
        }
        Ok(())
    }
}

/// Accepts the same spellings the interactive prompts do.
pub fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "on" | "t" | "1" => Ok(true),
        "no" | "n" | "false" | "off" | "f" | "0" => Ok(false),
        other => Err(anyhow!("not a boolean: {other:?}")),
    }
}

fn parse_number(key: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .with_context(|| format!("{key} expects a non-negative integer, got {value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.max_password_file_backups, 10);
    }

    #[test]
    fn save_then_load_keeps_changes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut settings = Settings::default();
        settings.set("mask_password", "no").unwrap();
        settings.set("MAX_PASSWORD_FILE_BACKUPS", "3").unwrap();
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert!(!loaded.mask_password);
        assert_eq!(loaded.max_password_file_backups, 3);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"column_length": 20}"#).unwrap();
        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.column_length, 20);
        assert!(loaded.mask_password);
    }

    #[test]
    fn bad_keys_and_values_are_rejected() {
        let mut settings = Settings::default();
        assert!(settings.set("colour", "blue").is_err());
        assert!(settings.set("column_length", "-1").is_err());
        assert!(settings.set("show_debug", "maybe").is_err());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn entries_follow_key_order() {
        let keys: Vec<_> = Settings::default()
            .entries()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, Settings::KEYS);
    }
}
