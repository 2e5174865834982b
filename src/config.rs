use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::sheets::DEFAULT_SPREADSHEET;

const APP_NAME: &str = "wlog";
const CONFIG_FILE: &str = "config.json";

pub const BACKEND_ENV: &str = "WLOG_BACKEND";
pub const DB_PATH_ENV: &str = "WLOG_DB_PATH";
pub const SPREADSHEET_ENV: &str = "WLOG_SPREADSHEET";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Sheets,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "sheets" | "gsheets" => Ok(Self::Sheets),
            other => anyhow::bail!("Unknown backend '{}', expected sqlite or sheets", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    /// SQLite file. Defaults to `wlog.db` in the platform data directory.
    pub database_path: Option<PathBuf>,
    /// Document name of the spreadsheet
    pub spreadsheet_name: String,
    /// Directory searched for a service account file. Defaults to the working directory.
    pub credential_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            database_path: None,
            spreadsheet_name: DEFAULT_SPREADSHEET.to_string(),
            credential_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from the user's config directory, then apply
    /// environment overrides. A missing file means defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&get_config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;

        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Applies `WLOG_*` overrides looked up through `var`.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(backend) = var(BACKEND_ENV) {
            self.backend = backend
                .parse()
                .with_context(|| format!("Invalid {}", BACKEND_ENV))?;
        }
        if let Some(path) = var(DB_PATH_ENV) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(name) = var(SPREADSHEET_ENV) {
            self.spreadsheet_name = name;
        }
        Ok(())
    }

    pub fn credential_dir(&self) -> PathBuf {
        self.credential_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();

        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.spreadsheet_name, "WLog_DB");
        assert!(config.database_path.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"backend": "sheets"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.backend, Backend::Sheets);
        assert_eq!(config.spreadsheet_name, "WLog_DB");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ backend = sheets").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn environment_overrides_file() {
        let vars: HashMap<&str, &str> = [
            (BACKEND_ENV, "Sheets"),
            (DB_PATH_ENV, "/tmp/w.db"),
            (SPREADSHEET_ENV, "Training"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.backend, Backend::Sheets);
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/w.db")));
        assert_eq!(config.spreadsheet_name, "Training");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| (key == BACKEND_ENV).then(|| "excel".to_string()));
        assert!(result.is_err());
    }
}
