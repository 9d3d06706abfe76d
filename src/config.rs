use directories::BaseDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::client::DEFAULT_BRIDGE_URL;
use crate::api::models::ChatSort;
use crate::error::ConfigError;

const CONFIG_FILE: &str = "whatsapp-harness.toml";
const DEFAULT_MESSAGES_DB: &str = "../whatsapp-bridge/store/messages.db";

/// Defaults the harness wrappers fall back to when an argument is not given.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarnessSettings {
    pub sample_query: String,
    pub limit: usize,
    pub page: usize,
    pub sort_by: ChatSort,
    pub include_last_message: bool,
    pub list_context_before: usize,
    pub list_context_after: usize,
    pub context_before: usize,
    pub context_after: usize,
    pub run_all_chat_limit: usize,
    pub run_all_message_limit: usize,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            sample_query: "papa".into(),
            limit: 5,
            page: 0,
            sort_by: ChatSort::LastActive,
            include_last_message: true,
            list_context_before: 1,
            list_context_after: 1,
            context_before: 3,
            context_after: 3,
            run_all_chat_limit: 3,
            run_all_message_limit: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub bridge_url: String,
    pub messages_db: PathBuf,
    pub harness: HarnessSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bridge_url: DEFAULT_BRIDGE_URL.into(),
            messages_db: PathBuf::from(DEFAULT_MESSAGES_DB),
            harness: HarnessSettings::default(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join(CONFIG_FILE))
    }

    /// Loads `path` when given; otherwise the per-user config file if present,
    /// falling back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            Some(path) => {
                debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => {
                warn!("no config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str::<Config>(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "messages_db = \"/srv/bridge/messages.db\"\n\n[harness]\nsample_query = \"mom\"\nlimit = 10\nsort_by = \"name\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.messages_db, PathBuf::from("/srv/bridge/messages.db"));
        assert_eq!(config.bridge_url, DEFAULT_BRIDGE_URL);
        assert_eq!(config.harness.sample_query, "mom");
        assert_eq!(config.harness.limit, 10);
        assert_eq!(config.harness.sort_by, ChatSort::Name);
        assert_eq!(config.harness.context_before, 3);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "limit = [").unwrap();
        assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn defaults_match_harness_samples() {
        let settings = HarnessSettings::default();
        assert_eq!(settings.sample_query, "papa");
        assert_eq!(settings.limit, 5);
        assert_eq!((settings.context_before, settings.context_after), (3, 3));
    }
}
