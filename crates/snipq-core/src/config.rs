use crate::error::{Result, SnipqError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_PREFIX: &str = ":";
pub const VAULT_FILENAME: &str = "vault.json";
pub const PORT_FILENAME: &str = "api_port.txt";
pub const VAULT_ENV: &str = "SNIPQ_VAULT";
pub const DEFAULT_HISTORY_LIMIT: usize = 200;
pub const MAX_HISTORY_LIMIT: usize = 10_000;

/// Process-wide settings. The engine reads them, never mutates them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub prefix: String,
    pub expand_key: String,
    pub strict_boundaries: bool,
    pub excluded_apps: BTreeSet<String>,
    pub locale: String,
    pub default_date_format: String,
    pub timezone: String,
    pub history_enabled: bool,
    pub history_limit: usize,
    pub pin_for_sensitive: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            expand_key: "Tab".to_string(),
            strict_boundaries: true,
            excluded_apps: BTreeSet::new(),
            locale: "en-US".to_string(),
            default_date_format: "2006-01-02".to_string(),
            timezone: "Local".to_string(),
            history_enabled: true,
            history_limit: DEFAULT_HISTORY_LIMIT,
            pin_for_sensitive: true,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.prefix.trim().is_empty() {
            return Err(SnipqError::InvalidConfig(
                "prefix cannot be empty".to_string(),
            ));
        }
        if self.history_limit > MAX_HISTORY_LIMIT {
            return Err(SnipqError::InvalidConfig(format!(
                "history limit cannot exceed {}",
                MAX_HISTORY_LIMIT
            )));
        }
        Ok(())
    }

    pub fn is_app_excluded(&self, app_id: &str) -> bool {
        self.excluded_apps.contains(app_id)
    }
}

/// Get the snipq configuration directory
pub fn get_config_dir() -> PathBuf {
    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".snipq"))
        .unwrap_or_else(|_| PathBuf::from(".snipq"))
}

/// Get the path to the vault file, honouring `SNIPQ_VAULT`
pub fn get_vault_file_path() -> PathBuf {
    match env::var(VAULT_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => get_config_dir().join(VAULT_FILENAME),
    }
}

/// Get the path to the file holding the API server port
pub fn get_port_file_path() -> PathBuf {
    get_config_dir().join(PORT_FILENAME)
}
