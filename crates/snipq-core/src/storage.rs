use crate::config::Settings;
use crate::error::{Result, SnipqError};
use crate::models::{Group, Snippet};
use crate::trigger::validate_trigger;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A snapshot of everything the vault holds
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Vault {
    pub settings: Settings,
    pub groups: Vec<Group>,
    pub snippets: Vec<Snippet>,
}

impl Vault {
    pub fn new(settings: Settings, groups: Vec<Group>, snippets: Vec<Snippet>) -> Self {
        Self {
            settings,
            groups,
            snippets,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;

        let mut group_ids = HashSet::new();
        for group in &self.groups {
            if group.id.trim().is_empty() {
                return Err(invalid("group id cannot be empty"));
            }
            if group.name.trim().is_empty() {
                return Err(invalid(format!("group '{}' has an empty name", group.id)));
            }
            if !group_ids.insert(group.id.as_str()) {
                return Err(invalid(format!("duplicate group '{}'", group.id)));
            }
        }

        let mut snippet_ids = HashSet::new();
        for snippet in &self.snippets {
            if snippet.id.trim().is_empty() {
                return Err(invalid("snippet id cannot be empty"));
            }
            let id = &snippet.id;
            if !snippet_ids.insert(id.as_str()) {
                return Err(invalid(format!("duplicate snippet '{}'", id)));
            }
            if snippet.name.trim().is_empty() {
                return Err(invalid(format!("snippet '{}' has an empty name", id)));
            }
            if !validate_trigger(&snippet.trigger) {
                return Err(invalid(format!(
                    "snippet '{}' has an empty trigger or one containing whitespace",
                    id
                )));
            }
            if snippet.template.trim().is_empty() {
                return Err(invalid(format!("snippet '{}' has an empty template", id)));
            }
            if !group_ids.contains(snippet.group_id.as_str()) {
                return Err(invalid(format!(
                    "snippet '{}' references unknown group '{}'",
                    id, snippet.group_id
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> SnipqError {
    SnipqError::InvalidVault(message.into())
}

/// Load and validate a vault snapshot from a JSON file
pub fn load_vault(path: &Path) -> Result<Vault> {
    if !path.exists() {
        return Err(SnipqError::VaultNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let content = fs::read_to_string(path)?;

    // Handle empty vault file
    if content.trim().is_empty() {
        return Ok(Vault::default());
    }

    let vault: Vault = serde_json::from_str(&content)?;
    vault.validate()?;
    debug!(
        path = %path.display(),
        groups = vault.groups.len(),
        snippets = vault.snippets.len(),
        "Loaded vault"
    );
    Ok(vault)
}
