//! Per-channel command switches and per-guild prefixes, persisted in `channel_toggles.json`.
use std::collections::{BTreeSet, HashMap};

use log::info;
use serde::{Deserialize, Serialize};

use super::command::TOGGLEABLE;
use crate::config::MAX_PREFIX_LEN;
use crate::errors::{StoreError, ToggleError};
use crate::storage::{self, JsonStore, TOGGLES_DOC};

pub const TOGGLES_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TogglesDocument {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub disabled: HashMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub prefixes: HashMap<String, String>,
}

impl TogglesDocument {
    /// Drop empty channel entries and names that no longer match a toggleable command.
    pub fn migrate(&mut self) -> usize {
        let mut touched = 0;
        for names in self.disabled.values_mut() {
            let before = names.len();
            names.retain(|n| TOGGLEABLE.contains(&n.as_str()));
            touched += before - names.len();
        }
        let before = self.disabled.len();
        self.disabled.retain(|_, names| !names.is_empty());
        touched += before - self.disabled.len();
        if self.version != TOGGLES_VERSION {
            self.version = TOGGLES_VERSION;
            touched += 1;
        }
        touched
    }
}

#[derive(Debug)]
pub struct ChannelToggles {
    doc: TogglesDocument,
    store: Option<JsonStore>,
}

impl ChannelToggles {
    pub fn open(store: JsonStore) -> Result<Self, StoreError> {
        let mut doc: TogglesDocument = store.load(TOGGLES_DOC)?;
        let touched = doc.migrate();
        let toggles = Self {
            doc,
            store: Some(store),
        };
        if touched > 0 {
            toggles.persist();
        }
        Ok(toggles)
    }

    pub fn in_memory() -> Self {
        Self {
            doc: TogglesDocument {
                version: TOGGLES_VERSION,
                ..TogglesDocument::default()
            },
            store: None,
        }
    }

    fn persist(&self) {
        storage::persist(self.store.as_ref(), TOGGLES_DOC, &self.doc);
    }

    /// Disable `name` in a channel. Returns `false` when it already was.
    pub fn disable(&mut self, channel_id: &str, name: &str) -> Result<bool, ToggleError> {
        check_toggleable(name)?;
        let added = self
            .doc
            .disabled
            .entry(channel_id.to_string())
            .or_default()
            .insert(name.to_string());
        if added {
            self.persist();
            info!(target: "security", "toggles: disabled {} in {}", name, channel_id);
        }
        Ok(added)
    }

    /// Re-enable `name` in a channel. Returns `false` when it was not disabled.
    pub fn enable(&mut self, channel_id: &str, name: &str) -> Result<bool, ToggleError> {
        check_toggleable(name)?;
        let Some(names) = self.doc.disabled.get_mut(channel_id) else {
            return Ok(false);
        };
        let removed = names.remove(name);
        if names.is_empty() {
            self.doc.disabled.remove(channel_id);
        }
        if removed {
            self.persist();
            info!(target: "security", "toggles: enabled {} in {}", name, channel_id);
        }
        Ok(removed)
    }

    pub fn is_disabled(&self, channel_id: &str, name: &str) -> bool {
        self.doc
            .disabled
            .get(channel_id)
            .is_some_and(|names| names.contains(name))
    }

    pub fn disabled_in(&self, channel_id: &str) -> Vec<String> {
        self.doc
            .disabled
            .get(channel_id)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn set_prefix(&mut self, guild_id: &str, prefix: &str) -> Result<(), ToggleError> {
        if prefix.is_empty()
            || prefix.chars().count() > MAX_PREFIX_LEN
            || prefix.contains(char::is_whitespace)
        {
            return Err(ToggleError::InvalidPrefix {
                max: MAX_PREFIX_LEN,
            });
        }
        self.doc
            .prefixes
            .insert(guild_id.to_string(), prefix.to_string());
        self.persist();
        info!(target: "security", "toggles: prefix for {} set to '{}'", guild_id, prefix);
        Ok(())
    }

    pub fn reset_prefix(&mut self, guild_id: &str) -> bool {
        let removed = self.doc.prefixes.remove(guild_id).is_some();
        if removed {
            self.persist();
        }
        removed
    }

    pub fn prefix_for<'a>(&'a self, guild_id: &str, default: &'a str) -> &'a str {
        self.doc
            .prefixes
            .get(guild_id)
            .map(String::as_str)
            .unwrap_or(default)
    }
}

fn check_toggleable(name: &str) -> Result<(), ToggleError> {
    if TOGGLEABLE.contains(&name) {
        Ok(())
    } else if matches!(name, "disable" | "enable" | "disabled" | "prefix") {
        Err(ToggleError::Protected(name.to_string()))
    } else {
        Err(ToggleError::UnknownCommand(name.to_string()))
    }
}
