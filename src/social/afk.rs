//! Away-from-keyboard notes, persisted in `afk.json`.
//!
//! A note is set by the user, cleared by their next message and shown to anyone who
//! mentions them in the meantime.

use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::StoreError;
use crate::storage::{self, JsonStore, AFK_DOC};

pub const AFK_VERSION: u32 = 1;
/// Reasons longer than this are cut.
pub const MAX_AFK_REASON: usize = 200;
pub const DEFAULT_AFK_REASON: &str = "AFK";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AfkRecord {
    pub reason: String,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AfkDocument {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub users: HashMap<String, AfkRecord>,
}

impl AfkDocument {
    /// Replace blank reasons with the default one.
    pub fn migrate(&mut self) -> usize {
        let mut touched = 0;
        for record in self.users.values_mut() {
            if record.reason.trim().is_empty() {
                record.reason = DEFAULT_AFK_REASON.to_string();
                touched += 1;
            }
        }
        if self.version != AFK_VERSION {
            self.version = AFK_VERSION;
            touched += 1;
        }
        touched
    }
}

#[derive(Debug)]
pub struct AfkBoard {
    doc: AfkDocument,
    store: Option<JsonStore>,
}

impl AfkBoard {
    pub fn open(store: JsonStore) -> Result<Self, StoreError> {
        let mut doc: AfkDocument = store.load(AFK_DOC)?;
        let touched = doc.migrate();
        let board = Self {
            doc,
            store: Some(store),
        };
        if touched > 0 {
            board.persist();
        }
        Ok(board)
    }

    pub fn in_memory() -> Self {
        Self {
            doc: AfkDocument {
                version: AFK_VERSION,
                ..AfkDocument::default()
            },
            store: None,
        }
    }

    fn persist(&self) {
        storage::persist(self.store.as_ref(), AFK_DOC, &self.doc);
    }

    /// Mark `user_id` as away, replacing any earlier note.
    pub fn set(&mut self, user_id: &str, reason: Option<&str>, now: DateTime<Utc>) -> &AfkRecord {
        let reason = match reason.map(str::trim) {
            Some(r) if !r.is_empty() => r.chars().take(MAX_AFK_REASON).collect(),
            _ => DEFAULT_AFK_REASON.to_string(),
        };
        debug!("afk: {} is away", user_id);
        self.doc
            .users
            .insert(user_id.to_string(), AfkRecord { reason, since: now });
        self.persist();
        &self.doc.users[user_id]
    }

    /// Remove the note and report how long the user was away.
    pub fn clear(&mut self, user_id: &str, now: DateTime<Utc>) -> Option<(AfkRecord, Duration)> {
        let record = self.doc.users.remove(user_id)?;
        self.persist();
        let away = now.signed_duration_since(record.since);
        Some((record, away))
    }

    pub fn get(&self, user_id: &str) -> Option<&AfkRecord> {
        self.doc.users.get(user_id)
    }

    pub fn is_afk(&self, user_id: &str) -> bool {
        self.doc.users.contains_key(user_id)
    }
}

/// `1d 2h 5m`, dropping zero parts; anything under a minute reads `0m`.
pub fn format_away(d: Duration) -> String {
    let total = d.num_minutes().max(0);
    let (days, hours, minutes) = (total / 1440, (total % 1440) / 60, total % 60);
    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(format!("{}m", minutes));
    }
    parts.join(" ")
}
