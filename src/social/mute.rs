//! Timed per-guild mutes, persisted in `mutes.json`.
//!
//! Expired mutes are dropped lazily whenever a guild is consulted, and in bulk on load.

use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{MuteError, StoreError};
use crate::storage::{self, JsonStore, MUTES_DOC};

pub const MUTES_VERSION: u32 = 1;
/// Four weeks.
pub const MAX_MUTE_MINUTES: u32 = 40_320;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MuteRecord {
    pub muted_at: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub minutes: u32,
    #[serde(default)]
    pub reason: Option<String>,
}

impl MuteRecord {
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.until.signed_duration_since(now)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MuteDocument {
    #[serde(default)]
    pub version: u32,
    /// guild id -> user id -> mute
    #[serde(default)]
    pub guilds: HashMap<String, HashMap<String, MuteRecord>>,
}

impl MuteDocument {
    /// Remove expired mutes and guilds left empty. Returns how many mutes went.
    pub fn cleanup_expired(&mut self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for users in self.guilds.values_mut() {
            let before = users.len();
            users.retain(|_, m| m.until > now);
            removed += before - users.len();
        }
        self.guilds.retain(|_, users| !users.is_empty());
        removed
    }
}

#[derive(Debug)]
pub struct MuteBook {
    doc: MuteDocument,
    store: Option<JsonStore>,
}

impl MuteBook {
    pub fn open(store: JsonStore) -> Result<Self, StoreError> {
        let mut doc: MuteDocument = store.load(MUTES_DOC)?;
        let mut touched = doc.cleanup_expired(Utc::now());
        if doc.version != MUTES_VERSION {
            doc.version = MUTES_VERSION;
            touched += 1;
        }
        let book = Self {
            doc,
            store: Some(store),
        };
        if touched > 0 {
            book.persist();
        }
        Ok(book)
    }

    pub fn in_memory() -> Self {
        Self {
            doc: MuteDocument {
                version: MUTES_VERSION,
                ..MuteDocument::default()
            },
            store: None,
        }
    }

    fn persist(&self) {
        storage::persist(self.store.as_ref(), MUTES_DOC, &self.doc);
    }

    /// Mute `user_id` in a guild for `minutes`, replacing any running mute.
    pub fn mute(
        &mut self,
        guild_id: &str,
        user_id: &str,
        minutes: u32,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<&MuteRecord, MuteError> {
        if minutes == 0 || minutes > MAX_MUTE_MINUTES {
            return Err(MuteError::InvalidDuration {
                max: MAX_MUTE_MINUTES,
            });
        }
        let record = MuteRecord {
            muted_at: now,
            until: now + Duration::minutes(i64::from(minutes)),
            minutes,
            reason: reason.filter(|r| !r.trim().is_empty()),
        };
        info!(target: "security", "mute: {} in {} for {}m", user_id, guild_id, minutes);
        self.doc
            .guilds
            .entry(guild_id.to_string())
            .or_default()
            .insert(user_id.to_string(), record);
        self.persist();
        Ok(&self.doc.guilds[guild_id][user_id])
    }

    /// Lift a mute. Returns `false` when the user was not muted.
    pub fn unmute(&mut self, guild_id: &str, user_id: &str) -> bool {
        let Some(users) = self.doc.guilds.get_mut(guild_id) else {
            return false;
        };
        let removed = users.remove(user_id).is_some();
        if users.is_empty() {
            self.doc.guilds.remove(guild_id);
        }
        if removed {
            self.persist();
            info!(target: "security", "mute: lifted for {} in {}", user_id, guild_id);
        }
        removed
    }

    /// Whether the user is muted right now. An expired mute is dropped on the way.
    pub fn is_muted(&mut self, guild_id: &str, user_id: &str, now: DateTime<Utc>) -> bool {
        self.active(guild_id, user_id, now).is_some()
    }

    /// The running mute for a user, if any.
    pub fn active(&mut self, guild_id: &str, user_id: &str, now: DateTime<Utc>) -> Option<&MuteRecord> {
        let expired = self
            .doc
            .guilds
            .get(guild_id)
            .and_then(|users| users.get(user_id))
            .map(|m| m.until <= now)?;
        if expired {
            self.unmute(guild_id, user_id);
            return None;
        }
        self.doc.guilds.get(guild_id).and_then(|users| users.get(user_id))
    }

    /// Running mutes in a guild, soonest to expire first.
    pub fn muted_in(&mut self, guild_id: &str, now: DateTime<Utc>) -> Vec<(String, MuteRecord)> {
        self.cleanup_expired(now);
        let mut rows: Vec<(String, MuteRecord)> = self
            .doc
            .guilds
            .get(guild_id)
            .map(|users| users.iter().map(|(id, m)| (id.clone(), m.clone())).collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| a.1.until.cmp(&b.1.until).then_with(|| a.0.cmp(&b.0)));
        rows
    }

    pub fn cleanup_expired(&mut self, now: DateTime<Utc>) -> usize {
        let removed = self.doc.cleanup_expired(now);
        if removed > 0 {
            self.persist();
        }
        removed
    }
}

/// `1h 5m`, `4m 10s` or `12s`.
pub fn format_remaining(d: Duration) -> String {
    let total = d.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn mutes_expire_on_their_own() {
        let mut book = MuteBook::in_memory();
        book.mute("g", "u", 10, Some("spam".into()), t0()).unwrap();
        assert!(book.is_muted("g", "u", t0() + Duration::minutes(9)));
        assert!(!book.is_muted("other", "u", t0()));
        assert!(!book.is_muted("g", "u", t0() + Duration::minutes(10)));
        assert!(book.muted_in("g", t0()).is_empty());
    }

    #[test]
    fn duration_bounds() {
        let mut book = MuteBook::in_memory();
        assert!(matches!(
            book.mute("g", "u", 0, None, t0()),
            Err(MuteError::InvalidDuration { .. })
        ));
        assert!(book.mute("g", "u", MAX_MUTE_MINUTES + 1, None, t0()).is_err());
        assert_eq!(book.mute("g", "u", MAX_MUTE_MINUTES, None, t0()).unwrap().minutes, MAX_MUTE_MINUTES);
    }

    #[test]
    fn list_is_sorted_and_cleanup_counts() {
        let mut book = MuteBook::in_memory();
        book.mute("g", "long", 60, None, t0()).unwrap();
        book.mute("g", "short", 5, None, t0()).unwrap();
        book.mute("g", "gone", 1, None, t0()).unwrap();
        let later = t0() + Duration::minutes(2);
        let ids: Vec<String> = book.muted_in("g", later).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["short", "long"]);

        assert_eq!(book.cleanup_expired(t0() + Duration::hours(2)), 2);
        assert!(!book.unmute("g", "long"));
    }

    #[test]
    fn remaining_formatting() {
        assert_eq!(format_remaining(Duration::seconds(3725)), "1h 2m");
        assert_eq!(format_remaining(Duration::seconds(250)), "4m 10s");
        assert_eq!(format_remaining(Duration::seconds(12)), "12s");
        assert_eq!(format_remaining(Duration::seconds(-3)), "0s");
    }
}
