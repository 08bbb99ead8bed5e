//! Pairing (marriage) records.
//!
//! Records are mirrored: if A names B as partner then B names A. Proposals and their
//! expiry live in the router; this engine only validates them and performs the final
//! pair and unpair transitions.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{PairingError, StoreError};
use crate::privilege::Capability;
use crate::storage::{self, JsonStore, PAIRINGS_DOC};

pub const PAIRINGS_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PairingRecord {
    pub partner_id: String,
    pub paired_at: DateTime<Utc>,
    #[serde(default)]
    pub ring_item_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairingDocument {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub pairs: HashMap<String, PairingRecord>,
}

impl PairingDocument {
    /// Drop half-pairs left behind by older versions. Returns how many were removed.
    pub fn migrate(&mut self) -> usize {
        let orphans: Vec<String> = self
            .pairs
            .iter()
            .filter(|(user, rec)| {
                self.pairs
                    .get(&rec.partner_id)
                    .map(|back| &back.partner_id != *user)
                    .unwrap_or(true)
            })
            .map(|(user, _)| user.clone())
            .collect();
        for user in &orphans {
            self.pairs.remove(user);
        }
        self.version = PAIRINGS_VERSION;
        orphans.len()
    }
}

/// Side effects of a successful [`PairingBook::pair`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairOutcome {
    /// The target's previous partner, dropped by a forced pairing.
    pub auto_unpaired: Option<String>,
    /// The proposer's previous partner, dropped by a forced pairing.
    pub released_own_partner: Option<String>,
}

#[derive(Debug)]
pub struct PairingBook {
    doc: PairingDocument,
    store: Option<JsonStore>,
}

impl PairingBook {
    pub fn open(store: JsonStore) -> Result<Self, StoreError> {
        let mut doc: PairingDocument = store.load(PAIRINGS_DOC)?;
        let removed = doc.migrate();
        info!(
            "pairing: loaded {} records ({} orphans dropped)",
            doc.pairs.len(),
            removed
        );
        let book = Self {
            doc,
            store: Some(store),
        };
        if removed > 0 {
            book.persist();
        }
        Ok(book)
    }

    pub fn in_memory() -> Self {
        Self {
            doc: PairingDocument::default(),
            store: None,
        }
    }

    fn persist(&self) {
        storage::persist(self.store.as_ref(), PAIRINGS_DOC, &self.doc);
    }

    /// Check whether `proposer` may propose to `target`. Privileged proposers skip the
    /// already-paired checks.
    pub fn propose(
        &self,
        proposer: &str,
        target: &str,
        capability: Capability,
    ) -> Result<(), PairingError> {
        if proposer == target {
            return Err(PairingError::SelfPairing);
        }
        if capability.is_privileged() {
            return Ok(());
        }
        if self.is_paired(proposer) {
            return Err(PairingError::AlreadyPaired);
        }
        if self.is_paired(target) {
            return Err(PairingError::TargetPaired);
        }
        Ok(())
    }

    /// Pair `a` and `b`, writing both mirrored records with the same timestamp.
    ///
    /// A privileged `a` may pair with someone already taken: the target's old partner
    /// record is deleted, and so is the record of `a`'s own previous partner.
    pub fn pair(
        &mut self,
        a: &str,
        b: &str,
        ring_item_id: Option<&str>,
        capability: Capability,
        now: DateTime<Utc>,
    ) -> Result<PairOutcome, PairingError> {
        self.propose(a, b, capability)?;

        let mut outcome = PairOutcome::default();
        if let Some(old) = self.partner(b).filter(|p| *p != a).map(str::to_string) {
            self.doc.pairs.remove(&old);
            info!(target: "security", "pairing: {} forced; {} lost partner {}", a, old, b);
            outcome.auto_unpaired = Some(old);
        }
        if let Some(old) = self.partner(a).filter(|p| *p != b).map(str::to_string) {
            self.doc.pairs.remove(&old);
            outcome.released_own_partner = Some(old);
        }

        let ring = ring_item_id.map(str::to_string);
        for (user, partner) in [(a, b), (b, a)] {
            self.doc.pairs.insert(
                user.to_string(),
                PairingRecord {
                    partner_id: partner.to_string(),
                    paired_at: now,
                    ring_item_id: ring.clone(),
                },
            );
        }
        self.persist();
        info!("pairing: {} + {} (ring {:?})", a, b, ring);
        Ok(outcome)
    }

    /// Dissolve `user`'s pairing, deleting both records. Returns the former partner.
    pub fn unpair(&mut self, user: &str) -> Result<String, PairingError> {
        let record = self.doc.pairs.remove(user).ok_or(PairingError::NotPaired)?;
        if self.partner(&record.partner_id) == Some(user) {
            self.doc.pairs.remove(&record.partner_id);
        }
        self.persist();
        info!("pairing: {} and {} split", user, record.partner_id);
        Ok(record.partner_id)
    }

    pub fn partner(&self, user: &str) -> Option<&str> {
        self.doc.pairs.get(user).map(|r| r.partner_id.as_str())
    }

    pub fn record(&self, user: &str) -> Option<&PairingRecord> {
        self.doc.pairs.get(user)
    }

    pub fn is_paired(&self, user: &str) -> bool {
        self.doc.pairs.contains_key(user)
    }

    /// Number of pairs (each pair has two records).
    pub fn couples(&self) -> usize {
        self.doc.pairs.len() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_proposals_need_both_free() {
        let mut book = PairingBook::in_memory();
        assert_eq!(
            book.propose("a", "a", Capability::Privileged),
            Err(PairingError::SelfPairing)
        );
        book.pair("a", "b", Some("ring_love"), Capability::Standard, Utc::now())
            .unwrap();
        assert_eq!(
            book.propose("a", "c", Capability::Standard),
            Err(PairingError::AlreadyPaired)
        );
        assert_eq!(
            book.propose("c", "b", Capability::Standard),
            Err(PairingError::TargetPaired)
        );
        assert!(book.propose("c", "b", Capability::Privileged).is_ok());
    }

    #[test]
    fn records_are_mirrored() {
        let mut book = PairingBook::in_memory();
        let now = Utc::now();
        book.pair("a", "b", Some("ring_couple"), Capability::Standard, now)
            .unwrap();
        assert_eq!(book.partner("a"), Some("b"));
        assert_eq!(book.partner("b"), Some("a"));
        let (ra, rb) = (book.record("a").unwrap(), book.record("b").unwrap());
        assert_eq!(ra.paired_at, rb.paired_at);
        assert_eq!(ra.ring_item_id.as_deref(), Some("ring_couple"));
        assert_eq!(ra.ring_item_id, rb.ring_item_id);
        assert_eq!(book.couples(), 1);
    }

    #[test]
    fn forced_pairing_cleans_both_old_partners() {
        let mut book = PairingBook::in_memory();
        let now = Utc::now();
        book.pair("o", "x", None, Capability::Standard, now).unwrap();
        book.pair("b", "c", None, Capability::Standard, now).unwrap();
        let out = book.pair("o", "b", None, Capability::Privileged, now).unwrap();
        assert_eq!(out.auto_unpaired.as_deref(), Some("c"));
        assert_eq!(out.released_own_partner.as_deref(), Some("x"));
        assert!(!book.is_paired("c"));
        assert!(!book.is_paired("x"));
        assert_eq!(book.partner("o"), Some("b"));
        assert_eq!(book.partner("b"), Some("o"));
    }

    #[test]
    fn unpair_removes_both_sides() {
        let mut book = PairingBook::in_memory();
        book.pair("a", "b", None, Capability::Standard, Utc::now())
            .unwrap();
        assert_eq!(book.unpair("b").unwrap(), "a");
        assert_eq!(book.partner("a"), None);
        assert_eq!(book.partner("b"), None);
        assert_eq!(book.unpair("a"), Err(PairingError::NotPaired));
    }

    #[test]
    fn migrate_drops_half_pairs() {
        let raw = r#"{"pairs": {
            "a": {"partner_id": "b", "paired_at": "2024-01-01T00:00:00Z"},
            "b": {"partner_id": "a", "paired_at": "2024-01-01T00:00:00Z"},
            "c": {"partner_id": "d", "paired_at": "2024-01-01T00:00:00Z"}
        }}"#;
        let mut doc: PairingDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.migrate(), 1);
        assert!(doc.pairs.contains_key("a"));
        assert!(!doc.pairs.contains_key("c"));
    }
}
