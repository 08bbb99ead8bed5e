//! Word-chain channels.
//!
//! An enabled channel keeps the last word, who played it and every word used since the
//! last restart. A new word must start with the last letter, or the last two letters, of
//! the previous one. Comparison is on lowercased Unicode scalar values, so Vietnamese
//! diacritics match exactly.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::errors::{StoreError, WordChainError};
use crate::storage::{self, JsonStore, WORD_CHAIN_DOC};
use crate::text::escape_log;

pub const WORD_CHAIN_VERSION: u32 = 1;
pub const MIN_WORD_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Vi,
}

impl Language {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Language::En),
            "vi" | "vn" | "vietnamese" => Some(Language::Vi),
            _ => None,
        }
    }

    /// Vietnamese words are commonly two syllables separated by a space.
    pub fn allows_spaces(self) -> bool {
        matches!(self, Language::Vi)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::En => "en",
            Language::Vi => "vi",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelState {
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub last_word: Option<String>,
    #[serde(default)]
    pub last_user_id: Option<String>,
    #[serde(default)]
    pub chain_count: u64,
    /// Lowercased words played since the last restart.
    #[serde(default)]
    pub used_words: BTreeSet<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ChannelState {
    fn new(language: Language, now: DateTime<Utc>) -> Self {
        Self {
            language,
            last_word: None,
            last_user_id: None,
            chain_count: 0,
            used_words: BTreeSet::new(),
            created_at: now,
        }
    }

    fn reset(&mut self) {
        self.last_word = None;
        self.last_user_id = None;
        self.chain_count = 0;
        self.used_words.clear();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(default)]
    pub total_words: u64,
    /// Longest chain this player has extended.
    #[serde(default)]
    pub longest_chain: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordChainDocument {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub channels: HashMap<String, ChannelState>,
    #[serde(default)]
    pub players: HashMap<String, PlayerStats>,
}

impl WordChainDocument {
    /// Lowercase stored words once so lookups never need to.
    pub fn migrate(&mut self) -> usize {
        let mut touched = 0;
        for state in self.channels.values_mut() {
            if state.used_words.iter().any(|w| *w != w.to_lowercase()) {
                state.used_words = state.used_words.iter().map(|w| w.to_lowercase()).collect();
                touched += 1;
            }
        }
        self.version = WORD_CHAIN_VERSION;
        touched
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub word: String,
    pub chain_count: u64,
}

/// Check that `word` continues `prev`: it must start with the last character or the
/// last two characters of `prev`, case-insensitively.
pub fn check_connection(prev: &str, word: &str) -> Result<(), WordChainError> {
    let prev: Vec<char> = prev.trim().to_lowercase().chars().collect();
    let word = word.trim().to_lowercase();
    let Some(&last) = prev.last() else {
        return Ok(());
    };
    let last_char = last.to_string();
    let last_two: String = prev[prev.len().saturating_sub(2)..].iter().collect();
    if word.starts_with(&last_char) || (prev.len() >= 2 && word.starts_with(&last_two)) {
        Ok(())
    } else {
        Err(WordChainError::BadConnection {
            last_char,
            last_two,
        })
    }
}

#[derive(Debug)]
pub struct WordChain {
    doc: WordChainDocument,
    store: Option<JsonStore>,
}

impl WordChain {
    pub fn open(store: JsonStore) -> Result<Self, StoreError> {
        let mut doc: WordChainDocument = store.load(WORD_CHAIN_DOC)?;
        let touched = doc.migrate();
        info!(
            "word_chain: {} active channels, {} players",
            doc.channels.len(),
            doc.players.len()
        );
        let chain = Self {
            doc,
            store: Some(store),
        };
        if touched > 0 {
            chain.persist();
        }
        Ok(chain)
    }

    pub fn in_memory() -> Self {
        Self {
            doc: WordChainDocument::default(),
            store: None,
        }
    }

    fn persist(&self) {
        storage::persist(self.store.as_ref(), WORD_CHAIN_DOC, &self.doc);
    }

    /// Enable a channel. Re-enabling an active channel only switches its language.
    /// Returns `true` when the channel was not enabled before.
    pub fn enable(&mut self, channel_id: &str, language: Language, now: DateTime<Utc>) -> bool {
        let fresh = match self.doc.channels.get_mut(channel_id) {
            Some(state) => {
                state.language = language;
                false
            }
            None => {
                self.doc
                    .channels
                    .insert(channel_id.to_string(), ChannelState::new(language, now));
                true
            }
        };
        self.persist();
        info!("word_chain: enabled {} ({})", channel_id, language);
        fresh
    }

    /// Disable a channel and drop its state.
    pub fn disable(&mut self, channel_id: &str) -> bool {
        let removed = self.doc.channels.remove(channel_id).is_some();
        if removed {
            self.persist();
            info!("word_chain: disabled {}", channel_id);
        }
        removed
    }

    /// Clear the chain without disabling the channel.
    pub fn restart(&mut self, channel_id: &str) -> bool {
        match self.doc.channels.get_mut(channel_id) {
            Some(state) => {
                state.reset();
                self.persist();
                true
            }
            None => false,
        }
    }

    pub fn is_enabled(&self, channel_id: &str) -> bool {
        self.doc.channels.contains_key(channel_id)
    }

    pub fn channel(&self, channel_id: &str) -> Option<&ChannelState> {
        self.doc.channels.get(channel_id)
    }

    /// Play `word` in `channel_id`.
    ///
    /// Checked in order: channel enabled, not the previous contributor, not used before,
    /// at least two characters, connects to the previous word.
    pub fn submit_word(
        &mut self,
        channel_id: &str,
        user_id: &str,
        word: &str,
    ) -> Result<Accepted, WordChainError> {
        let state = self
            .doc
            .channels
            .get_mut(channel_id)
            .ok_or(WordChainError::ChannelDisabled)?;
        let word = word.trim();
        let key = word.to_lowercase();

        if state.last_user_id.as_deref() == Some(user_id) {
            return Err(WordChainError::OwnWord);
        }
        if state.used_words.contains(&key) {
            return Err(WordChainError::AlreadyUsed(word.to_string()));
        }
        if word.chars().count() < MIN_WORD_CHARS {
            return Err(WordChainError::TooShort);
        }
        if let Some(prev) = &state.last_word {
            check_connection(prev, word)?;
        }

        state.last_word = Some(word.to_string());
        state.last_user_id = Some(user_id.to_string());
        state.chain_count += 1;
        state.used_words.insert(key);
        let chain_count = state.chain_count;

        let stats = self.doc.players.entry(user_id.to_string()).or_default();
        stats.total_words += 1;
        stats.longest_chain = stats.longest_chain.max(chain_count);

        self.persist();
        debug!(
            "word_chain: {} played '{}' in {} (#{})",
            user_id,
            escape_log(word),
            channel_id,
            chain_count
        );
        Ok(Accepted {
            word: word.to_string(),
            chain_count,
        })
    }

    pub fn user_stats(&self, user_id: &str) -> PlayerStats {
        self.doc.players.get(user_id).copied().unwrap_or_default()
    }

    /// Players by words contributed, most first; ties by user ID.
    pub fn leaderboard(&self, limit: usize) -> Vec<(String, PlayerStats)> {
        let mut rows: Vec<(String, PlayerStats)> = self
            .doc
            .players
            .iter()
            .map(|(id, s)| (id.clone(), *s))
            .collect();
        rows.sort_by(|a, b| b.1.total_words.cmp(&a.1.total_words).then(a.0.cmp(&b.0)));
        rows.truncate(limit);
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> WordChain {
        let mut wc = WordChain::in_memory();
        wc.enable("c", Language::En, Utc::now());
        wc
    }

    #[test]
    fn connection_rule_uses_last_one_or_two_chars() {
        assert!(check_connection("apple", "elephant").is_ok());
        assert!(check_connection("apple", "lemon").is_ok());
        assert!(check_connection("Apple", "Echo").is_ok());
        assert_eq!(
            check_connection("apple", "banana"),
            Err(WordChainError::BadConnection {
                last_char: "e".into(),
                last_two: "le".into()
            })
        );
        assert!(check_connection("con gà", "gà trống").is_ok());
        assert!(check_connection("bánh mì", "mì quảng").is_ok());
    }

    #[test]
    fn rules_apply_in_order() {
        let mut wc = chain();
        assert_eq!(
            wc.submit_word("other", "a", "apple"),
            Err(WordChainError::ChannelDisabled)
        );
        wc.submit_word("c", "a", "apple").unwrap();
        assert_eq!(wc.submit_word("c", "a", "egg"), Err(WordChainError::OwnWord));
        assert_eq!(
            wc.submit_word("c", "b", "APPLE"),
            Err(WordChainError::AlreadyUsed("APPLE".into()))
        );
        assert_eq!(wc.submit_word("c", "b", "e"), Err(WordChainError::TooShort));
        assert!(matches!(
            wc.submit_word("c", "b", "zebra"),
            Err(WordChainError::BadConnection { .. })
        ));
        let ok = wc.submit_word("c", "b", "elephant").unwrap();
        assert_eq!(ok.chain_count, 2);
    }

    #[test]
    fn restart_clears_chain_but_stays_enabled() {
        let mut wc = chain();
        wc.submit_word("c", "a", "apple").unwrap();
        assert!(wc.restart("c"));
        assert!(wc.is_enabled("c"));
        let state = wc.channel("c").unwrap();
        assert_eq!(state.chain_count, 0);
        assert!(state.used_words.is_empty());
        wc.submit_word("c", "a", "apple").unwrap();
        assert!(!wc.restart("missing"));
    }

    #[test]
    fn stats_and_leaderboard() {
        let mut wc = chain();
        wc.submit_word("c", "a", "apple").unwrap();
        wc.submit_word("c", "b", "egg").unwrap();
        wc.submit_word("c", "a", "goat").unwrap();
        assert_eq!(wc.user_stats("a").total_words, 2);
        assert_eq!(wc.user_stats("b").longest_chain, 2);
        let board = wc.leaderboard(5);
        assert_eq!(board[0].0, "a");
        assert_eq!(board.len(), 2);
        assert!(wc.disable("c"));
        assert!(!wc.is_enabled("c"));
    }
}
