//! Account record, leveling curve and the on-disk economy document.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::config::EconomyConfig;
use crate::privilege::{Capability, Privileges};

/// Current shape of [`EconomyDocument`].
pub const ECONOMY_VERSION: u32 = 2;

/// Coins available to an account. Privileged accounts read as unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Funds {
    Amount(u64),
    Unlimited,
}

impl Funds {
    /// Whether a debit of `amount` would succeed.
    pub fn covers(self, amount: u64) -> bool {
        match self {
            Funds::Unlimited => true,
            Funds::Amount(have) => have >= amount,
        }
    }

    pub fn amount(self) -> Option<u64> {
        match self {
            Funds::Amount(v) => Some(v),
            Funds::Unlimited => None,
        }
    }
}

impl fmt::Display for Funds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Funds::Amount(v) => write!(f, "{}", v),
            Funds::Unlimited => f.write_str("∞"),
        }
    }
}

/// Per-user financial and leveling record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    #[serde(default)]
    pub balance: u64,
    #[serde(default)]
    pub bank: u64,
    #[serde(default)]
    pub xp: u64,
    #[serde(default = "first_level")]
    pub level: u32,
    #[serde(default)]
    pub daily_streak: u32,
    #[serde(default)]
    pub last_daily: Option<DateTime<Utc>>,
    /// Drawn once from the configured daily range, stable afterwards.
    #[serde(default)]
    pub base_daily: u64,
    /// Permanent daily bonus in percent, grown by level-ups.
    #[serde(default)]
    pub level_daily_bonus: f64,
    #[serde(default)]
    pub total_earned: u64,
    #[serde(default)]
    pub total_spent: u64,
    #[serde(default)]
    pub wins: u64,
    #[serde(default)]
    pub losses: u64,
    #[serde(default)]
    pub capability: Capability,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Creation order; ties on the leaderboard go to the older account.
    #[serde(default)]
    pub seq: u64,
}

fn first_level() -> u32 {
    1
}

impl Account {
    pub fn new(
        capability: Capability,
        settings: &EconomyConfig,
        seq: u64,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            balance: settings.starting_balance,
            bank: 0,
            xp: 0,
            level: 1,
            daily_streak: 0,
            last_daily: None,
            base_daily: draw_base_daily(settings, rng),
            level_daily_bonus: 0.0,
            total_earned: settings.starting_balance,
            total_spent: 0,
            wins: 0,
            losses: 0,
            capability,
            created_at: now,
            seq,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.capability.is_privileged()
    }

    pub fn wallet(&self) -> Funds {
        if self.is_unlimited() {
            Funds::Unlimited
        } else {
            Funds::Amount(self.balance)
        }
    }

    pub fn vault(&self) -> Funds {
        if self.is_unlimited() {
            Funds::Unlimited
        } else {
            Funds::Amount(self.bank)
        }
    }

    /// XP still missing before the next level.
    pub fn xp_to_next(&self) -> u64 {
        xp_for_level(self.level).saturating_sub(self.xp)
    }
}

/// XP required to leave `level`: `floor(100 * level^1.5)`.
pub fn xp_for_level(level: u32) -> u64 {
    (100.0 * f64::from(level.max(1)).powf(1.5)).floor() as u64
}

fn draw_base_daily(settings: &EconomyConfig, rng: &mut impl Rng) -> u64 {
    rng.gen_range(settings.daily_base_min..=settings.daily_base_max)
}

/// Result of an XP grant that crossed at least one level boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelUp {
    pub from: u32,
    pub to: u32,
    /// Coins credited for every level reached.
    pub coin_reward: u64,
    /// Permanent daily bonus percentage added by this level-up.
    pub daily_bonus_gained_pct: f64,
}

/// Add XP and resolve every level boundary it crosses, applying level perks.
pub(crate) fn grant_xp(
    account: &mut Account,
    amount: u64,
    settings: &EconomyConfig,
) -> Option<LevelUp> {
    account.xp = account.xp.saturating_add(amount);
    let from = account.level;
    loop {
        let needed = xp_for_level(account.level);
        if account.xp < needed {
            break;
        }
        account.xp -= needed;
        account.level += 1;
    }
    if account.level == from {
        return None;
    }

    let coin_reward = (from + 1..=account.level)
        .map(|lv| u64::from(lv).saturating_mul(settings.level_reward_per_level))
        .fold(0u64, u64::saturating_add);
    account.balance = account.balance.saturating_add(coin_reward);
    account.total_earned = account.total_earned.saturating_add(coin_reward);

    let gained = f64::from(account.level - from) * settings.level_bonus_pct_per_level;
    account.level_daily_bonus += gained;

    Some(LevelUp {
        from,
        to: account.level,
        coin_reward,
        daily_bonus_gained_pct: gained,
    })
}

/// On-disk economy document: every account keyed by user ID.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EconomyDocument {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub next_seq: u64,
    #[serde(default)]
    pub accounts: HashMap<String, Account>,
}

impl EconomyDocument {
    /// Bring every record to the current shape once, right after load.
    pub fn migrate(
        &mut self,
        privileges: &Privileges,
        settings: &EconomyConfig,
        rng: &mut impl Rng,
    ) -> usize {
        let mut touched = 0;
        let range = settings.daily_base_min..=settings.daily_base_max;
        // Sorted so a seeded generator redraws the same values on every load.
        let mut ids: Vec<String> = self.accounts.keys().cloned().collect();
        ids.sort();
        for user_id in &ids {
            let Some(account) = self.accounts.get_mut(user_id) else {
                continue;
            };
            let mut changed = false;
            if account.level == 0 {
                account.level = 1;
                changed = true;
            }
            if !range.contains(&account.base_daily) {
                account.base_daily = draw_base_daily(settings, rng);
                changed = true;
            }
            if !account.level_daily_bonus.is_finite() || account.level_daily_bonus < 0.0 {
                account.level_daily_bonus = 0.0;
                changed = true;
            }
            if privileges.is_owner(user_id) && !account.is_unlimited() {
                account.capability = Capability::Privileged;
                changed = true;
            }
            if changed {
                touched += 1;
            }
        }
        touched += self.renumber_duplicate_seqs();
        let max_seq = self.accounts.values().map(|a| a.seq).max().unwrap_or(0);
        if self.next_seq <= max_seq {
            self.next_seq = max_seq + 1;
        }
        self.version = ECONOMY_VERSION;
        touched
    }

    /// Older documents carry no creation order, so every `seq` reads as 0. When any
    /// two accounts share a `seq`, renumber all of them by `created_at`.
    fn renumber_duplicate_seqs(&mut self) -> usize {
        let mut seen = HashSet::with_capacity(self.accounts.len());
        if self.accounts.values().all(|a| seen.insert(a.seq)) {
            return 0;
        }
        let mut order: Vec<(DateTime<Utc>, u64, String)> = self
            .accounts
            .iter()
            .map(|(id, a)| (a.created_at, a.seq, id.clone()))
            .collect();
        order.sort();
        let mut touched = 0;
        for (seq, (_, old, id)) in order.into_iter().enumerate() {
            let seq = seq as u64;
            if let Some(account) = self.accounts.get_mut(&id) {
                if old != seq {
                    account.seq = seq;
                    touched += 1;
                }
            }
        }
        touched
    }
}
