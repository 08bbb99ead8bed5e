//! Economy: accounts, the leveling curve and the [`Ledger`] engine.

pub mod account;
pub mod ledger;

pub use account::{xp_for_level, Account, EconomyDocument, Funds, LevelUp, ECONOMY_VERSION};
pub use ledger::{DailyReward, LeaderboardEntry, LeaderboardMetric, Ledger};
