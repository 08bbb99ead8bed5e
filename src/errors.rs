//! Error taxonomy for the bot.
//!
//! Three channels are kept apart:
//! - **Rejections** ([`LedgerError`], [`CasinoError`], [`ShopError`], [`PairingError`],
//!   [`WordChainError`]) describe a request that was refused. They are ordinary values
//!   rendered back to the user and never abort anything.
//! - **Persistence errors** ([`StoreError`]) are logged by the owning engine and swallowed
//!   once the in-memory mutation has happened.
//! - **Faults** ([`CatalogError`]) mean the static item table is inconsistent. They surface
//!   at startup and stop the process.
use thiserror::Error;

use crate::shop::{CapacityKind, LootTier, Slot};

/// Errors raised by the JSON document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Wrapper around IO errors (directory creation, reads, writes, locking).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around serde_json serialization and deserialization errors.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Inconsistencies in the item catalog. Any of these is a programming error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate catalog item: {0}")]
    DuplicateItem(String),

    #[error("catalog item {0} has a zero price")]
    ZeroPrice(String),

    #[error("loot table {tier:?} references unknown item {item}")]
    UnknownPoolItem { tier: LootTier, item: String },

    #[error("loot table {0:?} has an empty pool or range")]
    EmptyLootTable(LootTier),

    #[error("no loot table for tier {0:?}")]
    MissingLootTable(LootTier),

    #[error("upgrade item {0} carries no capacity grant")]
    MissingCapacityGrant(String),
}

/// Rejections from the ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("not enough coins in wallet (need {needed}, have {available})")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("not enough coins in bank (need {needed}, have {available})")]
    InsufficientBank { needed: u64, available: u64 },

    #[error("cannot transfer coins to yourself")]
    SelfTransfer,

    #[error("daily already claimed, next claim in {hours}h {minutes}m")]
    DailyNotReady { hours: i64, minutes: i64 },

    #[error("level must be at least 1")]
    InvalidLevel,
}

/// Rejections from the casino, all raised before any randomness is drawn.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CasinoError {
    #[error("bet must be greater than zero")]
    InvalidBet,

    #[error("bet of {bet} exceeds wallet balance of {balance}")]
    BetExceedsBalance { bet: u64, balance: u64 },

    #[error("unlimited accounts must name a bet amount")]
    UnboundedAllIn,
}

/// Rejections from the shop and inventory engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShopError {
    #[error("no such item: {0}")]
    UnknownItem(String),

    #[error("you don't have {0}")]
    NotOwned(String),

    #[error("you only have {held} of {item}")]
    NotEnough { item: String, held: u32 },

    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    #[error("{kind} slots are full ({used}/{capacity})")]
    CapacityFull {
        kind: CapacityKind,
        used: u32,
        capacity: u32,
    },

    #[error("{0} cannot be equipped")]
    NotEquippable(String),

    #[error("{0} is already equipped")]
    AlreadyEquipped(String),

    #[error("nothing equipped in the {0} slot")]
    NothingEquipped(Slot),

    #[error("{0} cannot be used")]
    NotUsable(String),

    #[error("{0} is not a lootbox")]
    NotLootbox(String),

    #[error("{0} cannot be traded")]
    NotTradeable(String),

    #[error("cannot give items to yourself")]
    SelfGift,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Rejections from the pairing engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PairingError {
    #[error("you cannot pair with yourself")]
    SelfPairing,

    #[error("you are already paired")]
    AlreadyPaired,

    #[error("they are already paired")]
    TargetPaired,

    #[error("you are not paired")]
    NotPaired,
}

/// Rejections from the word-chain engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WordChainError {
    #[error("word chain is not enabled in this channel")]
    ChannelDisabled,

    #[error("you cannot chain your own word")]
    OwnWord,

    #[error("'{0}' was already used")]
    AlreadyUsed(String),

    #[error("word must be at least 2 letters")]
    TooShort,

    #[error("word must start with \"{last_char}\" or \"{last_two}\"")]
    BadConnection { last_char: String, last_two: String },
}

/// Rejections from channel command toggles and prefix changes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToggleError {
    #[error("prefix must be 1 to {max} characters without spaces")]
    InvalidPrefix { max: usize },

    #[error("'{0}' cannot be disabled")]
    Protected(String),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

/// Rejections from the mute list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MuteError {
    #[error("mute length must be 1 to {max} minutes")]
    InvalidDuration { max: u32 },

    #[error("bot owners cannot be muted")]
    Protected,
}

/// Startup errors for the assembled bot.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("invalid configuration: {0}")]
    Config(String),
}
