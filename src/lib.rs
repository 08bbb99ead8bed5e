//! # Tavernbot - Economy and Games for Community Chat
//!
//! Tavernbot is the backend of a community chat bot: a coin economy with daily rewards
//! and levels, a small casino, an item shop with capped inventories and lootboxes,
//! pairing between members and a per-channel word-chain game.
//!
//! ## Features
//!
//! - **Ledger**: wallets and bank vaults, daily streaks, XP curve with level perks, leaderboards.
//! - **Casino**: coinflip, three-reel slots and a one-shot blackjack, settled through the ledger.
//! - **Shop**: static catalog, item and pet capacities, equip slots, lootboxes, gifting.
//! - **Pairing**: mirrored partner records with ring-backed proposals.
//! - **AFK and mutes**: away notes announced on mention, timed per-guild mutes.
//! - **Word chain**: last-letter chaining per channel in English or Vietnamese.
//! - **Dispatch**: prefix command parser, per-channel toggles, cooldowns and a console transport.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tavernbot::bot::{Bot, TextEvent};
//! use tavernbot::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let mut bot = Bot::open(config)?;
//!     for reply in bot.route_text_event(&TextEvent::new("guild", "general", "42", "!daily")) {
//!         println!("{}", reply.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`bot`] - router, command parser, toggles, cooldowns and the console transport
//! - [`economy`] - accounts and the [`economy::Ledger`]
//! - [`casino`] - game resolvers and bet validation
//! - [`shop`] - catalog, inventories and the [`shop::Shop`] engine
//! - [`social`] - pairing records, AFK notes and mutes
//! - [`games`] - the word-chain engine
//! - [`storage`] - locked JSON document store
//! - [`config`] - TOML configuration and validation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Bot router    │ ← commands, toggles, cooldowns
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │    Engines      │ ← ledger, casino, shop, pairing, word chain
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   JSON store    │ ← one document per engine
//! └─────────────────┘
//! ```

pub mod bot;
pub mod casino;
pub mod config;
pub mod economy;
pub mod errors;
pub mod games;
pub mod privilege;
pub mod shop;
pub mod social;
pub mod storage;
pub mod text;
