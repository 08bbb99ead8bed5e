//! # Configuration Management Module
//!
//! Loads and writes the bot's TOML configuration. Every section derives serde with
//! per-field defaults so a config file only needs the values it wants to override.
//!
//! ## Configuration Structure
//!
//! - [`BotConfig`] - bot name, owner allow-list, default command prefix
//! - [`StorageConfig`] - data directory for the JSON documents
//! - [`LoggingConfig`] - log level, log file and security log file
//! - [`EconomyConfig`] - starting balance, daily range, XP and level-up rewards
//! - [`ShopConfig`] - default inventory capacities
//! - [`GamesConfig`] - proposal timeout, casino cooldown, word-chain language
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tavernbot::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Bot: {} (prefix {})", config.bot.name, config.bot.prefix);
//!     Config::create_default("config.example.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bot]
//! name = "Tavern"
//! owner_ids = ["123456789012345678"]
//! prefix = "!"
//!
//! [storage]
//! data_dir = "./data"
//!
//! [economy]
//! starting_balance = 1000
//! daily_base_min = 1200
//! daily_base_max = 1800
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Longest accepted command prefix, for the default and per-guild overrides alike.
pub const MAX_PREFIX_LEN: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub name: String,
    /// User IDs with the privileged capability (unlimited wallet and slots, owner commands).
    #[serde(default)]
    pub owner_ids: Vec<String>,
    /// Default command prefix for guilds without an override.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "!".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    #[serde(default)]
    pub security_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Wallet balance granted to a new account (also counted as earned).
    pub starting_balance: u64,
    /// Inclusive range the per-account base daily amount is drawn from.
    pub daily_base_min: u64,
    pub daily_base_max: u64,
    /// XP granted by each daily claim.
    pub daily_xp: u64,
    /// Inclusive range of XP granted for chatting.
    pub chat_xp_min: u64,
    pub chat_xp_max: u64,
    pub chat_xp_cooldown_secs: u64,
    /// Coins per level reached (level N pays N * this).
    pub level_reward_per_level: u64,
    /// Permanent daily bonus percentage gained per level.
    pub level_bonus_pct_per_level: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_balance: 1000,
            daily_base_min: 1200,
            daily_base_max: 1800,
            daily_xp: 10,
            chat_xp_min: 5,
            chat_xp_max: 15,
            chat_xp_cooldown_secs: 60,
            level_reward_per_level: 2000,
            level_bonus_pct_per_level: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    /// Bag slots for non-pet items on a fresh inventory.
    pub item_capacity: u32,
    /// Pet slots on a fresh inventory.
    pub pet_capacity: u32,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            item_capacity: 30,
            pet_capacity: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GamesConfig {
    /// How long a pairing proposal waits for accept/reject.
    pub proposal_timeout_secs: u64,
    /// Minimum gap between two casino games from the same user.
    pub casino_cooldown_ms: u64,
    /// Language used by `wc start` when none is given ("en" or "vi").
    pub word_chain_default_language: String,
}

impl Default for GamesConfig {
    fn default() -> Self {
        Self {
            proposal_timeout_secs: 120,
            casino_cooldown_ms: 1500,
            word_chain_default_language: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default)]
    pub shop: ShopConfig,
    #[serde(default)]
    pub games: GamesConfig,
}

impl Config {
    /// Load configuration from a file and validate it.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config
            .validate()
            .map_err(|e| anyhow!("Invalid config file {}: {}", path, e))?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Check ranges and limits that serde cannot express.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let prefix = self.bot.prefix.trim();
        if prefix.is_empty() || prefix.chars().count() > MAX_PREFIX_LEN {
            return Err(format!(
                "bot.prefix must be 1..={} characters",
                MAX_PREFIX_LEN
            ));
        }
        let eco = &self.economy;
        if eco.daily_base_min == 0 || eco.daily_base_min > eco.daily_base_max {
            return Err("economy.daily_base_min must be > 0 and <= daily_base_max".into());
        }
        if eco.chat_xp_min > eco.chat_xp_max {
            return Err("economy.chat_xp_min must be <= chat_xp_max".into());
        }
        if !eco.level_bonus_pct_per_level.is_finite() || eco.level_bonus_pct_per_level < 0.0 {
            return Err("economy.level_bonus_pct_per_level must be a non-negative number".into());
        }
        if self.shop.item_capacity == 0 || self.shop.pet_capacity == 0 {
            return Err("shop capacities must be greater than zero".into());
        }
        match self.games.word_chain_default_language.as_str() {
            "en" | "vi" => {}
            other => {
                return Err(format!(
                    "games.word_chain_default_language '{}' is not one of en, vi",
                    other
                ))
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bot: BotConfig {
                name: "Tavern".to_string(),
                owner_ids: Vec::new(),
                prefix: default_prefix(),
            },
            storage: StorageConfig {
                data_dir: "./data".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("tavernbot.log".to_string()),
                security_file: Some("tavernbot-security.log".to_string()),
            },
            economy: EconomyConfig::default(),
            shop: ShopConfig::default(),
            games: GamesConfig::default(),
        }
    }
}
