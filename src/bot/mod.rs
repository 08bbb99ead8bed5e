//! # Bot Module - Command Routing
//!
//! The [`Bot`] owns every engine and turns a [`TextEvent`] into zero or more [`Reply`]s:
//!
//! - prefixed text is parsed into a [`Command`], gated by channel toggles and the owner
//!   allow-list, then executed against the engines;
//! - plain text in a word-chain channel is played as a word;
//! - any other plain text earns chat XP, at most once per cooldown window.
//!
//! Before any of that, messages from muted users are dropped, an AFK author is welcomed
//! back and AFK users mentioned in the message are announced.
//!
//! All replies pass through [`sanitize_mentions`] before leaving the router. The
//! [`console`] transport feeds stdin lines into the router for local play.

pub mod command;
pub mod console;
pub mod event;
pub mod render;
pub mod state;
pub mod toggles;

pub use command::{Command, CommandParser, WordChainCommand};
pub use event::{Reply, TextEvent};
pub use state::{Cooldowns, Proposal, ProposalBoard};
pub use toggles::ChannelToggles;

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::casino::{
    self, BetAmount, BlackjackOutcome, CoinSide, CoinflipOutcome, Settlement, SlotsOutcome,
};
use crate::config::Config;
use crate::economy::{LeaderboardMetric, Ledger};
use crate::errors::{BotError, MuteError};
use crate::games::{Language, WordChain};
use crate::privilege::{Capability, Privileges};
use crate::shop::{Catalog, Category, ItemEffect, Shop, UseOutcome};
use crate::social::{format_away, format_remaining, AfkBoard, MuteBook, PairingBook};
use crate::storage::JsonStore;
use crate::text::{escape_log, sanitize_mentions};
use command::mentioned_users;
use render::mention;

/// Rows shown by the leaderboard commands.
const LEADERBOARD_ROWS: usize = 10;

#[derive(Debug, Clone, Copy)]
enum Game {
    Coinflip(CoinSide),
    Slots,
    Blackjack,
}

enum Played {
    Coinflip(CoinflipOutcome),
    Slots(SlotsOutcome),
    Blackjack(BlackjackOutcome),
}

impl Played {
    fn settlement(&self) -> Settlement {
        match self {
            Played::Coinflip(o) => o.settlement(),
            Played::Slots(o) => o.settlement(),
            Played::Blackjack(o) => o.settlement(),
        }
    }
}

pub struct Bot {
    config: Config,
    privileges: Privileges,
    ledger: Ledger,
    shop: Shop,
    pairings: PairingBook,
    word_chain: WordChain,
    toggles: ChannelToggles,
    afk: AfkBoard,
    mutes: MuteBook,
    cooldowns: Cooldowns,
    proposals: ProposalBoard,
    parser: CommandParser,
    default_language: Language,
    rng: StdRng,
}

impl Bot {
    /// Open every engine on the configured data directory.
    pub fn open(config: Config) -> Result<Self, BotError> {
        Self::open_with_rng(config, StdRng::from_entropy())
    }

    /// Like [`Bot::open`] with a fixed seed, for reproducible sessions.
    pub fn open_seeded(config: Config, seed: u64) -> Result<Self, BotError> {
        Self::open_with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn open_with_rng(config: Config, mut rng: StdRng) -> Result<Self, BotError> {
        config.validate().map_err(BotError::Config)?;
        let store = JsonStore::new(&config.storage.data_dir);
        let privileges = Privileges::new(config.bot.owner_ids.iter().cloned());
        let catalog = Catalog::builtin()?;
        let ledger = Ledger::open(
            store.clone(),
            privileges.clone(),
            config.economy.clone(),
            &mut rng,
        )?;
        let shop = Shop::open(
            store.clone(),
            catalog,
            privileges.clone(),
            config.shop.clone(),
        )?;
        let pairings = PairingBook::open(store.clone())?;
        let word_chain = WordChain::open(store.clone())?;
        let toggles = ChannelToggles::open(store.clone())?;
        let afk = AfkBoard::open(store.clone())?;
        let mutes = MuteBook::open(store)?;
        info!(
            "{}: engines ready ({} accounts, {} couples)",
            config.bot.name,
            ledger.account_count(),
            pairings.couples()
        );
        Ok(Self::assemble(
            config,
            privileges,
            ledger,
            shop,
            pairings,
            word_chain,
            toggles,
            afk,
            mutes,
            rng,
        ))
    }

    /// Bot that keeps everything in memory.
    pub fn in_memory(config: Config, seed: u64) -> Result<Self, BotError> {
        config.validate().map_err(BotError::Config)?;
        let privileges = Privileges::new(config.bot.owner_ids.iter().cloned());
        let mut rng = StdRng::seed_from_u64(seed);
        let ledger =
            Ledger::in_memory(privileges.clone(), config.economy.clone()).with_seed(rng.gen());
        let shop = Shop::in_memory(Catalog::builtin()?, privileges.clone(), config.shop.clone());
        Ok(Self::assemble(
            config,
            privileges,
            ledger,
            shop,
            PairingBook::in_memory(),
            WordChain::in_memory(),
            ChannelToggles::in_memory(),
            AfkBoard::in_memory(),
            MuteBook::in_memory(),
            rng,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        config: Config,
        privileges: Privileges,
        ledger: Ledger,
        shop: Shop,
        pairings: PairingBook,
        word_chain: WordChain,
        toggles: ChannelToggles,
        afk: AfkBoard,
        mutes: MuteBook,
        rng: StdRng,
    ) -> Self {
        let cooldowns = Cooldowns::new(
            Duration::from_millis(config.games.casino_cooldown_ms),
            Duration::from_secs(config.economy.chat_xp_cooldown_secs),
        );
        let proposals = ProposalBoard::new(Duration::from_secs(config.games.proposal_timeout_secs));
        let default_language =
            Language::parse(&config.games.word_chain_default_language).unwrap_or_default();
        Self {
            config,
            privileges,
            ledger,
            shop,
            pairings,
            word_chain,
            toggles,
            afk,
            mutes,
            cooldowns,
            proposals,
            parser: CommandParser::new(),
            default_language,
            rng,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn shop(&self) -> &Shop {
        &self.shop
    }

    pub fn shop_mut(&mut self) -> &mut Shop {
        &mut self.shop
    }

    pub fn pairings(&self) -> &PairingBook {
        &self.pairings
    }

    pub fn word_chain(&self) -> &WordChain {
        &self.word_chain
    }

    pub fn toggles(&self) -> &ChannelToggles {
        &self.toggles
    }

    pub fn afk(&self) -> &AfkBoard {
        &self.afk
    }

    /// One-paragraph status for the `status` subcommand.
    pub fn summary(&self) -> String {
        format!(
            "Bot: {}\nPrefix: {}\nOwners: {}\nData dir: {}\nAccounts: {}\nCouples: {}\nCatalog items: {}",
            self.config.bot.name,
            self.config.bot.prefix,
            self.privileges.len(),
            self.config.storage.data_dir,
            self.ledger.account_count(),
            self.pairings.couples(),
            self.shop.catalog().len()
        )
    }

    /// Route one inbound message. Replies go back to the same channel.
    pub fn route_text_event(&mut self, event: &TextEvent) -> Vec<Reply> {
        self.route_at(event, Instant::now())
    }

    /// [`Bot::route_text_event`] with an explicit monotonic clock.
    pub fn route_at(&mut self, event: &TextEvent, now: Instant) -> Vec<Reply> {
        self.route_timed(event, now, Utc::now())
    }

    /// Route with both clocks injected: `now` drives cooldowns, `wall` drives AFK
    /// durations and mute expiry.
    pub fn route_timed(&mut self, event: &TextEvent, now: Instant, wall: DateTime<Utc>) -> Vec<Reply> {
        self.cooldowns.prune_expired(now);
        let author = event.author_id.as_str();
        if !self.privileges.is_owner(author) && self.mutes.is_muted(&event.guild_id, author, wall) {
            debug!("muted: dropped message from {} in {}", author, event.guild_id);
            return Vec::new();
        }
        let prefix = self
            .toggles
            .prefix_for(&event.guild_id, &self.config.bot.prefix)
            .to_string();
        let parsed = self.parser.parse(&prefix, &event.content);

        let mut texts = Vec::new();
        if !matches!(parsed, Some(Command::Afk(_))) {
            if let Some((_, away)) = self.afk.clear(author, wall) {
                texts.push(format!(
                    "👋 Welcome back {}! You were AFK for {}",
                    mention(author),
                    format_away(away)
                ));
            }
        }
        for user in mentioned_users(&event.content) {
            if user == author {
                continue;
            }
            if let Some(rec) = self.afk.get(&user) {
                texts.push(format!(
                    "💤 {} is AFK: {} ({} ago)",
                    mention(&user),
                    rec.reason,
                    format_away(wall.signed_duration_since(rec.since))
                ));
            }
        }

        let text = match parsed {
            Some(cmd) => self.handle_command(event, cmd, &prefix, now, wall),
            None => self.handle_plain(event, now),
        };
        texts.extend(text);
        texts
            .into_iter()
            .map(|t| Reply::new(event.channel_id.clone(), sanitize_mentions(&t)))
            .collect()
    }

    fn handle_plain(&mut self, event: &TextEvent, now: Instant) -> Option<String> {
        let author = event.author_id.as_str();
        if let Some(state) = self.word_chain.channel(&event.channel_id) {
            let word = event.content.trim();
            if state.language.allows_spaces() || !word.contains(char::is_whitespace) {
                return Some(match self.word_chain.submit_word(&event.channel_id, author, word) {
                    Ok(accepted) => format!("✅ {} (#{})", accepted.word, accepted.chain_count),
                    Err(e) => format!("❌ {}", e),
                });
            }
        }
        if !self.cooldowns.allow_chat_xp(author, now) {
            return None;
        }
        let boost = self.shop.equipped_xp_boost(author);
        let (gained, level_up) = self.ledger.award_chat_xp(author, boost, &mut self.rng);
        debug!("chat xp: {} +{}", author, gained);
        level_up.map(|up| render::level_up(author, &up))
    }

    /// Capability taken from the account, so an owner grant applies everywhere.
    fn capability(&mut self, user_id: &str) -> Capability {
        if self.ledger.is_unlimited(user_id) {
            Capability::Privileged
        } else {
            Capability::Standard
        }
    }

    fn handle_command(
        &mut self,
        event: &TextEvent,
        cmd: Command,
        prefix: &str,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> Option<String> {
        let author = event.author_id.as_str();
        let channel = event.channel_id.as_str();
        match &cmd {
            Command::Unknown(name) if name.is_empty() => return None,
            Command::Unknown(name) => {
                return Some(format!(
                    "❓ Unknown command '{}'. Try {}help",
                    name, prefix
                ))
            }
            Command::Invalid(usage) => return Some(format!("⚠️ usage: {}{}", prefix, usage)),
            _ => {}
        }
        if self.toggles.is_disabled(channel, cmd.name()) {
            return Some(format!("🚫 {}{} is disabled in this channel", prefix, cmd.name()));
        }
        if cmd.owner_only() && !self.privileges.capability(author).is_privileged() {
            warn!(target: "security", "denied {} to {} in {}", cmd.name(), author, channel);
            return Some("⛔ Only bot owners can do that".to_string());
        }
        debug!("{} ran {} in {}", author, cmd.name(), channel);

        let reply = match cmd {
            Command::Help => render::help(prefix),
            Command::Balance(target) => {
                let user = target.as_deref().unwrap_or(author);
                let wallet = self.ledger.balance(user);
                let bank = self.ledger.bank(user);
                render::balance(user, wallet, bank)
            }
            Command::Profile(target) => {
                let user = target.as_deref().unwrap_or(author);
                let account = self.ledger.stats(user);
                let (_, needed) = self.ledger.xp_progress(user);
                render::profile(user, &account, needed, self.pairings.partner(user))
            }
            Command::Daily => {
                let ring = self.shop.equipped_ring_bonus(author);
                match self.ledger.claim_daily(author, ring) {
                    Ok(reward) => render::daily(author, &reward),
                    Err(e) => format!("⏳ {}", e),
                }
            }
            Command::Deposit(amount) => self.move_coins(author, amount, true),
            Command::Withdraw(amount) => self.move_coins(author, amount, false),
            Command::Pay { target, amount } => match self.ledger.transfer(author, &target, amount) {
                Ok(()) => format!(
                    "💸 {} paid {} {} coins. Balance: {}",
                    mention(author),
                    mention(&target),
                    amount,
                    self.ledger.balance(author)
                ),
                Err(e) => format!("❌ {}", e),
            },
            Command::Leaderboard(metric) => self.leaderboard(metric),
            Command::Coinflip { call, bet } => self.play(author, bet, Game::Coinflip(call), now),
            Command::Slots(bet) => self.play(author, bet, Game::Slots, now),
            Command::Blackjack(bet) => self.play(author, bet, Game::Blackjack, now),
            Command::Shop(category) => render::shop_listing(self.shop.catalog(), category, prefix),
            Command::Buy(item) => match self.shop.purchase(&mut self.ledger, author, &item) {
                Ok(bought) => format!(
                    "🛍️ Bought {} for {} coins. Balance: {}",
                    bought.label(),
                    bought.price,
                    self.ledger.balance(author)
                ),
                Err(e) => format!("❌ {}", e),
            },
            Command::Inventory(target) => {
                let user = target.as_deref().unwrap_or(author);
                let record = self.shop.inventory(user);
                let status = self.shop.capacity_status(user);
                let value = self.shop.inventory_value(user);
                render::inventory(user, &record, &status, self.shop.catalog(), value)
            }
            Command::Equip(item) => match self.shop.equip(author, &item) {
                Ok(outcome) => {
                    let mut text = format!("✅ Equipped {} ({})", self.label(&outcome.item_id), outcome.slot);
                    if let Some(old) = outcome.displaced {
                        text.push_str(&format!(", {} back in your bag", self.label(&old)));
                    }
                    text
                }
                Err(e) => format!("❌ {}", e),
            },
            Command::Unequip(slot) => match self.shop.unequip(author, slot) {
                Ok(id) => format!("✅ Unequipped {}", self.label(&id)),
                Err(e) => format!("❌ {}", e),
            },
            Command::Use(item) => self.use_item(author, &item),
            Command::Open(item) => match self.shop.open_lootbox(author, &item, &mut self.rng) {
                Ok(report) => {
                    self.ledger.credit(author, report.coins, false);
                    render::loot(author, &report, self.shop.catalog())
                }
                Err(e) => format!("❌ {}", e),
            },
            Command::Gift { target, item, qty } => {
                match self.shop.give_item(author, &target, &item, qty) {
                    Ok(()) => format!(
                        "🎁 {} gave {}x {} to {}",
                        mention(author),
                        qty,
                        self.label(&item),
                        mention(&target)
                    ),
                    Err(e) => format!("❌ {}", e),
                }
            }
            Command::Marry(target) => self.propose(author, &target, prefix, now),
            Command::Accept => self.accept(author, now),
            Command::Reject => match self.proposals.take(author, now) {
                Some(p) => format!("💔 {} declined {}", mention(author), mention(&p.proposer_id)),
                None => "No pending proposal for you".to_string(),
            },
            Command::Divorce => match self.pairings.unpair(author) {
                Ok(former) => format!("💔 {} and {} went their separate ways", mention(author), mention(&former)),
                Err(e) => format!("❌ {}", e),
            },
            Command::Partner(target) => {
                let user = target.as_deref().unwrap_or(author);
                match self.pairings.record(user) {
                    Some(rec) => format!(
                        "💞 {} is paired with {} since {}",
                        mention(user),
                        mention(&rec.partner_id),
                        rec.paired_at.format("%Y-%m-%d")
                    ),
                    None => format!("{} is not paired", mention(user)),
                }
            }
            Command::WordChain(sub) => self.word_chain_command(channel, author, sub),
            Command::Disable(name) => match self.toggles.disable(channel, &name) {
                Ok(true) => format!("🚫 {}{} disabled in this channel", prefix, name),
                Ok(false) => format!("{}{} was already disabled here", prefix, name),
                Err(e) => format!("❌ {}", e),
            },
            Command::Enable(name) => match self.toggles.enable(channel, &name) {
                Ok(true) => format!("✅ {}{} enabled in this channel", prefix, name),
                Ok(false) => format!("{}{} was not disabled here", prefix, name),
                Err(e) => format!("❌ {}", e),
            },
            Command::Disabled => {
                let names = self.toggles.disabled_in(channel);
                if names.is_empty() {
                    "Every command is enabled here".to_string()
                } else {
                    format!("🚫 Disabled here: {}", names.join(", "))
                }
            }
            Command::Prefix(None) => format!("Prefix here is `{}`", prefix),
            Command::Prefix(Some(new)) if new.eq_ignore_ascii_case("reset") => {
                self.toggles.reset_prefix(&event.guild_id);
                format!("Prefix reset to `{}`", self.config.bot.prefix)
            }
            Command::Prefix(Some(new)) => match self.toggles.set_prefix(&event.guild_id, &new) {
                Ok(()) => format!("Prefix set to `{}`", new),
                Err(e) => format!("❌ {}", e),
            },
            Command::GrantUnlimited { target, enabled } => {
                self.ledger.set_unlimited(&target, enabled);
                self.shop.set_unlimited_slots(&target, enabled);
                format!(
                    "♾️ Unlimited {} for {}",
                    if enabled { "granted" } else { "revoked" },
                    mention(&target)
                )
            }
            Command::SetLevel { target, level } => match self.ledger.set_level(&target, level) {
                Ok(()) => format!("Level of {} set to {}", mention(&target), level),
                Err(e) => format!("❌ {}", e),
            },
            Command::AddCoins { target, amount } => {
                self.ledger.credit(&target, amount, false);
                info!(target: "security", "{} added {} coins to {}", author, amount, target);
                format!("💰 Added {} coins to {}", amount, mention(&target))
            }
            Command::Afk(reason) => {
                let rec = self.afk.set(author, reason.as_deref(), wall);
                format!("💤 {} is now AFK: {}", mention(author), rec.reason)
            }
            Command::Mute {
                target,
                minutes,
                reason,
            } => self.mute(&event.guild_id, &target, minutes, reason, wall),
            Command::Unmute(target) => {
                if self.mutes.unmute(&event.guild_id, &target) {
                    format!("🔊 Unmuted {}", mention(&target))
                } else {
                    format!("{} is not muted", mention(&target))
                }
            }
            Command::CheckMute(target) => {
                let user = target.as_deref().unwrap_or(author);
                match self.mutes.active(&event.guild_id, user, wall) {
                    Some(rec) => format!(
                        "🔇 {} is muted for {} more ({})",
                        mention(user),
                        format_remaining(rec.remaining(wall)),
                        rec.reason.as_deref().unwrap_or("no reason given")
                    ),
                    None => format!("{} is not muted", mention(user)),
                }
            }
            Command::MuteList => render::mute_list(&self.mutes.muted_in(&event.guild_id, wall), wall),
            Command::Unknown(_) | Command::Invalid(_) => return None,
        };
        Some(reply)
    }

    fn label(&self, item_id: &str) -> String {
        self.shop
            .catalog()
            .find(item_id)
            .map(|i| i.label())
            .unwrap_or_else(|| item_id.to_string())
    }

    fn move_coins(&mut self, author: &str, amount: BetAmount, to_bank: bool) -> String {
        let funds = if to_bank {
            self.ledger.balance(author)
        } else {
            self.ledger.bank(author)
        };
        let amount = match amount.resolve(funds) {
            Ok(v) => v,
            Err(e) => return format!("❌ {}", e),
        };
        let result = if to_bank {
            self.ledger.deposit(author, amount)
        } else {
            self.ledger.withdraw(author, amount)
        };
        match result {
            Ok(()) => format!(
                "🏦 {} {} coins. {}",
                if to_bank { "Deposited" } else { "Withdrew" },
                amount,
                render::balance(author, self.ledger.balance(author), self.ledger.bank(author))
            ),
            Err(e) => format!("❌ {}", e),
        }
    }

    fn leaderboard(&self, metric: LeaderboardMetric) -> String {
        render::leaderboard(metric, &self.ledger.leaderboard(metric, LEADERBOARD_ROWS))
    }

    /// Validate, rate-limit, play, apply any pending luck and settle one casino game.
    fn play(&mut self, author: &str, bet: BetAmount, game: Game, now: Instant) -> String {
        let stake = match bet.resolve(self.ledger.balance(author)) {
            Ok(v) => v,
            Err(e) => return format!("❌ {}", e),
        };
        if !self.cooldowns.allow_casino(author, now) {
            let wait = self.cooldowns.casino_wait(author, now);
            return format!("⏳ Slow down, try again in {:.1}s", wait.as_secs_f64());
        }
        let luck = self.cooldowns.take_luck(author);
        let (played, lucky) = with_luck(
            &mut self.rng,
            luck,
            |r| match game {
                Game::Coinflip(call) => Played::Coinflip(casino::coinflip(call, stake, r)),
                Game::Slots => Played::Slots(casino::spin_slots(stake, r)),
                Game::Blackjack => Played::Blackjack(casino::play_blackjack(stake, r)),
            },
            Played::settlement,
        );
        let settlement = played.settlement();
        if let Err(e) = self.ledger.settle(author, settlement) {
            warn!("casino: settle failed for {}: {}", author, e);
            return format!("❌ {}", e);
        }
        let net = settlement.net();
        info!("casino: {} {:?} stake {} net {}", author, game, stake, net);
        let wallet = self.ledger.balance(author);
        match &played {
            Played::Coinflip(out) => render::coinflip(out, net, wallet, lucky),
            Played::Slots(out) => render::slots(out, net, wallet, lucky),
            Played::Blackjack(out) => render::blackjack(out, net, wallet, lucky),
        }
    }

    fn use_item(&mut self, author: &str, item: &str) -> String {
        match self.shop.use_item(author, item, &mut self.rng) {
            Ok(UseOutcome::Lootbox(report)) => {
                self.ledger.credit(author, report.coins, false);
                render::loot(author, &report, self.shop.catalog())
            }
            Ok(UseOutcome::CapacityGranted {
                kind,
                amount,
                capacity,
            }) => format!("🎒 +{} {} slot(s), capacity now {}", amount, kind, capacity),
            Ok(UseOutcome::Effect(ItemEffect::WinRateBoost { pct })) => {
                let total = self.cooldowns.add_luck(author, pct);
                format!(
                    "🍀 +{}% luck on your next casino game (now {}%)",
                    pct, total
                )
            }
            Ok(UseOutcome::Effect(effect)) => format!("✨ {}", effect.describe()),
            Err(e) => format!("❌ {}", e),
        }
    }

    fn mute(
        &mut self,
        guild: &str,
        target: &str,
        minutes: u32,
        reason: Option<String>,
        wall: DateTime<Utc>,
    ) -> String {
        if self.privileges.is_owner(target) {
            return format!("❌ {}", MuteError::Protected);
        }
        match self.mutes.mute(guild, target, minutes, reason, wall) {
            Ok(rec) => {
                let why = rec
                    .reason
                    .as_deref()
                    .map(|r| format!(" ({})", r))
                    .unwrap_or_default();
                format!("🔇 Muted {} for {}m{}", mention(target), minutes, why)
            }
            Err(e) => format!("❌ {}", e),
        }
    }

    /// Pick the cheapest ring the proposer holds.
    fn ring_for(&self, user_id: &str) -> Option<String> {
        self.shop
            .catalog()
            .items_in(Category::Ring)
            .find(|item| self.shop.has_item(user_id, &item.id))
            .map(|item| item.id.clone())
    }

    fn propose(&mut self, author: &str, target: &str, prefix: &str, now: Instant) -> String {
        let capability = self.capability(author);
        if let Err(e) = self.pairings.propose(author, target, capability) {
            return format!("❌ {}", e);
        }
        let ring = self.ring_for(author);
        if ring.is_none() && !capability.is_privileged() {
            return format!("💍 You need a ring to propose. See {}shop rings", prefix);
        }
        let ring_text = ring
            .as_deref()
            .map(|r| format!(" with {}", self.label(r)))
            .unwrap_or_default();
        if !self.proposals.offer(target, author, ring, now) {
            return format!("{} already has a pending proposal", mention(target));
        }
        format!(
            "💍 {} proposed to {}{}! {}, reply {}accept or {}reject within {}s",
            mention(author),
            mention(target),
            ring_text,
            mention(target),
            prefix,
            prefix,
            self.proposals.timeout().as_secs()
        )
    }

    fn accept(&mut self, author: &str, now: Instant) -> String {
        let Some(proposal) = self.proposals.take(author, now) else {
            return "No pending proposal for you".to_string();
        };
        let proposer = proposal.proposer_id.as_str();
        if let Some(ring) = &proposal.ring_item_id {
            if !self.shop.has_item(proposer, ring) {
                return format!("💔 {} no longer has the ring", mention(proposer));
            }
        }
        let capability = self.capability(proposer);
        let outcome = match self.pairings.pair(
            proposer,
            author,
            proposal.ring_item_id.as_deref(),
            capability,
            Utc::now(),
        ) {
            Ok(outcome) => outcome,
            Err(e) => return format!("❌ {}", e),
        };
        if let Some(ring) = &proposal.ring_item_id {
            if let Err(e) = self.shop.remove_item(proposer, ring, 1) {
                warn!("pairing: could not consume {} from {}: {}", ring, proposer, e);
            }
        }
        let mut text = format!("💞 {} and {} are now paired!", mention(proposer), mention(author));
        for former in [outcome.auto_unpaired, outcome.released_own_partner]
            .into_iter()
            .flatten()
        {
            text.push_str(&format!(" {} is single again.", mention(&former)));
        }
        text
    }

    fn word_chain_command(&mut self, channel: &str, author: &str, sub: WordChainCommand) -> String {
        match sub {
            WordChainCommand::Start(language) => {
                let language = language.unwrap_or(self.default_language);
                if self.word_chain.enable(channel, language, Utc::now()) {
                    format!("🔤 Word chain started ({}). Type any word to begin!", language)
                } else {
                    format!("🔤 Word chain language set to {}", language)
                }
            }
            WordChainCommand::Stop => {
                if self.word_chain.disable(channel) {
                    "🔤 Word chain stopped".to_string()
                } else {
                    "Word chain is not running here".to_string()
                }
            }
            WordChainCommand::Restart => {
                if self.word_chain.restart(channel) {
                    "🔤 Word chain restarted. Type any word to begin!".to_string()
                } else {
                    "Word chain is not running here".to_string()
                }
            }
            WordChainCommand::Stats(target) => {
                let user = target.as_deref().unwrap_or(author);
                let stats = self.word_chain.user_stats(user);
                format!(
                    "🔤 {} ⟶ {} words, best chain #{}",
                    mention(user),
                    stats.total_words,
                    stats.longest_chain
                )
            }
            WordChainCommand::Top => render::word_chain_top(&self.word_chain.leaderboard(LEADERBOARD_ROWS)),
        }
    }
}

/// Play once; on a loss with pending luck, replay once with probability `luck / 100`.
fn with_luck<T>(
    rng: &mut StdRng,
    luck: Option<f64>,
    mut play: impl FnMut(&mut StdRng) -> T,
    settle: impl Fn(&T) -> Settlement,
) -> (T, bool) {
    let first = play(rng);
    match (settle(&first), luck) {
        (Settlement::Loss(_), Some(pct)) if rng.gen_bool((pct / 100.0).clamp(0.0, 1.0)) => {
            debug!("casino: luck reroll ({}%)", pct);
            (play(rng), true)
        }
        _ => (first, false),
    }
}

/// Log an inbound event without leaking control characters into the log.
pub(crate) fn log_event(event: &TextEvent) {
    debug!(
        "event g={} c={} u={}: {}",
        event.guild_id,
        event.channel_id,
        event.author_id,
        escape_log(&event.content)
    );
}
