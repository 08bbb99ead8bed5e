//! Test utilities & fixtures.
//! Every test gets its own temp data directory; nothing under `tests/` is mutated.
#![allow(dead_code)]

use std::path::Path;

use tavernbot::bot::{Bot, Reply, TextEvent};
use tavernbot::config::Config;

pub const OWNER: &str = "1000";
pub const GUILD: &str = "guild";
pub const CHANNEL: &str = "general";

/// Default config rooted at `dir`, one owner, no log files and no casino cooldown.
pub fn config_in(dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = dir.to_string_lossy().to_string();
    config.bot.owner_ids = vec![OWNER.to_string()];
    config.logging.file = None;
    config.logging.security_file = None;
    config.games.casino_cooldown_ms = 0;
    config
}

pub fn bot_in(dir: &Path) -> Bot {
    Bot::open_seeded(config_in(dir), 7).expect("bot")
}

pub fn say(bot: &mut Bot, user: &str, text: &str) -> Vec<Reply> {
    say_in(bot, CHANNEL, user, text)
}

pub fn say_in(bot: &mut Bot, channel: &str, user: &str, text: &str) -> Vec<Reply> {
    bot.route_text_event(&TextEvent::new(GUILD, channel, user, text))
}

/// Text of the single reply a command is expected to produce.
pub fn reply(bot: &mut Bot, user: &str, text: &str) -> String {
    let replies = say(bot, user, text);
    assert_eq!(replies.len(), 1, "expected one reply to {:?}, got {:?}", text, replies);
    replies[0].text.clone()
}
