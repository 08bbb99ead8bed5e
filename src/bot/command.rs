//! Prefix command parser.
//!
//! A message is a command only when it starts with the guild's prefix. The first word
//! selects the command (case-insensitive, with aliases) and the rest are arguments.
//! User arguments accept chat mentions (`<@123>`, `<@!123>`) or bare IDs.
use log::trace;

use crate::casino::{BetAmount, CoinSide};
use crate::economy::LeaderboardMetric;
use crate::games::Language;
use crate::shop::{Category, Slot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordChainCommand {
    Start(Option<Language>),
    Stop,
    Restart,
    Stats(Option<String>),
    Top,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Balance(Option<String>),
    Profile(Option<String>),
    Daily,
    Deposit(BetAmount),
    Withdraw(BetAmount),
    Pay { target: String, amount: u64 },
    Leaderboard(LeaderboardMetric),
    Coinflip { call: CoinSide, bet: BetAmount },
    Slots(BetAmount),
    Blackjack(BetAmount),
    Shop(Option<Category>),
    Buy(String),
    Inventory(Option<String>),
    Equip(String),
    Unequip(Slot),
    Use(String),
    Open(String),
    Gift { target: String, item: String, qty: u32 },
    Marry(String),
    Accept,
    Reject,
    Divorce,
    Partner(Option<String>),
    WordChain(WordChainCommand),
    Disable(String),
    Enable(String),
    Disabled,
    Prefix(Option<String>),
    GrantUnlimited { target: String, enabled: bool },
    SetLevel { target: String, level: u32 },
    AddCoins { target: String, amount: u64 },
    Afk(Option<String>),
    Mute { target: String, minutes: u32, reason: Option<String> },
    Unmute(String),
    CheckMute(Option<String>),
    MuteList,
    Unknown(String),
    Invalid(String),
}

/// Canonical names of every command that can be disabled per channel.
pub const TOGGLEABLE: &[&str] = &[
    "help",
    "balance",
    "profile",
    "daily",
    "deposit",
    "withdraw",
    "pay",
    "leaderboard",
    "coinflip",
    "slots",
    "blackjack",
    "shop",
    "buy",
    "inventory",
    "equip",
    "unequip",
    "use",
    "open",
    "gift",
    "marry",
    "accept",
    "reject",
    "divorce",
    "partner",
    "wordchain",
    "afk",
    "checkmute",
    "mutelist",
];

impl Command {
    /// Canonical name used for per-channel disabling.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Balance(_) => "balance",
            Command::Profile(_) => "profile",
            Command::Daily => "daily",
            Command::Deposit(_) => "deposit",
            Command::Withdraw(_) => "withdraw",
            Command::Pay { .. } => "pay",
            Command::Leaderboard(_) => "leaderboard",
            Command::Coinflip { .. } => "coinflip",
            Command::Slots(_) => "slots",
            Command::Blackjack(_) => "blackjack",
            Command::Shop(_) => "shop",
            Command::Buy(_) => "buy",
            Command::Inventory(_) => "inventory",
            Command::Equip(_) => "equip",
            Command::Unequip(_) => "unequip",
            Command::Use(_) => "use",
            Command::Open(_) => "open",
            Command::Gift { .. } => "gift",
            Command::Marry(_) => "marry",
            Command::Accept => "accept",
            Command::Reject => "reject",
            Command::Divorce => "divorce",
            Command::Partner(_) => "partner",
            Command::WordChain(_) => "wordchain",
            Command::Disable(_) => "disable",
            Command::Enable(_) => "enable",
            Command::Disabled => "disabled",
            Command::Prefix(_) => "prefix",
            Command::GrantUnlimited { .. } => "unlimited",
            Command::SetLevel { .. } => "setlevel",
            Command::AddCoins { .. } => "addcoins",
            Command::Afk(_) => "afk",
            Command::Mute { .. } => "mute",
            Command::Unmute(_) => "unmute",
            Command::CheckMute(_) => "checkmute",
            Command::MuteList => "mutelist",
            Command::Unknown(_) => "unknown",
            Command::Invalid(_) => "invalid",
        }
    }

    /// Commands reserved for the owner allow-list.
    pub fn owner_only(&self) -> bool {
        matches!(
            self,
            Command::Disable(_)
                | Command::Enable(_)
                | Command::Prefix(Some(_))
                | Command::GrantUnlimited { .. }
                | Command::SetLevel { .. }
                | Command::AddCoins { .. }
                | Command::Mute { .. }
                | Command::Unmute(_)
        )
    }
}

/// Resolve an alias to its canonical command name.
pub fn canonical_name(word: &str) -> Option<&'static str> {
    let name = match word.to_ascii_lowercase().as_str() {
        "help" | "h" | "commands" => "help",
        "balance" | "bal" | "money" | "wallet" => "balance",
        "profile" | "stats" | "level" | "rank" => "profile",
        "daily" => "daily",
        "deposit" | "dep" => "deposit",
        "withdraw" | "with" | "wd" => "withdraw",
        "pay" | "transfer" | "send" => "pay",
        "leaderboard" | "lb" | "top" => "leaderboard",
        "coinflip" | "cf" | "flip" => "coinflip",
        "slots" | "slot" | "sl" => "slots",
        "blackjack" | "bj" => "blackjack",
        "shop" | "store" => "shop",
        "buy" => "buy",
        "inventory" | "inv" | "bag" => "inventory",
        "equip" | "wear" => "equip",
        "unequip" | "unwear" => "unequip",
        "use" => "use",
        "open" => "open",
        "gift" | "giveitem" => "gift",
        "marry" | "propose" => "marry",
        "accept" => "accept",
        "reject" | "decline" => "reject",
        "divorce" => "divorce",
        "partner" | "spouse" => "partner",
        "wordchain" | "wc" => "wordchain",
        "disable" => "disable",
        "enable" => "enable",
        "disabled" => "disabled",
        "prefix" | "setprefix" => "prefix",
        "unlimited" => "unlimited",
        "setlevel" => "setlevel",
        "addcoins" | "addmoney" => "addcoins",
        "afk" | "away" => "afk",
        "mute" => "mute",
        "unmute" => "unmute",
        "checkmute" | "muteinfo" => "checkmute",
        "mutelist" | "mutes" => "mutelist",
        _ => return None,
    };
    Some(name)
}

/// Strip mention syntax from a user argument.
pub fn parse_user(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let id = raw
        .strip_prefix("<@")
        .and_then(|s| s.strip_suffix('>'))
        .map(|s| s.trim_start_matches('!'))
        .unwrap_or(raw);
    if id.is_empty() || id.starts_with('<') || id.contains(char::is_whitespace) {
        None
    } else {
        Some(id.to_string())
    }
}

/// Every user mentioned as `<@id>` or `<@!id>` in free text, in order, without repeats.
pub fn mentioned_users(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("<@") {
        let tail = &rest[start..];
        let Some(end) = tail.find('>') else {
            break;
        };
        if let Some(id) = parse_user(&tail[..=end]) {
            if id.chars().all(|c| c.is_ascii_alphanumeric()) && !found.contains(&id) {
                found.push(id);
            }
        }
        rest = &tail[end + 1..];
    }
    found
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `raw` against `prefix`. Returns `None` for ordinary chat.
    pub fn parse(&self, prefix: &str, raw: &str) -> Option<Command> {
        let trimmed = raw.trim();
        let body = trimmed.strip_prefix(prefix)?;
        let mut words = body.split_whitespace();
        let Some(head) = words.next() else {
            return Some(Command::Unknown(String::new()));
        };
        let args: Vec<&str> = words.collect();
        let cmd = match canonical_name(head) {
            Some(name) => build(name, &args),
            None => Command::Unknown(head.to_string()),
        };
        trace!("Parsed {:?} from '{}'", cmd, raw);
        Some(cmd)
    }
}

fn invalid(usage: &str) -> Command {
    Command::Invalid(usage.to_string())
}

/// Free text made of the arguments from `from` on.
fn rest_from(args: &[&str], from: usize) -> Option<String> {
    args.get(from..)
        .filter(|rest| !rest.is_empty())
        .map(|rest| rest.join(" "))
}

fn bet_arg(args: &[&str], usage: &str, make: fn(BetAmount) -> Command) -> Command {
    match args.first().and_then(|a| BetAmount::parse(a)) {
        Some(bet) => make(bet),
        None => invalid(usage),
    }
}

fn build(name: &str, args: &[&str]) -> Command {
    let user_at = |i: usize| args.get(i).and_then(|a| parse_user(a));
    match name {
        "help" => Command::Help,
        "balance" => Command::Balance(user_at(0)),
        "profile" => Command::Profile(user_at(0)),
        "daily" => Command::Daily,
        "deposit" => bet_arg(args, "deposit <amount|all>", Command::Deposit),
        "withdraw" => bet_arg(args, "withdraw <amount|all>", Command::Withdraw),
        "pay" => match (user_at(0), args.get(1).and_then(|a| a.parse::<u64>().ok())) {
            (Some(target), Some(amount)) => Command::Pay { target, amount },
            _ => invalid("pay <@user> <amount>"),
        },
        "leaderboard" => match LeaderboardMetric::parse(args.first().copied().unwrap_or("")) {
            Some(metric) => Command::Leaderboard(metric),
            None => invalid("leaderboard [balance|level|streak|wins]"),
        },
        "coinflip" => {
            let first = args.first().copied().unwrap_or("");
            let second = args.get(1).copied().unwrap_or("");
            let parsed = match (CoinSide::parse(first), BetAmount::parse(second)) {
                (Some(call), Some(bet)) => Some((call, bet)),
                _ => CoinSide::parse(second).zip(BetAmount::parse(first)),
            };
            match parsed {
                Some((call, bet)) => Command::Coinflip { call, bet },
                None => invalid("coinflip <heads|tails> <amount|all>"),
            }
        }
        "slots" => bet_arg(args, "slots <amount|all>", Command::Slots),
        "blackjack" => bet_arg(args, "blackjack <amount|all>", Command::Blackjack),
        "shop" => match args.first() {
            None => Command::Shop(None),
            Some(raw) => match Category::parse(raw) {
                Some(cat) => Command::Shop(Some(cat)),
                None => invalid("shop [rings|lootboxes|consumables|collectibles|pets|upgrades]"),
            },
        },
        "buy" | "equip" | "use" | "open" => match args.first() {
            Some(item) => {
                let item = item.to_ascii_lowercase();
                match name {
                    "buy" => Command::Buy(item),
                    "equip" => Command::Equip(item),
                    "use" => Command::Use(item),
                    _ => Command::Open(item),
                }
            }
            None => invalid(&format!("{} <item_id>", name)),
        },
        "unequip" => match args.first().and_then(|a| Slot::parse(a)) {
            Some(slot) => Command::Unequip(slot),
            None => invalid("unequip <ring|pet>"),
        },
        "inventory" => Command::Inventory(user_at(0)),
        "gift" => {
            let qty = match args.get(2) {
                None => Some(1),
                Some(raw) => raw.parse::<u32>().ok(),
            };
            match (user_at(0), args.get(1), qty) {
                (Some(target), Some(item), Some(qty)) => Command::Gift {
                    target,
                    item: item.to_ascii_lowercase(),
                    qty,
                },
                _ => invalid("gift <@user> <item_id> [qty]"),
            }
        }
        "marry" => match user_at(0) {
            Some(target) => Command::Marry(target),
            None => invalid("marry <@user>"),
        },
        "accept" => Command::Accept,
        "reject" => Command::Reject,
        "divorce" => Command::Divorce,
        "partner" => Command::Partner(user_at(0)),
        "wordchain" => {
            let sub = args.first().map(|s| s.to_ascii_lowercase());
            let wc = match sub.as_deref() {
                Some("start") | Some("on") => {
                    match args.get(1) {
                        None => WordChainCommand::Start(None),
                        Some(raw) => match Language::parse(raw) {
                            Some(lang) => WordChainCommand::Start(Some(lang)),
                            None => return invalid("wordchain start [en|vi]"),
                        },
                    }
                }
                Some("stop") | Some("off") => WordChainCommand::Stop,
                Some("restart") | Some("reset") => WordChainCommand::Restart,
                Some("stats") => WordChainCommand::Stats(user_at(1)),
                Some("top") | Some("lb") => WordChainCommand::Top,
                _ => return invalid("wordchain <start [en|vi]|stop|restart|stats|top>"),
            };
            Command::WordChain(wc)
        }
        "disable" | "enable" => match args.first() {
            Some(target) => {
                let target = canonical_name(target)
                    .map(str::to_string)
                    .unwrap_or_else(|| target.to_ascii_lowercase());
                if name == "disable" {
                    Command::Disable(target)
                } else {
                    Command::Enable(target)
                }
            }
            None => invalid(&format!("{} <command>", name)),
        },
        "disabled" => Command::Disabled,
        "prefix" => Command::Prefix(args.first().map(|s| s.to_string())),
        "unlimited" => {
            let enabled = match args.get(1).map(|s| s.to_ascii_lowercase()) {
                None => Some(true),
                Some(flag) => match flag.as_str() {
                    "on" | "true" | "yes" => Some(true),
                    "off" | "false" | "no" => Some(false),
                    _ => None,
                },
            };
            match (user_at(0), enabled) {
                (Some(target), Some(enabled)) => Command::GrantUnlimited { target, enabled },
                _ => invalid("unlimited <@user> [on|off]"),
            }
        }
        "setlevel" => match (user_at(0), args.get(1).and_then(|a| a.parse::<u32>().ok())) {
            (Some(target), Some(level)) => Command::SetLevel { target, level },
            _ => invalid("setlevel <@user> <level>"),
        },
        "addcoins" => match (user_at(0), args.get(1).and_then(|a| a.parse::<u64>().ok())) {
            (Some(target), Some(amount)) => Command::AddCoins { target, amount },
            _ => invalid("addcoins <@user> <amount>"),
        },
        "afk" => Command::Afk(rest_from(args, 0)),
        "mute" => match (user_at(0), args.get(1).and_then(|a| a.parse::<u32>().ok())) {
            (Some(target), Some(minutes)) => Command::Mute {
                target,
                minutes,
                reason: rest_from(args, 2),
            },
            _ => invalid("mute <@user> <minutes> [reason]"),
        },
        "unmute" => match user_at(0) {
            Some(target) => Command::Unmute(target),
            None => invalid("unmute <@user>"),
        },
        "checkmute" => Command::CheckMute(user_at(0)),
        "mutelist" => Command::MuteList,
        other => Command::Unknown(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        let p = CommandParser::new();
        assert_eq!(p.parse("!", "hello there"), None);
        assert_eq!(p.parse("!", "!"), Some(Command::Unknown(String::new())));
    }

    #[test]
    fn mentions_are_stripped() {
        assert_eq!(parse_user("<@123>").as_deref(), Some("123"));
        assert_eq!(parse_user("<@!456>").as_deref(), Some("456"));
        assert_eq!(parse_user("bob").as_deref(), Some("bob"));
        assert_eq!(parse_user("<#chan"), None);
    }

    #[test]
    fn mute_and_afk_arguments() {
        let p = CommandParser::new();
        assert_eq!(
            p.parse("!", "!mute <@42> 15 too loud"),
            Some(Command::Mute {
                target: "42".into(),
                minutes: 15,
                reason: Some("too loud".into())
            })
        );
        assert!(matches!(p.parse("!", "!mute <@42> soon"), Some(Command::Invalid(_))));
        assert_eq!(p.parse("!", "!afk"), Some(Command::Afk(None)));
        assert_eq!(
            p.parse("!", "!away gone fishing"),
            Some(Command::Afk(Some("gone fishing".into())))
        );
    }

    #[test]
    fn mentions_in_free_text() {
        assert_eq!(
            mentioned_users("hey <@1> and <@!2>, <@1> again <#3> <@oops"),
            vec!["1".to_string(), "2".to_string()]
        );
        assert!(mentioned_users("no pings here").is_empty());
    }

    #[test]
    fn every_toggleable_name_resolves_to_itself() {
        for name in TOGGLEABLE {
            assert_eq!(canonical_name(name), Some(*name));
        }
    }
}
