mod common;

use std::time::{Duration, Instant};

use common::{bot_in, config_in, reply, say, say_in, CHANNEL, GUILD, OWNER};
use tavernbot::bot::{Bot, TextEvent};
use tavernbot::economy::Funds;

#[test]
fn disabled_commands_are_refused_per_channel() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = bot_in(tmp.path());

    let text = reply(&mut bot, OWNER, "!disable cf");
    assert!(text.contains("!coinflip disabled"), "{}", text);
    let text = reply(&mut bot, "u", "!coinflip heads 10");
    assert!(text.contains("disabled in this channel"), "{}", text);
    assert_eq!(bot.ledger().account("u").map(|a| a.wins + a.losses), None);

    let other = say_in(&mut bot, "elsewhere", "u", "!cf heads 10");
    assert!(other[0].text.contains("Called heads"), "{:?}", other);

    assert!(reply(&mut bot, OWNER, "!disable disable").contains("cannot be disabled"));
    assert!(reply(&mut bot, OWNER, "!disabled").contains("coinflip"));
    assert!(reply(&mut bot, OWNER, "!enable coinflip").contains("enabled"));
    assert!(reply(&mut bot, OWNER, "!disabled").contains("Every command"));
}

#[test]
fn toggles_and_prefixes_persist() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let mut bot = bot_in(tmp.path());
        reply(&mut bot, OWNER, "!disable slots");
        assert!(reply(&mut bot, OWNER, "!prefix $").contains("Prefix set"));
        assert!(say(&mut bot, "u", "!balance").is_empty());
    }
    let mut bot = bot_in(tmp.path());
    assert!(bot.toggles().is_disabled(CHANNEL, "slots"));
    assert!(reply(&mut bot, "u", "$balance").contains("Wallet: 1000"));
    assert!(reply(&mut bot, OWNER, "$prefix waytoolongprefix").contains("1 to 10"));
    reply(&mut bot, OWNER, "$prefix reset");
    assert!(reply(&mut bot, "u", "!bal").contains("Wallet"));
}

#[test]
fn non_owners_cannot_use_owner_commands() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = bot_in(tmp.path());
    for cmd in ["!disable slots", "!prefix ?", "!unlimited <@u>", "!setlevel u 5", "!addcoins u 5"] {
        assert!(reply(&mut bot, "u", cmd).contains("Only bot owners"), "{}", cmd);
    }
    assert!(reply(&mut bot, "u", "!prefix").contains("`!`"));

    reply(&mut bot, OWNER, "!unlimited <@u>");
    assert_eq!(bot.ledger_mut().balance("u"), Funds::Unlimited);
    assert!(bot.shop_mut().capacity_status("u").unlimited);
    reply(&mut bot, OWNER, "!unlimited <@u> off");
    assert_eq!(bot.ledger_mut().balance("u"), Funds::Amount(1000));

    reply(&mut bot, OWNER, "!setlevel <@u> 7");
    assert_eq!(bot.ledger().account("u").unwrap().level, 7);
}

#[test]
fn casino_cooldown_and_bet_validation() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = config_in(tmp.path());
    config.games.casino_cooldown_ms = 1500;
    let mut bot = Bot::open_seeded(config, 9).unwrap();
    let t0 = Instant::now();
    let play = |bot: &mut Bot, text: &str, at: Instant| {
        bot.route_at(&TextEvent::new(GUILD, CHANNEL, "u", text), at)[0]
            .text
            .clone()
    };

    assert!(play(&mut bot, "!slots 5000", t0).contains("exceeds wallet"));
    assert!(play(&mut bot, "!slots 0", t0).contains("greater than zero"));
    assert!(play(&mut bot, "!bj 10", t0).contains("🃏"));
    assert!(play(&mut bot, "!bj 10", t0 + Duration::from_millis(200)).contains("Slow down"));
    assert!(play(&mut bot, "!slots 100", t0 + Duration::from_secs(2)).contains("🎰"));
    assert!(play(&mut bot, "!cf 10 tails", t0 + Duration::from_secs(4)).contains("Called tails"));
}

#[test]
fn luck_consumable_is_spent_by_the_next_game() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = bot_in(tmp.path());
    bot.ledger_mut().credit("u", 30_000, false);
    reply(&mut bot, "u", "!buy horseshoe");
    let text = reply(&mut bot, "u", "!use horseshoe");
    assert!(text.contains("+30% luck"), "{}", text);
    assert!(!bot.shop().has_item("u", "horseshoe"));
    assert!(reply(&mut bot, "u", "!use horseshoe").contains("don't have"));
    reply(&mut bot, "u", "!cf heads 10");
    let text = reply(&mut bot, "u", "!use gem");
    assert!(text.contains("don't have"));
}

#[test]
fn replies_cannot_mass_mention() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = bot_in(tmp.path());
    let text = reply(&mut bot, "u", "!@everyone");
    assert!(text.contains("@\u{200B}everyone"), "{}", text);
}

#[test]
fn invalid_arguments_show_usage() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = bot_in(tmp.path());
    assert!(reply(&mut bot, "u", "!cf sideways 10").contains("usage: !coinflip"));
    assert!(reply(&mut bot, "u", "!pay bob lots").contains("usage: !pay"));
    assert!(reply(&mut bot, "u", "!nonsense").contains("Unknown command"));
    assert!(say(&mut bot, "u", "!").is_empty());
}

#[test]
fn economy_commands_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = bot_in(tmp.path());
    assert!(reply(&mut bot, "u", "!daily").contains("claimed"));
    assert!(reply(&mut bot, "u", "!daily").contains("next claim in"));
    assert!(reply(&mut bot, "u", "!dep all").contains("Deposited"));
    assert_eq!(bot.ledger_mut().balance("u"), Funds::Amount(0));
    assert!(reply(&mut bot, "u", "!withdraw 100").contains("Wallet: 100"));
    assert!(reply(&mut bot, "u", "!pay <@v> 60").contains("paid <@v> 60"));
    assert!(reply(&mut bot, "u", "!pay <@v> 60").contains("not enough coins"));
    let text = reply(&mut bot, "u", "!lb");
    assert!(text.starts_with("🏆 Top balance"), "{}", text);
    assert!(reply(&mut bot, "u", "!profile").contains("Level 1"));
}

#[test]
fn same_seed_gives_the_same_session() {
    let mut config = tavernbot::config::Config::default();
    config.games.casino_cooldown_ms = 0;
    let mut a = Bot::in_memory(config.clone(), 99).unwrap();
    let mut b = Bot::in_memory(config, 99).unwrap();
    for text in ["!daily", "!slots 100", "!cf heads 50"] {
        let ra = a.route_text_event(&TextEvent::new(GUILD, CHANNEL, "u", text));
        let rb = b.route_text_event(&TextEvent::new(GUILD, CHANNEL, "u", text));
        assert_eq!(ra, rb, "{}", text);
    }
    assert_eq!(
        a.ledger().account("u").map(|x| x.base_daily),
        b.ledger().account("u").map(|x| x.base_daily)
    );
}
