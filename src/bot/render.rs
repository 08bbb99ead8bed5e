//! Reply text for every command. Pure functions over engine results.
use chrono::{DateTime, Utc};

use crate::casino::{BlackjackOutcome, BlackjackResult, Card, CoinflipOutcome, SlotsOutcome};
use crate::economy::{Account, DailyReward, Funds, LeaderboardEntry, LeaderboardMetric, LevelUp};
use crate::games::PlayerStats;
use crate::shop::{CapacityStatus, Catalog, Category, InventoryRecord, LootReport, Slot};
use crate::social::{format_remaining, MuteRecord};

const MUTE_LIST_ROWS: usize = 10;

pub fn mention(user_id: &str) -> String {
    format!("<@{}>", user_id)
}

pub fn balance(user_id: &str, wallet: Funds, bank: Funds) -> String {
    format!(
        "💰 {} ⟶ Wallet: {} | Bank: {}",
        mention(user_id),
        wallet,
        bank
    )
}

pub fn profile(user_id: &str, account: &Account, xp_needed: u64, partner: Option<&str>) -> String {
    let mut out = format!(
        "📇 {} ⟶ Level {} ({}/{} XP) | Wallet: {} | Bank: {} | Streak: {} | W/L: {}/{}",
        mention(user_id),
        account.level,
        account.xp,
        xp_needed,
        account.wallet(),
        account.vault(),
        account.daily_streak,
        account.wins,
        account.losses
    );
    if account.level_daily_bonus > 0.0 {
        out.push_str(&format!(" | Daily bonus: +{:.0}%", account.level_daily_bonus));
    }
    if let Some(p) = partner {
        out.push_str(&format!(" | 💞 {}", mention(p)));
    }
    out
}

pub fn daily(user_id: &str, reward: &DailyReward) -> String {
    let mut out = format!(
        "🎁 {} claimed {} coins (streak {}, +{:.2}% streak",
        mention(user_id),
        reward.amount,
        reward.streak,
        reward.streak_bonus_pct
    );
    if reward.level_bonus_pct > 0.0 {
        out.push_str(&format!(", +{:.0}% level", reward.level_bonus_pct));
    }
    if reward.ring_bonus_pct > 0.0 {
        out.push_str(&format!(", +{:.0}% ring", reward.ring_bonus_pct));
    }
    out.push_str(&format!(") and {} XP", reward.xp_gained));
    if let Some(up) = &reward.level_up {
        out.push('\n');
        out.push_str(&level_up(user_id, up));
    }
    out
}

pub fn level_up(user_id: &str, up: &LevelUp) -> String {
    format!(
        "🎉 {} reached level {}! +{} coins, daily bonus +{:.0}%",
        mention(user_id),
        up.to,
        up.coin_reward,
        up.daily_bonus_gained_pct
    )
}

fn result_tail(net: i64, wallet: Funds) -> String {
    match net {
        n if n > 0 => format!("WIN (+{} coins). Balance: {}", n, wallet),
        n if n < 0 => format!("Loss ({} coins). Balance: {}", n, wallet),
        _ => format!("Push. Balance: {}", wallet),
    }
}

pub fn coinflip(outcome: &CoinflipOutcome, net: i64, wallet: Funds, lucky: bool) -> String {
    format!(
        "🪙 Called {} ⟶ landed {}{} - {}",
        outcome.call,
        outcome.landed,
        if lucky { " 🍀" } else { "" },
        result_tail(net, wallet)
    )
}

pub fn slots(outcome: &SlotsOutcome, net: i64, wallet: Funds, lucky: bool) -> String {
    let reels: Vec<&str> = outcome.reels.iter().map(|s| s.emoji()).collect();
    let mult = if outcome.multiplier_tenths > 0 {
        format!(
            " x{}.{}",
            outcome.multiplier_tenths / 10,
            outcome.multiplier_tenths % 10
        )
    } else {
        String::new()
    };
    format!(
        "🎰 {}{} - {}{} - {}",
        reels.join(" | "),
        if lucky { " 🍀" } else { "" },
        outcome.description,
        mult,
        result_tail(net, wallet)
    )
}

fn hand(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn blackjack(outcome: &BlackjackOutcome, net: i64, wallet: Funds, lucky: bool) -> String {
    let verdict = match outcome.result {
        BlackjackResult::Natural => "Blackjack!",
        BlackjackResult::BothNatural => "Both blackjack",
        BlackjackResult::PlayerBust => "Bust",
        BlackjackResult::DealerBust => "Dealer busts",
        BlackjackResult::PlayerHigher => "You win",
        BlackjackResult::DealerHigher => "Dealer wins",
        BlackjackResult::Push => "Tie",
    };
    format!(
        "🃏 You: {} ({}) | Dealer: {} ({}){} - {}. {}",
        hand(&outcome.player),
        outcome.player_total,
        hand(&outcome.dealer),
        outcome.dealer_total,
        if lucky { " 🍀" } else { "" },
        verdict,
        result_tail(net, wallet)
    )
}

pub fn shop_listing(catalog: &Catalog, category: Option<Category>, prefix: &str) -> String {
    let categories: Vec<Category> = match category {
        Some(c) => vec![c],
        None => Category::ALL.to_vec(),
    };
    let mut out = String::from("🛒 Shop");
    for cat in categories {
        out.push_str(&format!("\n[{}]", cat));
        for item in catalog.items_in(cat) {
            out.push_str(&format!(
                "\n  {} `{}` {} coins - {}",
                item.label(),
                item.id,
                item.price,
                item.effect.describe()
            ));
        }
    }
    out.push_str(&format!("\nBuy with {}buy <item_id>", prefix));
    out
}

pub fn inventory(
    user_id: &str,
    record: &InventoryRecord,
    status: &CapacityStatus,
    catalog: &Catalog,
    value: u64,
) -> String {
    let cap = |used: u32, capacity: u32| {
        if status.unlimited {
            format!("{}/∞", used)
        } else {
            format!("{}/{}", used, capacity)
        }
    };
    let mut out = format!(
        "🎒 {} ⟶ Items {} | Pets {} | Value {}",
        mention(user_id),
        cap(status.item_used, status.item_capacity),
        cap(status.pet_used, status.pet_capacity),
        value
    );
    for slot in [Slot::Ring, Slot::Pet] {
        if let Some(id) = record.equipped.get(&slot) {
            let label = catalog.get(id).map(|i| i.label()).unwrap_or_else(|| id.clone());
            out.push_str(&format!("\n  [{}] {}", slot, label));
        }
    }
    if record.items.is_empty() {
        out.push_str("\n  (empty)");
    }
    for (id, qty) in &record.items {
        let label = catalog.get(id).map(|i| i.label()).unwrap_or_else(|| id.clone());
        out.push_str(&format!("\n  {} x{} `{}`", label, qty, id));
    }
    out
}

pub fn loot(user_id: &str, report: &LootReport, catalog: &Catalog) -> String {
    let name = |id: &String| catalog.get(id).map(|i| i.label()).unwrap_or_else(|| id.clone());
    let mut out = format!(
        "🎊 {} opened a {} box: +{} coins",
        mention(user_id),
        report.tier,
        report.coins
    );
    if !report.granted.is_empty() {
        let got: Vec<String> = report.granted.iter().map(name).collect();
        out.push_str(&format!(" | got {}", got.join(", ")));
    }
    if !report.blocked.is_empty() {
        let lost: Vec<String> = report.blocked.iter().map(name).collect();
        out.push_str(&format!(" | no room for {}", lost.join(", ")));
    }
    out
}

pub fn leaderboard(metric: LeaderboardMetric, rows: &[LeaderboardEntry]) -> String {
    if rows.is_empty() {
        return format!("🏆 Top {} ⟶ nobody yet", metric.label());
    }
    let mut out = format!("🏆 Top {}", metric.label());
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!("\n{}. {} - {}", i + 1, mention(&row.user_id), row.value));
    }
    out
}

pub fn word_chain_top(rows: &[(String, PlayerStats)]) -> String {
    if rows.is_empty() {
        return "🔤 Word chain ⟶ nobody has played yet".to_string();
    }
    let mut out = String::from("🔤 Word chain top players");
    for (i, (id, stats)) in rows.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {} - {} words (best chain {})",
            i + 1,
            mention(id),
            stats.total_words,
            stats.longest_chain
        ));
    }
    out
}

pub fn mute_list(rows: &[(String, MuteRecord)], now: DateTime<Utc>) -> String {
    if rows.is_empty() {
        return "🔊 Nobody is muted here".to_string();
    }
    let mut out = String::from("🔇 Muted here");
    for (id, rec) in rows.iter().take(MUTE_LIST_ROWS) {
        out.push_str(&format!(
            "\n{} - {} left ({})",
            mention(id),
            format_remaining(rec.remaining(now)),
            rec.reason.as_deref().unwrap_or("no reason given")
        ));
    }
    if rows.len() > MUTE_LIST_ROWS {
        out.push_str(&format!("\n…and {} more", rows.len() - MUTE_LIST_ROWS));
    }
    out
}

pub fn help(p: &str) -> String {
    format!(
        "Economy: {p}balance {p}profile {p}daily {p}deposit {p}withdraw {p}pay {p}leaderboard\n\
         Casino: {p}coinflip <heads|tails> <bet> {p}slots <bet> {p}blackjack <bet>\n\
         Shop: {p}shop [category] {p}buy {p}inventory {p}equip {p}unequip {p}use {p}open {p}gift\n\
         Pairing: {p}marry <@user> {p}accept {p}reject {p}divorce {p}partner\n\
         Word chain: {p}wordchain <start [en|vi]|stop|restart|stats|top>\n\
         Social: {p}afk [reason] {p}checkmute [@user] {p}mutelist\n\
         Owner: {p}disable {p}enable {p}disabled {p}prefix {p}unlimited {p}setlevel {p}addcoins {p}mute {p}unmute",
        p = p
    )
}
