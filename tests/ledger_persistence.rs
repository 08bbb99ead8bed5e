use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tavernbot::config::EconomyConfig;
use tavernbot::economy::{Funds, LeaderboardMetric, Ledger};
use tavernbot::errors::LedgerError;
use tavernbot::privilege::Privileges;
use tavernbot::storage::{JsonStore, ECONOMY_DOC};

fn open(dir: &std::path::Path) -> Ledger {
    let mut rng = StdRng::seed_from_u64(11);
    Ledger::open(
        JsonStore::new(dir),
        Privileges::new(["owner"]),
        EconomyConfig::default(),
        &mut rng,
    )
    .expect("open ledger")
}

#[test]
fn balances_survive_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let mut ledger = open(tmp.path());
        ledger.credit("alice", 250, false);
        ledger.deposit("alice", 200).unwrap();
        ledger.transfer("alice", "bob", 50).unwrap();
    }
    assert!(tmp.path().join(ECONOMY_DOC).exists());

    let mut ledger = open(tmp.path());
    assert_eq!(ledger.balance("alice"), Funds::Amount(1000));
    assert_eq!(ledger.bank("alice"), Funds::Amount(200));
    assert_eq!(ledger.balance("bob"), Funds::Amount(1050));
    let base = ledger.account("alice").unwrap().base_daily;
    assert!((1200..=1800).contains(&base));
}

#[test]
fn corrupt_document_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join(ECONOMY_DOC), "{ not json").unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let result = Ledger::open(
        JsonStore::new(tmp.path()),
        Privileges::default(),
        EconomyConfig::default(),
        &mut rng,
    );
    assert!(result.is_err());
}

#[test]
fn owners_become_unlimited_on_load() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join(ECONOMY_DOC),
        r#"{"version":1,"next_seq":1,"accounts":{"owner":{"balance":5,"level":0}}}"#,
    )
    .unwrap();
    let mut ledger = open(tmp.path());
    assert!(ledger.is_unlimited("owner"));
    assert_eq!(ledger.balance("owner"), Funds::Unlimited);
    assert_eq!(ledger.account("owner").unwrap().level, 1);
    ledger.debit("owner", 1_000_000, false).unwrap();
    assert_eq!(ledger.account("owner").unwrap().balance, 5);
}

#[test]
fn daily_streak_grows_and_resets() {
    let mut ledger = Ledger::in_memory(Privileges::default(), EconomyConfig::default());
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    let first = ledger.claim_daily_at("u", t0, 0.0).unwrap();
    assert_eq!(first.streak, 1);
    assert!(matches!(
        ledger.claim_daily_at("u", t0 + Duration::hours(2), 0.0),
        Err(LedgerError::DailyNotReady { .. })
    ));

    let second = ledger.claim_daily_at("u", t0 + Duration::hours(25), 0.0).unwrap();
    assert_eq!(second.streak, 2);

    let late = ledger
        .claim_daily_at("u", t0 + Duration::hours(25 + 49), 0.0)
        .unwrap();
    assert_eq!(late.streak, 1);
}

#[test]
fn ring_bonus_raises_daily_payout() {
    let mut plain = Ledger::in_memory(Privileges::default(), EconomyConfig::default());
    let mut ringed = Ledger::in_memory(Privileges::default(), EconomyConfig::default());
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let base_plain = plain.get_or_create_account("u").base_daily;
    let base_ringed = ringed.get_or_create_account("u").base_daily;

    let a = plain.claim_daily_at("u", t0, 0.0).unwrap();
    let b = ringed.claim_daily_at("u", t0, 50.0).unwrap();
    let expected = |base: u64, ring: f64| (base as f64 * (1.0 + (0.25 + 0.0 + ring) / 100.0)).floor() as u64;
    assert_eq!(a.amount, expected(base_plain, 0.0));
    assert_eq!(b.amount, expected(base_ringed, 50.0));
}

#[test]
fn wealth_leaderboard_skips_unlimited_accounts() {
    let mut ledger = Ledger::in_memory(Privileges::new(["owner"]), EconomyConfig::default());
    ledger.credit("rich", 10_000, true);
    ledger.credit("poor", 1, false);
    ledger.get_or_create_account("owner");

    let rows = ledger.leaderboard(LeaderboardMetric::Wealth, 10);
    let ids: Vec<&str> = rows.iter().map(|r| r.user_id.as_str()).collect();
    assert_eq!(ids, vec!["rich", "poor"]);
    assert_eq!(rows[0].value, 11_000);
}

#[test]
fn large_xp_grants_cross_several_levels() {
    let mut ledger = Ledger::in_memory(Privileges::default(), EconomyConfig::default());
    // 100 + 282 + 519 = 901 XP clears levels 1 to 3.
    let up = ledger.award_xp("u", 901).expect("level up");
    assert_eq!((up.from, up.to), (1, 4));
    assert_eq!(up.coin_reward, 2 * 2000 + 3 * 2000 + 4 * 2000);
    let account = ledger.account("u").unwrap();
    assert_eq!(account.xp, 0);
    assert_eq!(account.balance, 1000 + up.coin_reward);
    assert!((account.level_daily_bonus - 9.0).abs() < 1e-9);
}

#[test]
fn seeded_ledgers_draw_the_same_base_daily() {
    let mut a = Ledger::in_memory(Privileges::default(), EconomyConfig::default()).with_seed(5);
    let mut b = Ledger::in_memory(Privileges::default(), EconomyConfig::default()).with_seed(5);
    for user in ["u", "v", "w"] {
        assert_eq!(
            a.get_or_create_account(user).base_daily,
            b.get_or_create_account(user).base_daily
        );
    }
}
