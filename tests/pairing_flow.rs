mod common;

use common::{bot_in, reply, OWNER};

#[test]
fn ring_proposal_accept_and_divorce() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = bot_in(tmp.path());
    bot.ledger_mut().credit("alice", 60_000, false);

    let text = reply(&mut bot, "alice", "!marry <@bob>");
    assert!(text.contains("need a ring"), "{}", text);

    reply(&mut bot, "alice", "!buy ring_love");
    let text = reply(&mut bot, "alice", "!propose <@bob>");
    assert!(text.contains("proposed to <@bob>"), "{}", text);
    assert!(text.contains("Love Ring"));

    let text = reply(&mut bot, "carol", "!accept");
    assert!(text.contains("No pending proposal"));

    let text = reply(&mut bot, "bob", "!accept");
    assert!(text.contains("now paired"), "{}", text);
    assert_eq!(bot.pairings().partner("alice"), Some("bob"));
    assert_eq!(bot.pairings().partner("bob"), Some("alice"));
    assert!(!bot.shop().has_item("alice", "ring_love"));
    let record = bot.pairings().record("bob").unwrap();
    assert_eq!(record.ring_item_id.as_deref(), Some("ring_love"));

    let text = reply(&mut bot, "carol", "!partner <@alice>");
    assert!(text.contains("<@bob>"));

    let text = reply(&mut bot, "bob", "!divorce");
    assert!(text.contains("<@alice>"));
    assert!(!bot.pairings().is_paired("alice"));
    assert!(!bot.pairings().is_paired("bob"));
}

#[test]
fn rejected_proposal_keeps_the_ring() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = bot_in(tmp.path());
    bot.ledger_mut().credit("alice", 60_000, false);
    reply(&mut bot, "alice", "!buy ring_love");
    reply(&mut bot, "alice", "!marry bob");

    let text = reply(&mut bot, "dave", "!marry bob");
    assert!(text.contains("ring") || text.contains("pending"), "{}", text);

    let text = reply(&mut bot, "bob", "!reject");
    assert!(text.contains("declined"));
    assert!(bot.shop().has_item("alice", "ring_love"));
    assert!(!bot.pairings().is_paired("alice"));
}

#[test]
fn paired_users_cannot_propose_but_owners_force_re_pairing() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bot = bot_in(tmp.path());
    bot.ledger_mut().credit("alice", 120_000, false);
    reply(&mut bot, "alice", "!buy ring_love");
    reply(&mut bot, "alice", "!marry bob");
    reply(&mut bot, "bob", "!accept");

    reply(&mut bot, "alice", "!buy ring_love");
    let text = reply(&mut bot, "alice", "!marry carol");
    assert!(text.contains("already paired"), "{}", text);

    let text = reply(&mut bot, OWNER, "!marry bob");
    assert!(text.contains("proposed"), "{}", text);
    let text = reply(&mut bot, "bob", "!accept");
    assert!(text.contains("<@alice> is single again"), "{}", text);
    assert_eq!(bot.pairings().partner("bob"), Some(OWNER));
    assert_eq!(bot.pairings().partner(OWNER), Some("bob"));
    assert!(!bot.pairings().is_paired("alice"));
    assert_eq!(bot.pairings().couples(), 1);
}

#[test]
fn pairings_survive_restart() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let mut bot = bot_in(tmp.path());
        bot.ledger_mut().credit("alice", 60_000, false);
        reply(&mut bot, "alice", "!buy ring_love");
        reply(&mut bot, "alice", "!marry bob");
        reply(&mut bot, "bob", "!accept");
    }
    let bot = bot_in(tmp.path());
    assert_eq!(bot.pairings().partner("alice"), Some("bob"));
    assert_eq!(bot.pairings().couples(), 1);
}
