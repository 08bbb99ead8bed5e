use tavernbot::bot::command::canonical_name;
use tavernbot::bot::{Command, CommandParser, WordChainCommand};
use tavernbot::casino::{BetAmount, CoinSide};
use tavernbot::economy::LeaderboardMetric;
use tavernbot::games::Language;
use tavernbot::shop::{Category, Slot};

fn parse(raw: &str) -> Command {
    CommandParser::new().parse("!", raw).expect("prefixed")
}

#[test]
fn aliases_map_to_canonical_commands() {
    for (alias, name) in [
        ("bal", "balance"),
        ("cf", "coinflip"),
        ("bj", "blackjack"),
        ("inv", "inventory"),
        ("lb", "leaderboard"),
        ("wc", "wordchain"),
        ("propose", "marry"),
        ("divorce", "divorce"),
    ] {
        assert_eq!(canonical_name(alias), Some(name), "{}", alias);
    }
    assert_eq!(parse("!BAL"), Command::Balance(None));
}

#[test]
fn coinflip_accepts_either_argument_order() {
    let expected = Command::Coinflip {
        call: CoinSide::Tails,
        bet: BetAmount::Exact(250),
    };
    assert_eq!(parse("!cf tails 250"), expected);
    assert_eq!(parse("!coinflip 250 t"), expected);
    match parse("!cf h all") {
        Command::Coinflip { call, bet } => {
            assert_eq!(call, CoinSide::Heads);
            assert_eq!(bet, BetAmount::All);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn user_arguments_accept_mentions() {
    assert_eq!(
        parse("!pay <@!42> 10"),
        Command::Pay {
            target: "42".into(),
            amount: 10
        }
    );
    assert_eq!(parse("!marry <@7>"), Command::Marry("7".into()));
    match parse("!gift <@9> Gem") {
        Command::Gift { target, item, qty } => {
            assert_eq!(target, "9");
            assert_eq!(item, "gem");
            assert_eq!(qty, 1);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn shop_and_inventory_arguments() {
    assert_eq!(parse("!shop"), Command::Shop(None));
    assert_eq!(parse("!shop pets"), Command::Shop(Some(Category::Pet)));
    assert_eq!(parse("!unequip ring"), Command::Unequip(Slot::Ring));
    assert!(matches!(parse("!unequip hat"), Command::Invalid(_)));
    assert_eq!(parse("!open box_rare"), Command::Open("box_rare".into()));
    assert_eq!(
        parse("!lb wins"),
        Command::Leaderboard(LeaderboardMetric::Wins)
    );
}

#[test]
fn word_chain_subcommands() {
    assert_eq!(
        parse("!wc start vi"),
        Command::WordChain(WordChainCommand::Start(Some(Language::Vi)))
    );
    assert_eq!(
        parse("!wordchain start"),
        Command::WordChain(WordChainCommand::Start(None))
    );
    assert_eq!(parse("!wc top"), Command::WordChain(WordChainCommand::Top));
    assert!(matches!(parse("!wc start fr"), Command::Invalid(_)));
    assert!(matches!(parse("!wc"), Command::Invalid(_)));
}

#[test]
fn custom_prefixes_and_plain_text() {
    let parser = CommandParser::new();
    assert_eq!(parser.parse("$$", "$$daily"), Some(Command::Daily));
    assert_eq!(parser.parse("$$", "!daily"), None);
    assert_eq!(parser.parse("!", "good morning"), None);
}

#[test]
fn owner_only_commands_are_flagged() {
    assert!(parse("!addcoins <@1> 5").owner_only());
    assert!(parse("!disable slots").owner_only());
    assert!(parse("!prefix ?").owner_only());
    assert!(!parse("!prefix").owner_only());
    assert!(!parse("!disabled").owner_only());
    assert_eq!(parse("!disable bj"), Command::Disable("blackjack".into()));
}
