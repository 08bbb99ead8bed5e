//! Single-deck blackjack without player decisions.
//!
//! The player is dealt two cards and stands. Naturals settle at once; otherwise the
//! dealer draws while below 17 and the totals are compared.

use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

use super::Settlement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

    fn symbol(self) -> &'static str {
        match self {
            Suit::Spades => "♠",
            Suit::Hearts => "♥",
            Suit::Diamonds => "♦",
            Suit::Clubs => "♣",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Face value with aces counted high.
    pub fn value(self) -> u32 {
        match self {
            Rank::Ace => 11,
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => 10,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.label(), self.suit.symbol())
    }
}

/// A shuffled 52-card shoe dealt from the top.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn shuffled(rng: &mut impl Rng) -> Self {
        let mut cards: Vec<Card> = Suit::ALL
            .iter()
            .flat_map(|&suit| Rank::ALL.iter().map(move |&rank| Card::new(rank, suit)))
            .collect();
        cards.shuffle(rng);
        Self { cards }
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}

impl Iterator for Deck {
    type Item = Card;

    fn next(&mut self) -> Option<Card> {
        self.draw()
    }
}

/// Hand total with each ace demoted from 11 to 1 while the hand would bust.
pub fn hand_value(cards: &[Card]) -> u32 {
    let mut total: u32 = cards.iter().map(|c| c.rank.value()).sum();
    let mut soft_aces = cards.iter().filter(|c| c.rank == Rank::Ace).count();
    while total > 21 && soft_aces > 0 {
        total -= 10;
        soft_aces -= 1;
    }
    total
}

fn is_natural(cards: &[Card]) -> bool {
    cards.len() == 2 && hand_value(cards) == 21
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlackjackResult {
    /// Player natural, dealer without one: pays 3:2.
    Natural,
    BothNatural,
    PlayerBust,
    DealerBust,
    PlayerHigher,
    DealerHigher,
    Push,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlackjackOutcome {
    pub player: Vec<Card>,
    pub dealer: Vec<Card>,
    pub player_total: u32,
    pub dealer_total: u32,
    pub result: BlackjackResult,
    pub bet: u64,
}

impl BlackjackOutcome {
    pub fn settlement(&self) -> Settlement {
        match self.result {
            BlackjackResult::Natural => Settlement::Win(self.bet.saturating_add(self.bet / 2)),
            BlackjackResult::DealerBust | BlackjackResult::PlayerHigher => {
                Settlement::Win(self.bet)
            }
            BlackjackResult::PlayerBust | BlackjackResult::DealerHigher => {
                Settlement::Loss(self.bet)
            }
            BlackjackResult::BothNatural | BlackjackResult::Push => Settlement::Push,
        }
    }
}

/// Resolve a dealt hand. `shoe` supplies the dealer's extra cards; if it runs dry the
/// dealer stands on what it has.
pub fn resolve_blackjack(
    player: Vec<Card>,
    mut dealer: Vec<Card>,
    shoe: impl IntoIterator<Item = Card>,
    bet: u64,
) -> BlackjackOutcome {
    let player_total = hand_value(&player);

    let result = match (is_natural(&player), is_natural(&dealer)) {
        (true, true) => Some(BlackjackResult::BothNatural),
        (true, false) => Some(BlackjackResult::Natural),
        _ => None,
    };

    let result = match result {
        Some(r) => r,
        None if player_total > 21 => BlackjackResult::PlayerBust,
        None => {
            let mut shoe = shoe.into_iter();
            while hand_value(&dealer) < 17 {
                match shoe.next() {
                    Some(card) => dealer.push(card),
                    None => break,
                }
            }
            let dealer_total = hand_value(&dealer);
            if dealer_total > 21 {
                BlackjackResult::DealerBust
            } else if player_total > dealer_total {
                BlackjackResult::PlayerHigher
            } else if player_total < dealer_total {
                BlackjackResult::DealerHigher
            } else {
                BlackjackResult::Push
            }
        }
    };

    BlackjackOutcome {
        dealer_total: hand_value(&dealer),
        player,
        dealer,
        player_total,
        result,
        bet,
    }
}

/// Shuffle a fresh deck, deal player, player, dealer, dealer, and resolve.
pub fn play_blackjack(bet: u64, rng: &mut impl Rng) -> BlackjackOutcome {
    let mut deck = Deck::shuffled(rng);
    let mut player = Vec::with_capacity(2);
    let mut dealer = Vec::with_capacity(2);
    player.extend(deck.draw());
    player.extend(deck.draw());
    dealer.extend(deck.draw());
    dealer.extend(deck.draw());
    resolve_blackjack(player, dealer, deck, bet)
}
