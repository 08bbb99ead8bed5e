//! Casino resolver: coinflip, slots and blackjack.
//!
//! Every game is a pure function over a bet and `&mut impl Rng`. Validation happens in
//! [`validate_bet`] before the first random draw, and the ledger side effects are applied
//! afterwards by [`Ledger::settle`] from the game's [`Settlement`].
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use tavernbot::casino::{self, CoinSide};
//! use tavernbot::economy::Funds;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! casino::validate_bet(50, Funds::Amount(100)).unwrap();
//! let flip = casino::coinflip(CoinSide::Heads, 50, &mut rng);
//! assert_eq!(flip.settlement().net().abs(), 50);
//! ```

pub mod blackjack;
pub mod coinflip;
pub mod slots;

pub use blackjack::{
    hand_value, play_blackjack, resolve_blackjack, BlackjackOutcome, BlackjackResult, Card, Deck,
    Rank, Suit,
};
pub use coinflip::{coinflip, CoinSide, CoinflipOutcome};
pub use slots::{slots_multiplier, spin_slots, SlotsOutcome, Symbol};

use crate::economy::{Funds, Ledger};
use crate::errors::{CasinoError, LedgerError};

/// A stake as typed by the player: a number or everything in the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetAmount {
    Exact(u64),
    All,
}

impl BetAmount {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("all") || raw.eq_ignore_ascii_case("allin") {
            return Some(BetAmount::All);
        }
        raw.replace(['_', ','], "").parse::<u64>().ok().map(BetAmount::Exact)
    }

    /// Turn the request into a concrete stake against the player's wallet.
    pub fn resolve(self, funds: Funds) -> Result<u64, CasinoError> {
        let bet = match (self, funds) {
            (BetAmount::Exact(v), _) => v,
            (BetAmount::All, Funds::Amount(v)) => v,
            (BetAmount::All, Funds::Unlimited) => return Err(CasinoError::UnboundedAllIn),
        };
        validate_bet(bet, funds)?;
        Ok(bet)
    }
}

/// Reject zero bets and bets above the wallet. Unlimited wallets cover any bet.
pub fn validate_bet(bet: u64, funds: Funds) -> Result<(), CasinoError> {
    if bet == 0 {
        return Err(CasinoError::InvalidBet);
    }
    match funds {
        Funds::Amount(balance) if bet > balance => {
            Err(CasinoError::BetExceedsBalance { bet, balance })
        }
        _ => Ok(()),
    }
}

/// Ledger effect of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Net winnings on top of the returned stake. May be zero (a slots pair on a 1-coin bet).
    Win(u64),
    /// Stake lost.
    Loss(u64),
    /// Stake returned, nothing recorded.
    Push,
}

impl Settlement {
    /// Signed change to the wallet.
    pub fn net(self) -> i64 {
        match self {
            Settlement::Win(v) => i64::try_from(v).unwrap_or(i64::MAX),
            Settlement::Loss(v) => -i64::try_from(v).unwrap_or(i64::MAX),
            Settlement::Push => 0,
        }
    }
}

impl Ledger {
    /// Apply a game result: wins credit the net amount and count a win, losses debit the
    /// stake and count a loss, pushes leave the account alone.
    pub fn settle(&mut self, user_id: &str, settlement: Settlement) -> Result<(), LedgerError> {
        match settlement {
            Settlement::Win(net) => {
                self.credit(user_id, net, false);
                self.record_win(user_id);
            }
            Settlement::Loss(stake) => {
                self.debit(user_id, stake, false)?;
                self.record_loss(user_id);
            }
            Settlement::Push => {}
        }
        Ok(())
    }
}
