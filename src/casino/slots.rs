//! Three-reel slots over a six-symbol alphabet.
//!
//! Payouts (multiplier on the stake):
//! - 💎💎💎 = ×10
//! - 7️⃣7️⃣7️⃣ = ×5
//! - any other triple = ×3
//! - any pair = ×1.5
//! - otherwise = ×0

use rand::Rng;
use std::fmt;

use super::Settlement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Cherry,
    Lemon,
    Orange,
    Grape,
    Seven,
    Diamond,
}

impl Symbol {
    pub const ALL: [Symbol; 6] = [
        Symbol::Cherry,
        Symbol::Lemon,
        Symbol::Orange,
        Symbol::Grape,
        Symbol::Seven,
        Symbol::Diamond,
    ];

    pub fn emoji(self) -> &'static str {
        match self {
            Symbol::Cherry => "🍒",
            Symbol::Lemon => "🍋",
            Symbol::Orange => "🍊",
            Symbol::Grape => "🍇",
            Symbol::Seven => "7️⃣",
            Symbol::Diamond => "💎",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.emoji())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotsOutcome {
    pub reels: [Symbol; 3],
    /// Multiplier in tenths (15 means ×1.5).
    pub multiplier_tenths: u64,
    pub bet: u64,
    pub description: String,
}

impl SlotsOutcome {
    /// `floor(bet * multiplier) - bet` when anything matched, `-bet` otherwise.
    pub fn settlement(&self) -> Settlement {
        if self.multiplier_tenths == 0 {
            return Settlement::Loss(self.bet);
        }
        let gross = u128::from(self.bet) * u128::from(self.multiplier_tenths) / 10;
        let net = gross.saturating_sub(u128::from(self.bet));
        Settlement::Win(u64::try_from(net).unwrap_or(u64::MAX))
    }
}

/// Payout multiplier in tenths plus a short description.
pub fn slots_multiplier(reels: &[Symbol; 3]) -> (u64, String) {
    let [a, b, c] = *reels;
    if a == b && b == c {
        let mult = match a {
            Symbol::Diamond => 100,
            Symbol::Seven => 50,
            _ => 30,
        };
        return (mult, format!("Triple {}", a));
    }
    if a == b || b == c || a == c {
        return (15, "Pair".into());
    }
    (0, "No win".into())
}

/// Spin three independent, uniform reels.
pub fn spin_slots(bet: u64, rng: &mut impl Rng) -> SlotsOutcome {
    let mut reel = || Symbol::ALL[rng.gen_range(0..Symbol::ALL.len())];
    let reels = [reel(), reel(), reel()];
    let (multiplier_tenths, description) = slots_multiplier(&reels);
    SlotsOutcome {
        reels,
        multiplier_tenths,
        bet,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(reels: [Symbol; 3], bet: u64) -> SlotsOutcome {
        let (multiplier_tenths, description) = slots_multiplier(&reels);
        SlotsOutcome {
            reels,
            multiplier_tenths,
            bet,
            description,
        }
    }

    #[test]
    fn payout_table() {
        use Symbol::*;
        assert_eq!(outcome([Diamond, Diamond, Diamond], 10).settlement(), Settlement::Win(90));
        assert_eq!(outcome([Diamond, Diamond, Diamond], 3).settlement(), Settlement::Win(27));
        assert_eq!(outcome([Seven, Seven, Seven], 10).settlement(), Settlement::Win(40));
        assert_eq!(outcome([Grape, Grape, Grape], 10).settlement(), Settlement::Win(20));
        assert_eq!(outcome([Cherry, Lemon, Cherry], 10).settlement(), Settlement::Win(5));
        assert_eq!(outcome([Cherry, Lemon, Orange], 10).settlement(), Settlement::Loss(10));
    }

    #[test]
    fn pair_on_single_coin_is_a_zero_win() {
        use Symbol::*;
        assert_eq!(outcome([Lemon, Lemon, Seven], 1).settlement(), Settlement::Win(0));
    }
}
