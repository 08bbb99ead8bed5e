use rand::Rng;
use std::fmt;

use super::Settlement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinSide {
    Heads,
    Tails,
}

impl CoinSide {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "h" | "head" | "heads" => Some(CoinSide::Heads),
            "t" | "tail" | "tails" => Some(CoinSide::Tails),
            _ => None,
        }
    }
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CoinSide::Heads => "heads",
            CoinSide::Tails => "tails",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinflipOutcome {
    pub call: CoinSide,
    pub landed: CoinSide,
    pub bet: u64,
}

impl CoinflipOutcome {
    pub fn won(&self) -> bool {
        self.call == self.landed
    }

    /// Even money: `+bet` on a correct call, `-bet` otherwise.
    pub fn settlement(&self) -> Settlement {
        if self.won() {
            Settlement::Win(self.bet)
        } else {
            Settlement::Loss(self.bet)
        }
    }
}

/// Flip a fair coin against the player's call.
pub fn coinflip(call: CoinSide, bet: u64, rng: &mut impl Rng) -> CoinflipOutcome {
    let landed = if rng.gen_bool(0.5) {
        CoinSide::Heads
    } else {
        CoinSide::Tails
    };
    CoinflipOutcome { call, landed, bet }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn parses_calls() {
        assert_eq!(CoinSide::parse("H"), Some(CoinSide::Heads));
        assert_eq!(CoinSide::parse("tails"), Some(CoinSide::Tails));
        assert_eq!(CoinSide::parse("edge"), None);
    }

    #[test]
    fn win_rate_converges_to_half() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 20_000;
        let wins = (0..trials)
            .filter(|_| coinflip(CoinSide::Heads, 1, &mut rng).won())
            .count();
        let rate = wins as f64 / trials as f64;
        assert!((rate - 0.5).abs() < 0.02, "win rate {}", rate);
    }
}
