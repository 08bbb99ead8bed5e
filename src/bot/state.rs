//! In-process router state: per-user cooldowns, one-shot luck boosts and the pending
//! pairing proposals. None of this is persisted; a restart clears it.
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Entries untouched for this long are dropped by [`Cooldowns::prune_expired`].
const COOLDOWN_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
pub struct Cooldowns {
    casino_last: HashMap<String, Instant>,
    casino_cooldown: Duration,
    chat_xp_last: HashMap<String, Instant>,
    chat_xp_cooldown: Duration,
    /// Pending casino luck in percent, spent by the next game.
    luck: HashMap<String, f64>,
}

impl Cooldowns {
    pub fn new(casino_cooldown: Duration, chat_xp_cooldown: Duration) -> Self {
        Self {
            casino_last: HashMap::new(),
            casino_cooldown,
            chat_xp_last: HashMap::new(),
            chat_xp_cooldown,
            luck: HashMap::new(),
        }
    }

    pub fn prune_expired(&mut self, now: Instant) {
        let ttl = COOLDOWN_TTL.max(self.chat_xp_cooldown);
        self.casino_last.retain(|_, t| now.duration_since(*t) < ttl);
        self.chat_xp_last.retain(|_, t| now.duration_since(*t) < ttl);
    }

    /// Per-user rate limit for casino games.
    pub fn allow_casino(&mut self, user_id: &str, now: Instant) -> bool {
        allow(&mut self.casino_last, self.casino_cooldown, user_id, now)
    }

    /// Time left before `user_id` may play again.
    pub fn casino_wait(&self, user_id: &str, now: Instant) -> Duration {
        self.casino_last
            .get(user_id)
            .map(|last| self.casino_cooldown.saturating_sub(now.duration_since(*last)))
            .unwrap_or_default()
    }

    /// At most one chat XP award per user per cooldown window.
    pub fn allow_chat_xp(&mut self, user_id: &str, now: Instant) -> bool {
        allow(&mut self.chat_xp_last, self.chat_xp_cooldown, user_id, now)
    }

    /// Stack a luck boost; boosts add up until the next game.
    pub fn add_luck(&mut self, user_id: &str, pct: f64) -> f64 {
        let entry = self.luck.entry(user_id.to_string()).or_insert(0.0);
        *entry = (*entry + pct).min(100.0);
        *entry
    }

    pub fn take_luck(&mut self, user_id: &str) -> Option<f64> {
        self.luck.remove(user_id)
    }
}

fn allow(map: &mut HashMap<String, Instant>, cooldown: Duration, user_id: &str, now: Instant) -> bool {
    match map.get(user_id) {
        Some(last) if now.duration_since(*last) < cooldown => false,
        _ => {
            map.insert(user_id.to_string(), now);
            true
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub proposer_id: String,
    pub ring_item_id: Option<String>,
    pub created_at: Instant,
}

/// Pending proposals keyed by the target. One at a time per target.
#[derive(Debug)]
pub struct ProposalBoard {
    pending: HashMap<String, Proposal>,
    timeout: Duration,
}

impl ProposalBoard {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn prune_expired(&mut self, now: Instant) {
        let timeout = self.timeout;
        self.pending
            .retain(|_, p| now.duration_since(p.created_at) < timeout);
    }

    /// Store a proposal unless the target already has a live one.
    pub fn offer(
        &mut self,
        target_id: &str,
        proposer_id: &str,
        ring_item_id: Option<String>,
        now: Instant,
    ) -> bool {
        self.prune_expired(now);
        if self.pending.contains_key(target_id) {
            return false;
        }
        self.pending.insert(
            target_id.to_string(),
            Proposal {
                proposer_id: proposer_id.to_string(),
                ring_item_id,
                created_at: now,
            },
        );
        true
    }

    /// Remove and return the live proposal addressed to `target_id`.
    pub fn take(&mut self, target_id: &str, now: Instant) -> Option<Proposal> {
        self.prune_expired(now);
        self.pending.remove(target_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casino_cooldown_blocks_rapid_games() {
        let mut cd = Cooldowns::new(Duration::from_millis(1500), Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(cd.allow_casino("u", t0));
        assert!(!cd.allow_casino("u", t0 + Duration::from_millis(500)));
        assert!(cd.casino_wait("u", t0 + Duration::from_millis(500)) > Duration::ZERO);
        assert!(cd.allow_casino("other", t0));
        assert!(cd.allow_casino("u", t0 + Duration::from_secs(2)));
    }

    #[test]
    fn luck_stacks_and_is_spent_once() {
        let mut cd = Cooldowns::new(Duration::ZERO, Duration::ZERO);
        cd.add_luck("u", 10.0);
        assert_eq!(cd.add_luck("u", 20.0), 30.0);
        assert_eq!(cd.take_luck("u"), Some(30.0));
        assert_eq!(cd.take_luck("u"), None);
    }

    #[test]
    fn proposals_expire() {
        let mut board = ProposalBoard::new(Duration::from_secs(120));
        let t0 = Instant::now();
        assert!(board.offer("t", "p", Some("ring_love".into()), t0));
        assert!(!board.offer("t", "q", None, t0 + Duration::from_secs(10)));
        assert!(board
            .take("t", t0 + Duration::from_secs(121))
            .is_none());

        assert!(board.offer("t", "q", None, t0 + Duration::from_secs(130)));
        let p = board.take("t", t0 + Duration::from_secs(140)).unwrap();
        assert_eq!(p.proposer_id, "q");
    }
}
