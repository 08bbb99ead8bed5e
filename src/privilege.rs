//! Owner allow-list turned into an explicit capability value.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What an account is allowed to do beyond the ordinary rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    #[default]
    Standard,
    /// Unlimited wallet, unlimited inventory slots, forced pairing.
    Privileged,
}

impl Capability {
    pub fn is_privileged(self) -> bool {
        matches!(self, Capability::Privileged)
    }
}

/// Static set of owner user IDs injected at startup.
#[derive(Debug, Clone, Default)]
pub struct Privileges {
    owners: HashSet<String>,
}

impl Privileges {
    pub fn new<I, S>(owner_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            owners: owner_ids
                .into_iter()
                .map(Into::into)
                .filter(|id: &String| !id.trim().is_empty())
                .collect(),
        }
    }

    pub fn capability(&self, user_id: &str) -> Capability {
        if self.owners.contains(user_id) {
            Capability::Privileged
        } else {
            Capability::Standard
        }
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owners.contains(user_id)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
