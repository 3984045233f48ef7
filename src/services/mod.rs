// src/services/mod.rs

pub mod aggregation;
pub mod bonus;
pub mod export;
pub mod library;
pub mod watch;

use crate::config::StatsScope;

/// Slice of the ledger a query runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerScope {
    /// Every watch event, regardless of owner.
    Global,
    /// Only watch events on movies owned by this user.
    User(i64),
}

impl LedgerScope {
    pub fn resolve(mode: StatsScope, user_id: i64) -> Self {
        match mode {
            StatsScope::Global => LedgerScope::Global,
            StatsScope::PerUser => LedgerScope::User(user_id),
        }
    }

    /// Owner filter for `(? IS NULL OR m.user_id = ?)` clauses.
    pub fn owner(self) -> Option<i64> {
        match self {
            LedgerScope::Global => None,
            LedgerScope::User(id) => Some(id),
        }
    }
}
