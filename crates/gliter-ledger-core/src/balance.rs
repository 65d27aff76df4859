//! Per-user credit balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// The credit balance document for one user.
///
/// Created lazily on first purchase or first read, never deleted in normal
/// operation. All mutations go through the store's atomic compound
/// operations; nothing else writes this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    /// The owning user. Immutable.
    pub user_id: UserId,

    /// Spendable credits. Never negative.
    pub balance: i64,

    /// Lifetime credits purchased. Monotonic non-decreasing.
    ///
    /// Bonus grants add to `balance` without touching this counter, so
    /// `balance` is not required to equal `total_purchased - total_spent`.
    pub total_purchased: i64,

    /// Lifetime credits spent. Monotonic non-decreasing.
    pub total_spent: i64,

    /// When the balance was last mutated.
    pub last_updated: DateTime<Utc>,
}

impl Balance {
    /// Create a fresh zero balance for a user.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: 0,
            total_purchased: 0,
            total_spent: 0,
            last_updated: Utc::now(),
        }
    }

    /// Check whether the balance covers a debit of `amount` credits.
    ///
    /// Advisory only; the store re-checks inside its atomic spend.
    #[must_use]
    pub fn has_enough(&self, amount: i64) -> bool {
        self.balance >= amount
    }
}
