//! Ledger transaction types.
//!
//! Every balance change appends a transaction record. Purchase transactions
//! start `pending` and are settled by the payment webhook; everything else
//! is written `completed` in the same atomic unit as the balance change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PaymentId, TransactionId, UserId};

/// A ledger transaction representing one balance change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The user whose balance is affected.
    pub user_id: UserId,

    /// Type of transaction.
    pub kind: TransactionKind,

    /// Credits. Positive for credit-increasing kinds, negative for spends.
    pub amount: i64,

    /// Human-readable description.
    pub description: String,

    /// Current status.
    pub status: TransactionStatus,

    /// Provider-assigned payment order id. Set for purchases; this is the
    /// key the settlement handler reconciles against.
    pub payment_id: Option<PaymentId>,

    /// Correlation reference sent to the payment provider
    /// (`{user_id}_{package_id}_{millis}`). Set for purchases.
    pub external_reference: Option<String>,

    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a pending purchase transaction tied to a provider order.
    #[must_use]
    pub fn pending_purchase(
        user_id: UserId,
        amount: i64,
        description: String,
        payment_id: PaymentId,
        external_reference: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            kind: TransactionKind::Purchase,
            amount,
            description,
            status: TransactionStatus::Pending,
            payment_id: Some(payment_id),
            external_reference: Some(external_reference),
            created_at: Utc::now(),
        }
    }

    /// Create a completed spend transaction (always negative amount).
    #[must_use]
    pub fn spend(user_id: UserId, amount: i64, description: String) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            kind: TransactionKind::Spend,
            amount: -amount.abs(),
            description,
            status: TransactionStatus::Completed,
            payment_id: None,
            external_reference: None,
            created_at: Utc::now(),
        }
    }

    /// Create a completed bonus transaction.
    #[must_use]
    pub fn bonus(user_id: UserId, amount: i64, reason: String) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            kind: TransactionKind::Bonus,
            amount,
            description: reason,
            status: TransactionStatus::Completed,
            payment_id: None,
            external_reference: None,
            created_at: Utc::now(),
        }
    }

    /// Create a completed refund transaction.
    #[must_use]
    pub fn refund(user_id: UserId, amount: i64, reason: String) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            kind: TransactionKind::Refund,
            amount,
            description: reason,
            status: TransactionStatus::Completed,
            payment_id: None,
            external_reference: None,
            created_at: Utc::now(),
        }
    }

    /// Whether this transaction is still awaiting settlement.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }
}

/// Type of ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// User purchased a credit package.
    Purchase,

    /// Credits spent on an in-app action.
    Spend,

    /// Promotional/bonus credits.
    Bonus,

    /// Refund issued.
    Refund,
}

impl TransactionKind {
    /// Check if this kind adds credits (positive balance change).
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::Purchase | Self::Bonus | Self::Refund)
    }

    /// Check if this kind removes credits (negative balance change).
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::Spend)
    }
}

/// Status of a ledger transaction.
///
/// Purchases move `Pending -> Completed` or `Pending -> Failed` exactly
/// once. Completed and failed rows are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Awaiting payment-provider settlement.
    Pending,

    /// Applied to the balance.
    Completed,

    /// Payment rejected or cancelled; no balance change.
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_purchase_carries_payment_ref() {
        let user_id = UserId::generate();
        let tx = Transaction::pending_purchase(
            user_id,
            30,
            "Popular package".into(),
            PaymentId::new("pref-123"),
            format!("{user_id}_popular_1700000000000"),
        );

        assert_eq!(tx.kind, TransactionKind::Purchase);
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.amount, 30);
        assert!(tx.is_pending());
        assert_eq!(tx.payment_id.unwrap().as_str(), "pref-123");
    }

    #[test]
    fn spend_transaction_is_negative() {
        let tx = Transaction::spend(UserId::generate(), 8, "superlike".into());

        assert_eq!(tx.amount, -8);
        assert_eq!(tx.kind, TransactionKind::Spend);
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert!(tx.payment_id.is_none());
    }

    #[test]
    fn kind_credit_debit() {
        assert!(TransactionKind::Purchase.is_credit());
        assert!(TransactionKind::Bonus.is_credit());
        assert!(TransactionKind::Refund.is_credit());
        assert!(!TransactionKind::Spend.is_credit());

        assert!(TransactionKind::Spend.is_debit());
        assert!(!TransactionKind::Purchase.is_debit());
    }
}
