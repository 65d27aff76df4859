//! Error types for ledger storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// Insufficient credits for a debit.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance in credits.
        balance: i64,
        /// Required amount in credits.
        required: i64,
    },

    /// A purchase transaction without a payment reference cannot be
    /// recorded for later settlement.
    #[error("transaction {transaction_id} has no payment reference")]
    MissingPaymentRef {
        /// The offending transaction id.
        transaction_id: String,
    },
}
