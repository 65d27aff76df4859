//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Per-user balance documents, keyed by `user_id`.
    pub const BALANCES: &str = "balances";

    /// Ledger transactions, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by user, keyed by `user_id || transaction_id`.
    /// Value is empty (index only).
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";

    /// Index: purchase transactions by provider payment id.
    /// Value is the 16-byte transaction id.
    pub const TRANSACTIONS_BY_PAYMENT: &str = "transactions_by_payment";

    /// Index: purchase transactions by external reference.
    /// Value is the 16-byte transaction id.
    pub const TRANSACTIONS_BY_REFERENCE: &str = "transactions_by_reference";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::BALANCES,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_USER,
        cf::TRANSACTIONS_BY_PAYMENT,
        cf::TRANSACTIONS_BY_REFERENCE,
    ]
}
