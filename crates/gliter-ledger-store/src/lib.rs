//! `RocksDB` storage layer for the Gliter credits ledger.
//!
//! This crate provides persistent storage for balances and ledger
//! transactions using `RocksDB` with column families for indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `balances`: per-user balance documents, keyed by `user_id`
//! - `transactions`: ledger transactions, keyed by `transaction_id` (ULID)
//! - `transactions_by_user`: index for listing transactions by user
//! - `transactions_by_payment`: index from provider payment id
//! - `transactions_by_reference`: index from external reference
//!
//! # Concurrency
//!
//! The balance document for a user is the single point of contention.
//! Every compound mutation (spend, settlement credit, grant) runs its
//! read-modify-write under a per-user lock stripe and commits through one
//! `WriteBatch`, so a concurrent spend and settlement for the same user
//! serialize and either all writes of an operation land or none do.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use gliter_ledger_core::{Balance, PaymentId, Transaction, TransactionId, UserId};

/// The authoritative outcome reported by the payment provider for an order.
///
/// Statuses that are still in flight (`pending`, `in_process`, ...) never
/// reach the store; the settlement handler drops them before this point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Payment confirmed; credits must be applied.
    Approved,
    /// Payment rejected or cancelled; no balance change.
    Rejected,
}

/// Result of reconciling a provider callback against the local ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// The pending purchase was credited. Carries the new balance.
    Credited {
        /// Balance after the credit was applied.
        new_balance: i64,
    },
    /// The pending purchase was marked failed. No balance change.
    MarkedFailed,
    /// The matching transaction was already completed or failed.
    /// Duplicate callbacks land here and are not re-applied.
    AlreadySettled,
    /// No transaction matches the reference. Foreign or stale event.
    Unknown,
}

/// The storage trait defining all ledger operations.
///
/// This abstracts the storage layer so handlers can be tested against any
/// implementation honoring the same atomicity guarantees.
pub trait Store: Send + Sync {
    // =========================================================================
    // Balance Operations
    // =========================================================================

    /// Get a user's balance document, if one has been created.
    ///
    /// Callers treat `None` as a zero balance; the document is created
    /// lazily by the first credit.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_balance(&self, user_id: &UserId) -> Result<Option<Balance>>;

    /// Insert or replace a balance document.
    ///
    /// Only for seeding and tests; normal mutation goes through the
    /// compound operations below.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_balance(&self, balance: &Balance) -> Result<()>;

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    /// Get a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<Transaction>>;

    /// Find a purchase transaction by its provider payment id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_transaction_by_payment(&self, payment_id: &PaymentId) -> Result<Option<Transaction>>;

    /// Find a purchase transaction by its external reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_transaction_by_reference(&self, external_reference: &str)
        -> Result<Option<Transaction>>;

    /// List transactions for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Record a pending purchase transaction and its payment indexes.
    ///
    /// No balance change happens here; credits are applied only on
    /// settlement.
    ///
    /// # Errors
    ///
    /// - `StoreError::MissingPaymentRef` if the transaction has no payment
    ///   id or external reference.
    fn record_pending_purchase(&self, transaction: &Transaction) -> Result<()>;

    /// Reconcile a provider outcome against the pending purchase matching
    /// `external_reference`.
    ///
    /// On `Approved`, credits the balance and completes the transaction in
    /// one atomic batch. On `Rejected`, marks the transaction failed. A
    /// transaction that is no longer pending is left untouched
    /// (`Settlement::AlreadySettled`), which makes retried and duplicated
    /// callbacks safe.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn settle_payment(
        &self,
        external_reference: &str,
        outcome: PaymentOutcome,
    ) -> Result<Settlement>;

    /// Debit credits and append the spend transaction atomically.
    ///
    /// Returns the new balance after deduction. Spending the exact balance
    /// is allowed; the balance may reach zero but never goes negative.
    ///
    /// # Errors
    ///
    /// - `StoreError::InsufficientCredits` if the balance is too low; no
    ///   writes are made in that case.
    fn spend(&self, user_id: &UserId, amount: i64, transaction: &Transaction) -> Result<i64>;

    /// Credit a bonus or refund and append its transaction atomically.
    ///
    /// Bonus and refund grants add to the balance without touching
    /// `total_purchased`. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn add_credits(&self, user_id: &UserId, amount: i64, transaction: &Transaction) -> Result<i64>;
}
