//! Core types for the Gliter credits ledger.
//!
//! This crate provides the foundational types used throughout the ledger:
//!
//! - **Identifiers**: `UserId`, `TransactionId`, `PaymentId`
//! - **Balance**: the per-user `Balance` document
//! - **Transactions**: `Transaction`, `TransactionKind`, `TransactionStatus`
//! - **Catalog**: `Catalog`, `Package`
//!
//! # Credit unit
//!
//! Credits are whole integers (`i64`). A package defines the exchange rate
//! between money (whole ARS) and credits; the ledger itself
//! never deals in money after purchase initiation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod balance;
pub mod catalog;
pub mod ids;
pub mod transaction;

pub use balance::Balance;
pub use catalog::{Catalog, Package};
pub use ids::{IdError, PaymentId, TransactionId, UserId};
pub use transaction::{Transaction, TransactionKind, TransactionStatus};
