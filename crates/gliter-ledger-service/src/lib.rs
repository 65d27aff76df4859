//! HTTP API service for the Gliter credits ledger.
//!
//! Exposes the ledger over HTTP:
//!
//! - balance and transaction-history reads for the app UI
//! - purchase initiation against MercadoPago
//! - the MercadoPago settlement webhook
//! - the atomic spend endpoint for in-app actions

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod mercadopago;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
