//! MercadoPago integration.
//!
//! The ledger uses MercadoPago for checkout: purchases create a payment
//! preference, and settlement is driven by payment webhooks whose status is
//! always re-fetched from the API rather than trusted from the delivery.

pub mod client;
pub mod types;

pub use client::{MercadoPagoClient, MercadoPagoError};
pub use types::{
    BackUrls, Payment, PaymentSearchResults, Preference, PreferenceItem, PreferenceRequest,
};
