//! MercadoPago API types.
//!
//! Only the fields the ledger actually reads are modeled; everything else
//! in the provider's responses is ignored at deserialization.

use serde::{Deserialize, Serialize};

/// A line item in a payment preference.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceItem {
    /// Item identifier (the package id).
    pub id: String,
    /// Display title shown on the checkout page.
    pub title: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Quantity (always 1 for credit packages).
    pub quantity: u32,
    /// Unit price in the given currency.
    pub unit_price: i64,
    /// ISO currency code.
    pub currency_id: String,
}

/// Redirect URLs after checkout.
#[derive(Debug, Clone, Serialize)]
pub struct BackUrls {
    /// Redirect after an approved payment.
    pub success: String,
    /// Redirect after a rejected payment.
    pub failure: String,
    /// Redirect while the payment is still pending.
    pub pending: String,
}

/// Request body for creating a payment preference.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceRequest {
    /// Items being purchased.
    pub items: Vec<PreferenceItem>,
    /// Post-checkout redirect URLs.
    pub back_urls: BackUrls,
    /// Auto-return policy ("approved").
    pub auto_return: String,
    /// Webhook URL for payment notifications.
    pub notification_url: String,
    /// Correlation reference echoed back on the payment object.
    pub external_reference: String,
    /// Text shown on the card statement.
    pub statement_descriptor: String,
    /// Whether the preference expires.
    pub expires: bool,
    /// Expiry window start (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date_from: Option<String>,
    /// Expiry window end (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date_to: Option<String>,
}

/// A created payment preference.
#[derive(Debug, Clone, Deserialize)]
pub struct Preference {
    /// Provider-assigned preference id.
    pub id: String,
    /// Checkout URL the user is redirected to.
    pub init_point: String,
}

/// A payment as reported by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct Payment {
    /// Numeric payment id.
    pub id: i64,
    /// Payment status (`approved`, `rejected`, `cancelled`, `pending`,
    /// `in_process`, ...).
    pub status: String,
    /// The external reference set at preference creation.
    pub external_reference: Option<String>,
}

/// Result page of a payment search.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSearchResults {
    /// Matching payments.
    pub results: Vec<Payment>,
}

/// Error body returned by the MercadoPago API.
#[derive(Debug, Clone, Deserialize)]
pub struct MercadoPagoErrorResponse {
    /// Human-readable message.
    pub message: Option<String>,
    /// Error code.
    pub error: Option<String>,
    /// HTTP status echoed in the body.
    pub status: Option<i32>,
}
