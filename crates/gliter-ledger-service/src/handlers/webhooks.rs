//! MercadoPago webhook handler.
//!
//! Settlement is driven entirely by this endpoint: the provider notifies
//! us of a payment event, we fetch the authoritative payment object back
//! from the provider API, and reconcile it against the pending purchase
//! by external reference. The ledger is never credited from the webhook
//! body alone.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use gliter_ledger_store::{PaymentOutcome, Settlement, Store};

use crate::error::ApiError;
use crate::state::AppState;

/// Webhook notification body.
///
/// MercadoPago sends `{"type": "payment", "data": {"id": ...}}` where the
/// id is the provider payment id, numeric or stringified depending on the
/// delivery channel.
#[derive(Debug, Deserialize)]
pub struct WebhookNotification {
    /// Event category (`payment`, `merchant_order`, ...).
    #[serde(rename = "type", alias = "topic")]
    pub kind: Option<String>,

    /// Event payload.
    pub data: Option<WebhookData>,
}

/// Webhook event payload.
#[derive(Debug, Deserialize)]
pub struct WebhookData {
    /// Provider payment id.
    pub id: Option<WebhookId>,
}

/// Payment id as delivered, numeric or string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WebhookId {
    /// Numeric form from the IPN channel.
    Num(i64),
    /// String form from the webhooks channel.
    Str(String),
}

impl std::fmt::Display for WebhookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Handle a MercadoPago payment notification.
///
/// Always answers 200 for events it chooses to ignore (non-payment
/// topics, in-flight statuses, references it does not know) so the
/// provider stops retrying them. Duplicated deliveries for an already
/// settled payment are acknowledged without re-applying credits.
pub async fn mercadopago_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(notification): Json<WebhookNotification>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let data_id = notification
        .data
        .as_ref()
        .and_then(|d| d.id.as_ref())
        .map(ToString::to_string);

    // Signature check is enforced whenever a webhook secret is configured.
    if state.config.mercadopago_webhook_secret.is_some() {
        let mercadopago = state
            .mercadopago
            .as_ref()
            .ok_or_else(|| ApiError::ExternalService("MercadoPago not configured".into()))?;

        let signature = header_str(&headers, "x-signature");
        let request_id = header_str(&headers, "x-request-id");
        let data_id = data_id.as_deref().unwrap_or_default();

        mercadopago
            .verify_webhook_signature(signature, request_id, data_id)
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected webhook with bad signature");
                ApiError::Unauthorized
            })?;
    }

    if notification.kind.as_deref() != Some("payment") {
        tracing::debug!(kind = ?notification.kind, "Ignoring non-payment webhook");
        return Ok(Json(serde_json::json!({"status": "ignored"})));
    }

    let Some(payment_id) = data_id else {
        tracing::warn!("Payment webhook without data.id");
        return Ok(Json(serde_json::json!({"status": "ignored"})));
    };

    let mercadopago = state
        .mercadopago
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("MercadoPago not configured".into()))?;

    // The webhook body is unauthenticated data; re-fetch the payment from
    // the provider API and settle from that.
    let payment = mercadopago.get_payment(&payment_id).await.map_err(|e| {
        tracing::error!(error = %e, payment_id = %payment_id, "Failed to fetch payment");
        ApiError::ExternalService(format!("failed to fetch payment {payment_id}: {e}"))
    })?;

    let outcome = match payment.status.as_str() {
        "approved" => PaymentOutcome::Approved,
        "rejected" | "cancelled" => PaymentOutcome::Rejected,
        other => {
            tracing::debug!(payment_id = %payment_id, status = %other, "Payment still in flight");
            return Ok(Json(serde_json::json!({"status": "ignored"})));
        }
    };

    let Some(reference) = payment.external_reference.as_deref() else {
        tracing::warn!(payment_id = %payment_id, "Payment without external reference");
        return Ok(Json(serde_json::json!({"status": "ignored"})));
    };

    let settlement = state.store.settle_payment(reference, outcome)?;

    match &settlement {
        Settlement::Credited { new_balance } => {
            tracing::info!(
                payment_id = %payment_id,
                reference = %reference,
                new_balance = %new_balance,
                "Payment settled, credits applied"
            );
        }
        Settlement::MarkedFailed => {
            tracing::info!(payment_id = %payment_id, reference = %reference, "Payment failed, purchase marked");
        }
        Settlement::AlreadySettled => {
            tracing::debug!(payment_id = %payment_id, reference = %reference, "Duplicate settlement, ignored");
        }
        Settlement::Unknown => {
            tracing::warn!(payment_id = %payment_id, reference = %reference, "No purchase matches reference");
        }
    }

    let status = match settlement {
        Settlement::Credited { .. } => "credited",
        Settlement::MarkedFailed => "failed",
        Settlement::AlreadySettled => "already_settled",
        Settlement::Unknown => "unknown",
    };

    Ok(Json(serde_json::json!({"status": status})))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
