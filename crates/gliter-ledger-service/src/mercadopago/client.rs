//! MercadoPago API client implementation.

use reqwest::Client;
use std::time::Duration;

use super::types::{
    MercadoPagoErrorResponse, Payment, PaymentSearchResults, Preference, PreferenceRequest,
};
use crate::crypto;

/// Error type for MercadoPago operations.
#[derive(Debug, thiserror::Error)]
pub enum MercadoPagoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// MercadoPago API returned an error.
    #[error("MercadoPago API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Invalid webhook signature.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// MercadoPago API client.
#[derive(Debug, Clone)]
pub struct MercadoPagoClient {
    client: Client,
    base_url: String,
    access_token: String,
    webhook_secret: Option<String>,
}

impl MercadoPagoClient {
    /// Create a new MercadoPago client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API base URL (production: `https://api.mercadopago.com`)
    /// * `access_token` - MercadoPago access token
    /// * `webhook_secret` - Optional webhook signing secret
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (does not happen with
    /// default settings).
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        webhook_secret: Option<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            webhook_secret,
        }
    }

    /// Create a payment preference (checkout order).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it. The
    /// caller must not record any local state in that case.
    pub async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<Preference, MercadoPagoError> {
        let url = format!("{}/checkout/preferences", self.base_url);

        tracing::debug!(
            external_reference = %request.external_reference,
            "Creating MercadoPago preference"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(request)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Fetch a payment by its numeric id.
    ///
    /// Used by the settlement handler to re-fetch authoritative status
    /// instead of trusting the webhook payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment, MercadoPagoError> {
        let url = format!("{}/v1/payments/{}", self.base_url, payment_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Search payments by external reference.
    ///
    /// Fallback polling path when webhook delivery is delayed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    pub async fn search_payments_by_reference(
        &self,
        external_reference: &str,
    ) -> Result<Vec<Payment>, MercadoPagoError> {
        let url = format!("{}/v1/payments/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("external_reference", external_reference)])
            .send()
            .await?;

        Self::handle_response::<PaymentSearchResults>(response)
            .await
            .map(|r| r.results)
    }

    /// Verify a webhook delivery signature.
    ///
    /// MercadoPago signs deliveries with `x-signature: ts=<ts>,v1=<hmac>`
    /// where the HMAC-SHA256 manifest is
    /// `id:{data.id};request-id:{x-request-id};ts:{ts};`.
    ///
    /// # Errors
    ///
    /// - `MercadoPagoError::Configuration` if no webhook secret is set.
    /// - `MercadoPagoError::InvalidSignature` if the header is malformed or
    ///   the HMAC does not match.
    pub fn verify_webhook_signature(
        &self,
        signature_header: &str,
        request_id: &str,
        data_id: &str,
    ) -> Result<(), MercadoPagoError> {
        let secret = self.webhook_secret.as_ref().ok_or_else(|| {
            MercadoPagoError::Configuration("webhook secret not configured".into())
        })?;

        let mut ts = None;
        let mut v1 = None;
        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("ts", value)) => ts = Some(value),
                Some(("v1", value)) => v1 = Some(value),
                _ => {}
            }
        }

        let (Some(ts), Some(v1)) = (ts, v1) else {
            return Err(MercadoPagoError::InvalidSignature);
        };

        let manifest = format!("id:{data_id};request-id:{request_id};ts:{ts};");
        let expected = crypto::hmac_sha256_hex(secret, &manifest);

        if crypto::constant_time_eq(&expected, v1) {
            Ok(())
        } else {
            Err(MercadoPagoError::InvalidSignature)
        }
    }

    /// Parse a response, mapping non-success statuses to `Api` errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, MercadoPagoError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<MercadoPagoErrorResponse>(&body)
            .ok()
            .and_then(|e| e.message.or(e.error))
            .unwrap_or(body);

        Err(MercadoPagoError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_secret(secret: &str) -> MercadoPagoClient {
        MercadoPagoClient::new(
            "https://api.mercadopago.com",
            "test-access-token",
            Some(secret.to_string()),
        )
    }

    #[test]
    fn valid_signature_is_accepted() {
        let client = client_with_secret("whsec");
        let manifest = "id:12345;request-id:req-1;ts:1704908010;";
        let v1 = crypto::hmac_sha256_hex("whsec", manifest);
        let header = format!("ts=1704908010,v1={v1}");

        assert!(client
            .verify_webhook_signature(&header, "req-1", "12345")
            .is_ok());
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let client = client_with_secret("whsec");
        let manifest = "id:12345;request-id:req-1;ts:1704908010;";
        let v1 = crypto::hmac_sha256_hex("whsec", manifest);
        let header = format!("ts=1704908010,v1={v1}");

        // Different data id than the one signed
        let result = client.verify_webhook_signature(&header, "req-1", "99999");
        assert!(matches!(result, Err(MercadoPagoError::InvalidSignature)));
    }

    #[test]
    fn malformed_header_is_rejected() {
        let client = client_with_secret("whsec");
        let result = client.verify_webhook_signature("garbage", "req-1", "12345");
        assert!(matches!(result, Err(MercadoPagoError::InvalidSignature)));
    }

    #[test]
    fn missing_secret_is_a_configuration_error() {
        let client =
            MercadoPagoClient::new("https://api.mercadopago.com", "test-access-token", None);
        let result = client.verify_webhook_signature("ts=1,v1=ab", "req-1", "12345");
        assert!(matches!(result, Err(MercadoPagoError::Configuration(_))));
    }
}
