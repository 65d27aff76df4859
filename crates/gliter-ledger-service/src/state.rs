//! Application state.

use std::sync::Arc;

use gliter_ledger_store::RocksStore;

use crate::config::ServiceConfig;
use crate::mercadopago::MercadoPagoClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// MercadoPago client for purchases and settlement lookups (optional).
    pub mercadopago: Option<Arc<MercadoPagoClient>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        let mercadopago = config.mercadopago_access_token.as_ref().map(|token| {
            tracing::info!(api_url = %config.mercadopago_api_url, "MercadoPago integration enabled");
            Arc::new(MercadoPagoClient::new(
                &config.mercadopago_api_url,
                token,
                config.mercadopago_webhook_secret.clone(),
            ))
        });

        if mercadopago.is_none() {
            tracing::warn!("MercadoPago not configured - credit purchases will not be available");
        }

        Self {
            store,
            config,
            mercadopago,
        }
    }

    /// Check if MercadoPago is configured.
    #[must_use]
    pub fn has_mercadopago(&self) -> bool {
        self.mercadopago.is_some()
    }
}
