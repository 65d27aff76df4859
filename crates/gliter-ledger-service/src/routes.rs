//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{credits, health, webhooks};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /v1/credits/packages` - Credit package catalog
///
/// ## Credits (user JWT auth)
/// - `GET /v1/credits/balance` - Get current balance
/// - `GET /v1/credits/transactions` - List transaction history
/// - `POST /v1/credits/purchase` - Initiate credit purchase
/// - `POST /v1/credits/spend` - Spend credits
/// - `GET /v1/payments/:payment_id` - Check a payment order's status
///
/// ## Operator (Service API Key auth)
/// - `POST /v1/credits/grant` - Grant bonus credits
///
/// ## Webhooks (Signature verification)
/// - `POST /webhooks/mercadopago` - MercadoPago payment notifications
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Catalog (public)
        .route("/v1/credits/packages", get(credits::list_packages))
        // Credits
        .route("/v1/credits/balance", get(credits::get_balance))
        .route("/v1/credits/transactions", get(credits::list_transactions))
        .route("/v1/credits/purchase", post(credits::purchase_credits))
        .route("/v1/credits/spend", post(credits::spend_credits))
        // Payments
        .route("/v1/payments/:payment_id", get(credits::payment_status))
        // Operator (service auth)
        .route("/v1/credits/grant", post(credits::grant_credits))
        // Webhooks
        .route("/webhooks/mercadopago", post(webhooks::mercadopago_webhook))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
