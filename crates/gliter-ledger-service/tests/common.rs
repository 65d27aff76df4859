//! Common test utilities for gliter-ledger integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use tempfile::TempDir;

use gliter_ledger_core::UserId;
use gliter_ledger_service::auth::JwtClaims;
use gliter_ledger_service::{create_router, AppState, ServiceConfig};
use gliter_ledger_store::RocksStore;

pub const TEST_AUTH_SECRET: &str = "test-auth-secret";
pub const TEST_SERVICE_KEY: &str = "test-service-key";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct store handle for seeding and asserting on state.
    pub store: Arc<RocksStore>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a harness without a payment provider configured.
    pub fn new() -> Self {
        Self::build(None, None)
    }

    /// Create a harness whose MercadoPago client points at a stub server.
    pub fn with_provider(provider_url: &str) -> Self {
        Self::build(Some(provider_url.to_string()), None)
    }

    /// Create a harness with a stub provider and webhook signature
    /// verification enabled.
    pub fn with_signed_webhooks(provider_url: &str, webhook_secret: &str) -> Self {
        Self::build(
            Some(provider_url.to_string()),
            Some(webhook_secret.to_string()),
        )
    }

    fn build(provider_url: Option<String>, webhook_secret: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            auth_secret: Some(TEST_AUTH_SECRET.into()),
            service_api_key: Some(TEST_SERVICE_KEY.into()),
            mercadopago_api_url: provider_url
                .clone()
                .unwrap_or_else(|| "http://localhost:1".into()),
            mercadopago_access_token: provider_url.map(|_| "test-access-token".into()),
            mercadopago_webhook_secret: webhook_secret,
            frontend_url: "http://localhost:3000".into(),
            notification_url: "http://localhost:8080/webhooks/mercadopago".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            catalog: gliter_ledger_core::Catalog::default(),
        };

        let state = AppState::new(Arc::clone(&store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            store,
            _temp_dir: temp_dir,
            test_user_id,
        }
    }

    /// Mint a Bearer header for the harness's test user.
    pub fn user_auth_header(&self) -> String {
        format!("Bearer {}", mint_token(&self.test_user_id))
    }

    /// Mint a Bearer header for an arbitrary user.
    pub fn auth_header_for(user_id: &UserId) -> String {
        format!("Bearer {}", mint_token(user_id))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Mint a valid HS256 token for a user, signed with the test secret.
pub fn mint_token(user_id: &UserId) -> String {
    let now = Utc::now().timestamp();
    let claims = JwtClaims {
        sub: user_id.to_string(),
        exp: now + 3600,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_AUTH_SECRET.as_bytes()),
    )
    .expect("Failed to encode test JWT")
}
