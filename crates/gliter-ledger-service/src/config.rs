//! Service configuration.

use serde::Deserialize;
use std::path::Path;

use gliter_ledger_core::Catalog;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to the `RocksDB` data directory (default: "/data/gliter-ledger").
    pub data_dir: String,

    /// HS256 secret for validating user JWTs. Auth fails closed when unset.
    pub auth_secret: Option<String>,

    /// API key for operator/service-to-service endpoints (credit grants).
    pub service_api_key: Option<String>,

    /// MercadoPago API base URL (default: `https://api.mercadopago.com`).
    /// Overridable so tests can point at a stub server.
    pub mercadopago_api_url: String,

    /// MercadoPago access token (optional; purchases disabled without it).
    pub mercadopago_access_token: Option<String>,

    /// MercadoPago webhook signing secret (optional).
    pub mercadopago_webhook_secret: Option<String>,

    /// Frontend URL for payment redirect pages.
    pub frontend_url: String,

    /// Publicly reachable URL of the settlement webhook, passed to the
    /// provider as `notification_url`.
    pub notification_url: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// The credit package catalog. Fixed at deploy time.
    pub catalog: Catalog,
}

/// MercadoPago secrets file structure.
#[derive(Debug, Deserialize)]
struct MercadoPagoSecrets {
    access_token: String,
    #[serde(default)]
    webhook_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let (mercadopago_access_token, mercadopago_webhook_secret) = load_mercadopago_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/gliter-ledger".into()),
            auth_secret: std::env::var("AUTH_SECRET").ok(),
            service_api_key: std::env::var("SERVICE_API_KEY").ok(),
            mercadopago_api_url: std::env::var("MERCADOPAGO_API_URL")
                .unwrap_or_else(|_| "https://api.mercadopago.com".into()),
            mercadopago_access_token,
            mercadopago_webhook_secret,
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            notification_url: std::env::var("NOTIFICATION_URL")
                .unwrap_or_else(|_| "http://localhost:8080/webhooks/mercadopago".into()),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            catalog: Catalog::default(),
        }
    }
}

/// Load MercadoPago secrets from file or environment.
fn load_mercadopago_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/mercadopago.json",
        "gliter-ledger/.secrets/mercadopago.json",
        "../.secrets/mercadopago.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<MercadoPagoSecrets>(path) {
            tracing::info!(path = %path, "Loaded MercadoPago secrets from file");
            return (Some(secrets.access_token), secrets.webhook_secret);
        }
    }

    tracing::debug!("MercadoPago secrets file not found, using environment variables");
    (
        std::env::var("MERCADOPAGO_ACCESS_TOKEN").ok(),
        std::env::var("MERCADOPAGO_WEBHOOK_SECRET").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/gliter-ledger".into(),
            auth_secret: None,
            service_api_key: None,
            mercadopago_api_url: "https://api.mercadopago.com".into(),
            mercadopago_access_token: None,
            mercadopago_webhook_secret: None,
            frontend_url: "http://localhost:3000".into(),
            notification_url: "http://localhost:8080/webhooks/mercadopago".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            catalog: Catalog::default(),
        }
    }
}
