//! Credit balance, purchase, and spend handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use gliter_ledger_core::{Balance, Package, PaymentId, Transaction, TransactionStatus};
use gliter_ledger_store::Store;

use crate::auth::{AuthUser, ServiceAuth};
use crate::error::ApiError;
use crate::mercadopago::{BackUrls, PreferenceItem, PreferenceRequest};
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Spendable credits.
    pub balance: i64,
    /// Lifetime purchased credits.
    pub total_purchased: i64,
    /// Lifetime spent credits.
    pub total_spent: i64,
    /// Last mutation timestamp (RFC 3339).
    pub last_updated: String,
}

impl From<&Balance> for BalanceResponse {
    fn from(balance: &Balance) -> Self {
        Self {
            balance: balance.balance,
            total_purchased: balance.total_purchased,
            total_spent: balance.total_spent,
            last_updated: balance.last_updated.to_rfc3339(),
        }
    }
}

/// Get the current credit balance.
///
/// The balance document is created lazily; a user who never purchased
/// reads zeros rather than a not-found error.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state
        .store
        .get_balance(&auth.user_id)?
        .unwrap_or_else(|| Balance::new(auth.user_id));

    Ok(Json(BalanceResponse::from(&balance)))
}

/// List the credit package catalog.
///
/// Public: the store page renders this before login.
pub async fn list_packages(State(state): State<Arc<AppState>>) -> Json<Vec<Package>> {
    Json(state.config.catalog.all().to_vec())
}

/// Transaction list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Maximum number of transactions to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// Transaction type.
    pub kind: String,
    /// Credits (positive = credit, negative = spend).
    pub amount: i64,
    /// Description.
    pub description: String,
    /// Status.
    pub status: String,
    /// Provider payment id, for purchases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    /// Provider correlation reference, for purchases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    /// Timestamp (RFC 3339).
    pub created_at: String,
}

impl From<&Transaction> for TransactionResponse {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.to_string(),
            kind: format!("{:?}", tx.kind).to_lowercase(),
            amount: tx.amount,
            description: tx.description.clone(),
            status: format!("{:?}", tx.status).to_lowercase(),
            payment_id: tx.payment_id.as_ref().map(ToString::to_string),
            external_reference: tx.external_reference.clone(),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// List transactions response.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Transactions (newest first).
    pub transactions: Vec<TransactionResponse>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// List transaction history, newest first.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<ListTransactionsResponse>, ApiError> {
    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let transactions =
        state
            .store
            .list_transactions_by_user(&auth.user_id, limit + 1, query.offset)?;

    let has_more = transactions.len() > limit;
    let transactions: Vec<_> = transactions
        .iter()
        .take(limit)
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(ListTransactionsResponse {
        transactions,
        has_more,
    }))
}

/// Purchase request.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    /// The catalog package to purchase.
    pub package_id: String,
    /// Optional explicit user id; must match the authenticated caller.
    pub user_id: Option<String>,
}

/// Purchase response.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// Provider-assigned payment order id.
    pub payment_id: String,
    /// Checkout URL the user is redirected to.
    pub payment_url: String,
}

/// Initiate a credit purchase via MercadoPago.
///
/// Creates the provider order first, then records the pending transaction.
/// If the provider call fails, no local row is written, so there are never
/// orphaned pending rows without a corresponding order.
pub async fn purchase_credits(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    // The ledger trusts the verified identity; an explicit user_id in the
    // body must agree with it.
    if let Some(user_id) = &body.user_id {
        if user_id != &auth.user_id.to_string() {
            return Err(ApiError::Forbidden);
        }
    }

    let package = state
        .config
        .catalog
        .get(&body.package_id)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown package: {}", body.package_id)))?
        .clone();

    let mercadopago = state
        .mercadopago
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("MercadoPago not configured".into()))?;

    let now = Utc::now();
    let external_reference = format!(
        "{}_{}_{}",
        auth.user_id,
        package.id,
        now.timestamp_millis()
    );

    let bonus_suffix = package
        .bonus
        .map(|b| format!(" +{b}"))
        .unwrap_or_default();

    let request = PreferenceRequest {
        items: vec![PreferenceItem {
            id: package.id.clone(),
            title: format!("{} - {}{bonus_suffix} créditos", package.name, package.credits),
            description: Some("Paquete de créditos para Gliter".into()),
            quantity: 1,
            unit_price: package.price,
            currency_id: package.currency.clone(),
        }],
        back_urls: BackUrls {
            success: format!("{}/payment/success", state.config.frontend_url),
            failure: format!("{}/payment/failure", state.config.frontend_url),
            pending: format!("{}/payment/pending", state.config.frontend_url),
        },
        auto_return: "approved".into(),
        notification_url: state.config.notification_url.clone(),
        external_reference: external_reference.clone(),
        statement_descriptor: "GLITER_CREDITS".into(),
        expires: true,
        expiration_date_from: Some(now.to_rfc3339()),
        expiration_date_to: Some((now + chrono::Duration::hours(24)).to_rfc3339()),
    };

    let preference = mercadopago.create_preference(&request).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to create MercadoPago preference");
        ApiError::ExternalService(format!("failed to create payment order: {e}"))
    })?;

    let transaction = Transaction::pending_purchase(
        auth.user_id,
        package.total_credits(),
        format!("Compra de {}", package.name),
        PaymentId::new(preference.id.clone()),
        external_reference,
    );
    state.store.record_pending_purchase(&transaction)?;

    tracing::info!(
        user_id = %auth.user_id,
        package_id = %package.id,
        payment_id = %preference.id,
        credits = %package.total_credits(),
        "Purchase initiated"
    );

    Ok(Json(PurchaseResponse {
        payment_id: preference.id,
        payment_url: preference.init_point,
    }))
}

/// Spend request.
#[derive(Debug, Deserialize)]
pub struct SpendRequest {
    /// Credits to spend. Must be positive.
    pub amount: i64,
    /// What the credits were spent on.
    pub description: String,
}

/// Spend response.
#[derive(Debug, Serialize)]
pub struct SpendResponse {
    /// Balance after the debit.
    pub balance: i64,
    /// The appended spend transaction.
    pub transaction_id: String,
}

/// Spend credits on an in-app action.
///
/// The debit and the transaction append happen in one atomic store
/// operation; concurrent spends for the same user serialize there.
pub async fn spend_credits(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<SpendRequest>,
) -> Result<Json<SpendResponse>, ApiError> {
    if body.amount <= 0 {
        return Err(ApiError::BadRequest("amount must be positive".into()));
    }

    let transaction = Transaction::spend(auth.user_id, body.amount, body.description);
    let balance = state.store.spend(&auth.user_id, body.amount, &transaction)?;

    tracing::info!(
        user_id = %auth.user_id,
        amount = %body.amount,
        new_balance = %balance,
        "Credits spent"
    );

    Ok(Json(SpendResponse {
        balance,
        transaction_id: transaction.id.to_string(),
    }))
}

/// Payment status response.
#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    /// The provider payment order id.
    pub payment_id: String,
    /// `approved`, `pending`, or `rejected`.
    pub status: String,
    /// Credits the order grants on settlement.
    pub credits: i64,
}

/// Check the status of a payment order.
///
/// UI fallback for delayed webhook delivery: while the local transaction
/// is still pending, the provider is polled for fresher status. The ledger
/// itself is only ever mutated by the webhook path.
pub async fn payment_status(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(payment_id): Path<String>,
) -> Result<Json<PaymentStatusResponse>, ApiError> {
    let payment_id = PaymentId::new(payment_id);
    let transaction = state
        .store
        .find_transaction_by_payment(&payment_id)?
        .ok_or_else(|| ApiError::NotFound(format!("payment not found: {payment_id}")))?;

    if transaction.user_id != auth.user_id {
        return Err(ApiError::Forbidden);
    }

    let mut status = match transaction.status {
        TransactionStatus::Completed => "approved",
        TransactionStatus::Failed => "rejected",
        TransactionStatus::Pending => "pending",
    }
    .to_string();

    if transaction.is_pending() {
        if let (Some(mercadopago), Some(reference)) =
            (&state.mercadopago, &transaction.external_reference)
        {
            match mercadopago.search_payments_by_reference(reference).await {
                Ok(payments) => {
                    if let Some(payment) = payments.first() {
                        status = match payment.status.as_str() {
                            "approved" => "approved".into(),
                            "rejected" | "cancelled" => "rejected".into(),
                            _ => "pending".into(),
                        };
                    }
                }
                Err(e) => {
                    // Advisory read; the webhook remains authoritative.
                    tracing::warn!(error = %e, payment_id = %payment_id, "Provider status poll failed");
                }
            }
        }
    }

    Ok(Json(PaymentStatusResponse {
        payment_id: payment_id.to_string(),
        status,
        credits: transaction.amount,
    }))
}

/// Credit grant request (operator only).
#[derive(Debug, Deserialize)]
pub struct GrantCreditsRequest {
    /// User ID to credit.
    pub user_id: String,
    /// Credits to grant. Must be positive.
    pub amount: i64,
    /// Reason for the grant.
    pub reason: String,
}

/// Grant bonus credits (operator endpoint).
///
/// Bonus grants add to the balance without touching `total_purchased`.
pub async fn grant_credits(
    State(state): State<Arc<AppState>>,
    service: ServiceAuth,
    Json(body): Json<GrantCreditsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = body
        .user_id
        .parse()
        .map_err(|_| ApiError::BadRequest("invalid user ID".into()))?;

    if body.amount <= 0 {
        return Err(ApiError::BadRequest("amount must be positive".into()));
    }

    let transaction = Transaction::bonus(user_id, body.amount, body.reason.clone());
    let balance = state.store.add_credits(&user_id, body.amount, &transaction)?;

    tracing::info!(
        user_id = %user_id,
        amount = %body.amount,
        reason = %body.reason,
        service = %service.service_name,
        new_balance = %balance,
        "Bonus credits granted"
    );

    Ok(Json(serde_json::json!({
        "balance": balance,
        "transaction_id": transaction.id.to_string()
    })))
}
