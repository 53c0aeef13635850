//! REST API Server for the advisory chat service
//!
//! Exposes the advisor to the dashboard front end.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::advisor::AdvisoryChatService;
use crate::insights::SpendingBreakdown;
use crate::models::{ChatMessage, TransactionSummary, UserFinancialContext};
use crate::store::{load_user_context, FinancialDataStore};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Snapshot computed by the client; takes precedence over `user_id`
    pub context: Option<UserFinancialContext>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdviceRequest {
    pub query: String,
    pub context: Option<UserFinancialContext>,
}

#[derive(Debug, Deserialize)]
pub struct SpendingRequest {
    pub transactions: Vec<TransactionSummary>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub advisor: Arc<AdvisoryChatService>,
    pub store: Option<Arc<dyn FinancialDataStore>>,
}

/// =============================
/// Helpers — user id parsing
/// =============================

fn stable_uuid_from_string(input: &str) -> uuid::Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    uuid::Uuid::from_bytes(bytes)
}

/// Parse a UUID, or derive a stable one from arbitrary ids
pub fn parse_user_id(value: &str) -> uuid::Uuid {
    uuid::Uuid::parse_str(value.trim()).unwrap_or_else(|_| stable_uuid_from_string(value.trim()))
}

async fn resolve_context(
    state: &ApiState,
    context: Option<UserFinancialContext>,
    user_id: Option<&str>,
) -> UserFinancialContext {
    if let Some(context) = context {
        return context;
    }

    let (Some(store), Some(user_id)) = (state.store.as_ref(), user_id.filter(|v| !v.trim().is_empty()))
    else {
        return UserFinancialContext::default();
    };

    let user_id = parse_user_id(user_id);
    let today = chrono::Utc::now().date_naive();

    match load_user_context(store.as_ref(), user_id, today).await {
        Ok(context) => context,
        Err(e) => {
            warn!(%user_id, "Financial context unavailable, continuing without it: {}", e);
            UserFinancialContext::default()
        }
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "advisor_configured": state.advisor.is_configured(),
        "model": state.advisor.config().model,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.messages.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("No messages provided".into())),
        );
    }

    info!(messages = req.messages.len(), "Received chat request");

    let context = resolve_context(&state, req.context, req.user_id.as_deref()).await;
    let response = state.advisor.send_chat_message(&req.messages, &context).await;

    if let Some(diagnostic) = &response.error {
        warn!("Chat answered from fallback: {}", diagnostic);
    }

    (StatusCode::OK, Json(ApiResponse::success(response)))
}

/// =============================
/// Advice Endpoints
/// =============================

async fn advice_handler(
    State(state): State<ApiState>,
    Json(req): Json<AdviceRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Query must not be empty".into())),
        );
    }

    let context = req.context.unwrap_or_default();
    let answer = state.advisor.get_financial_advice(&req.query, &context).await;

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({ "answer": answer }))),
    )
}

async fn spending_handler(
    State(state): State<ApiState>,
    Json(req): Json<SpendingRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let breakdown = SpendingBreakdown::from_transactions(&req.transactions);
    let analysis = state.advisor.analyze_spending_pattern(&req.transactions).await;

    let categories: Vec<serde_json::Value> = breakdown
        .categories()
        .iter()
        .map(|(name, total)| serde_json::json!({ "name": name, "total": total }))
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "analysis": analysis,
            "totalExpenses": breakdown.total_expenses(),
            "categories": categories,
        }))),
    )
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/advice", post(advice_handler))
        .route("/api/insights/spending", post(spending_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
