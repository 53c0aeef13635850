//! Completion provider client
//!
//! Speaks the OpenAI-compatible `chat/completions` protocol exposed by
//! OpenRouter. Uses a long-lived reqwest::Client for connection pooling.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::fallback::MISSING_API_KEY;
use crate::models::ChatMessage;
use crate::Result;

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 500;
pub const TOP_P: f32 = 1.0;

pub(crate) const INVALID_FORMAT: &str = "Invalid response format from AI service";

/// Request body for `chat/completions`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            top_p: TOP_P,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

impl CompletionResponse {
    /// Content of the first choice.
    ///
    /// Missing `choices`, an empty array, a missing message or blank content
    /// are all protocol violations.
    pub fn first_content(&self) -> Result<&str> {
        self.choices
            .as_ref()
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AdvisorError::Protocol(INVALID_FORMAT.to_string()))
    }
}

/// Provider-side error envelope: `{"error": {"message": "..."}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Anything that can turn a completion request into text
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Reusable OpenRouter client (connection-pooled)
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    base_url: String,
    referer: String,
    app_title: String,
}

impl OpenRouterClient {
    pub fn new(config: &AdvisorConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AdvisorError::Configuration(MISSING_API_KEY.to_string()))?;

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AdvisorError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.clone(),
            referer: config.referer.clone(),
            app_title: config.app_title.clone(),
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        info!(
            model = %request.model,
            messages = request.messages.len(),
            "Calling completion provider"
        );

        let response = self
            .client
            .post(&self.base_url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.app_title)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Completion request failed: {}", e);
                AdvisorError::Transport(format!("Completion request failed: {}", e))
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|env| env.error)
                .and_then(|err| err.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| {
                    format!(
                        "HTTP {}: {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("Unknown Status")
                    )
                });

            error!(status = status.as_u16(), "Completion provider error response: {}", message);
            return Err(AdvisorError::Protocol(message));
        }

        let body = response.text().await.map_err(|e| {
            error!("Failed to read completion response: {}", e);
            AdvisorError::Transport(format!("Failed to read completion response: {}", e))
        })?;

        let parsed: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse completion response: {}", e);
            AdvisorError::Protocol(format!("{}: {}", INVALID_FORMAT, e))
        })?;

        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = ?usage.prompt_tokens,
                completion_tokens = ?usage.completion_tokens,
                "Completion usage"
            );
        }

        let content = parsed.first_content()?;
        info!("Completion received ({} chars)", content.len());

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    /// Serve a fixed status + body on a random local port
    async fn spawn_provider(status: StatusCode, body: Value) -> String {
        let app = Router::new().route(
            "/api/v1/chat/completions",
            post(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/api/v1/chat/completions", addr)
    }

    fn client_for(url: String) -> OpenRouterClient {
        let config = AdvisorConfig::default()
            .with_api_key("sk-or-test")
            .with_base_url(url);
        OpenRouterClient::new(&config).unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new("test/model", vec![ChatMessage::user("How do I budget?")])
    }

    #[test]
    fn test_request_serialization() {
        let json = serde_json::to_value(request()).unwrap();

        assert_eq!(json["model"], "test/model");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["top_p"], 1.0);
        assert_eq!(json["frequency_penalty"], 0.0);
        assert_eq!(json["presence_penalty"], 0.0);
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_first_content_rejects_malformed_bodies() {
        let bodies = vec![
            json!({}),
            json!({"choices": []}),
            json!({"choices": [{}]}),
            json!({"choices": [{"message": {}}]}),
            json!({"choices": [{"message": {"content": "   "}}]}),
        ];

        for body in bodies {
            let parsed: CompletionResponse = serde_json::from_value(body.clone()).unwrap();
            let err = parsed.first_content().unwrap_err();
            assert!(matches!(err, AdvisorError::Protocol(_)), "body: {}", body);
        }
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let result = OpenRouterClient::new(&AdvisorConfig::default());
        assert!(matches!(result, Err(AdvisorError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_success_returns_first_choice() {
        let url = spawn_provider(
            StatusCode::OK,
            json!({"choices": [{"message": {"role": "assistant", "content": "  Save 20%.  "}}]}),
        )
        .await;

        let content = client_for(url).complete(&request()).await.unwrap();
        assert_eq!(content, "  Save 20%.  ");
    }

    #[tokio::test]
    async fn test_error_status_uses_provider_message() {
        let url = spawn_provider(
            StatusCode::UNAUTHORIZED,
            json!({"error": {"message": "No auth credentials found", "code": 401}}),
        )
        .await;

        let err = client_for(url).complete(&request()).await.unwrap_err();
        assert!(matches!(err, AdvisorError::Protocol(_)));
        assert_eq!(err.to_string(), "No auth credentials found");
    }

    #[tokio::test]
    async fn test_error_status_without_envelope() {
        let url = spawn_provider(StatusCode::INTERNAL_SERVER_ERROR, json!({})).await;

        let err = client_for(url).complete(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
    }

    #[tokio::test]
    async fn test_service_degrades_on_wire_failures() {
        use crate::advisor::AdvisoryChatService;
        use crate::fallback::{BUDGETING_FALLBACK, GENERIC_FALLBACK};
        use crate::models::UserFinancialContext;

        let malformed = spawn_provider(StatusCode::OK, json!({"id": "gen-1", "choices": []})).await;
        let failing = spawn_provider(StatusCode::INTERNAL_SERVER_ERROR, json!({})).await;

        for url in [malformed, failing] {
            let config = AdvisorConfig::default()
                .with_api_key("sk-or-test")
                .with_base_url(url);
            let service = AdvisoryChatService::from_config(config);

            let generic = service
                .send_chat_message(&[ChatMessage::user("Hello")], &UserFinancialContext::default())
                .await;
            assert_eq!(generic.message, GENERIC_FALLBACK);
            assert!(generic.error.is_some());

            let budget = service
                .send_chat_message(&[ChatMessage::user("Budget help")], &UserFinancialContext::default())
                .await;
            assert_eq!(budget.message, BUDGETING_FALLBACK);
            assert_eq!(budget.error.as_deref(), Some("Using fallback response"));
        }
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error_and_degrades() {
        use crate::advisor::AdvisoryChatService;
        use crate::error::ErrorKind;
        use crate::fallback::SAVINGS_FALLBACK;
        use crate::models::UserFinancialContext;

        let app = Router::new().route(
            "/api/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"choices": [{"message": {"content": "too late"}}]}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = AdvisorConfig::default()
            .with_api_key("sk-or-test")
            .with_base_url(format!("http://{}/api/v1/chat/completions", addr))
            .with_timeout(Duration::from_millis(200));

        let err = OpenRouterClient::new(&config)
            .unwrap()
            .complete(&request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);

        let service = AdvisoryChatService::from_config(config);
        let response = service
            .send_chat_message(&[ChatMessage::user("saving tips")], &UserFinancialContext::default())
            .await;
        assert_eq!(response.message, SAVINGS_FALLBACK);
        assert_eq!(response.error.as_deref(), Some("Using fallback response"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(format!("http://{}/api/v1/chat/completions", addr))
            .complete(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::Transport(_)));
    }
}
