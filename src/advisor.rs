//! Advisory chat service
//!
//! Turns a conversation plus a financial snapshot into one completion call
//! and always hands back a usable [`ChatResponse`]. Failures never escape:
//! they are collapsed into a keyword-matched fallback answer with the
//! diagnostic kept in `ChatResponse::error`.

use std::sync::Arc;
use tracing::{info, warn};

use crate::completion::{CompletionProvider, CompletionRequest, OpenRouterClient, INVALID_FORMAT};
use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::fallback;
use crate::insights::SpendingBreakdown;
use crate::models::{ChatMessage, ChatResponse, TransactionSummary, UserFinancialContext};
use crate::prompt::{build_messages, format_currency};
use crate::Result;

pub const NO_TRANSACTIONS_MESSAGE: &str = "I need some transaction data to analyze your spending patterns. Start by adding a few transactions to get personalized insights.";

/// Stateless request/response service; cheap to share behind an `Arc`
pub struct AdvisoryChatService {
    config: AdvisorConfig,
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl AdvisoryChatService {
    /// Service with an explicit provider (tests inject a mock here)
    pub fn new(config: AdvisorConfig, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            config,
            provider: Some(provider),
        }
    }

    /// Service talking to OpenRouter. Without an API key every call answers
    /// with the not-configured response.
    pub fn from_config(config: AdvisorConfig) -> Self {
        let provider = match OpenRouterClient::new(&config) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn CompletionProvider>),
            Err(e) => {
                warn!("Completion provider unavailable: {}", e);
                None
            }
        };

        Self { config, provider }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.has_api_key() && self.provider.is_some()
    }

    /// Send a conversation to the model.
    ///
    /// `history` should end with the newest user message. The returned
    /// response has `error` set iff the message is not a live model answer.
    pub async fn send_chat_message(
        &self,
        history: &[ChatMessage],
        context: &UserFinancialContext,
    ) -> ChatResponse {
        let provider = match (&self.provider, self.config.has_api_key()) {
            (Some(provider), true) => provider,
            _ => {
                warn!(kind = "configuration", "{}", fallback::MISSING_API_KEY);
                return fallback::not_configured_response();
            }
        };

        match self.try_send(provider.as_ref(), history, context).await {
            Ok(message) => ChatResponse::answered(message),
            Err(e) => {
                warn!(kind = ?e.kind(), "Completion failed, using fallback: {}", e);
                fallback::fallback_response(history, &e)
            }
        }
    }

    async fn try_send(
        &self,
        provider: &dyn CompletionProvider,
        history: &[ChatMessage],
        context: &UserFinancialContext,
    ) -> Result<String> {
        let request = CompletionRequest::new(self.config.model.clone(), build_messages(history, context));
        let content = provider.complete(&request).await?;

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(AdvisorError::Protocol(INVALID_FORMAT.to_string()));
        }

        info!("Advisor answered ({} chars)", trimmed.len());
        Ok(trimmed.to_string())
    }

    /// Single question, answer text only
    pub async fn get_financial_advice(&self, query: &str, context: &UserFinancialContext) -> String {
        let history = [ChatMessage::user(query)];
        self.send_chat_message(&history, context).await.message
    }

    /// Summarize spending by category and ask the model for tips
    pub async fn analyze_spending_pattern(&self, transactions: &[TransactionSummary]) -> String {
        if transactions.is_empty() {
            return NO_TRANSACTIONS_MESSAGE.to_string();
        }

        let breakdown = SpendingBreakdown::from_transactions(transactions);
        let query = spending_query(&breakdown);

        self.get_financial_advice(&query, &UserFinancialContext::default())
            .await
    }
}

fn spending_query(breakdown: &SpendingBreakdown) -> String {
    let (category, amount) = match breakdown.top_category() {
        Some((name, total)) => (name.to_string(), format!("₹{}", format_currency(total))),
        None => ("none".to_string(), "₹0".to_string()),
    };

    format!(
        "Analyze my spending: Total expenses ₹{}, top category is {} with {}. Give me 3 specific tips to optimize my spending.",
        format_currency(breakdown.total_expenses()),
        category,
        amount
    )
}
