//! Degraded-mode answers
//!
//! When the completion provider cannot produce an answer, the last user
//! message is matched against fixed keyword groups and a canned, on-topic
//! answer is returned instead:
//! - Budgeting: "budget", "expense"
//! - Savings: "save", "saving"
//! - Investing: "invest", "investment"
//! - Generic: anything else

use crate::error::AdvisorError;
use crate::models::{ChatMessage, ChatResponse};

pub const BUDGETING_FALLBACK: &str = "I'd recommend following the 50/30/20 rule: 50% for needs, 30% for wants, and 20% for savings. Based on your current spending patterns, you might want to review your discretionary expenses.";

pub const SAVINGS_FALLBACK: &str = "Start by automating your savings - set up automatic transfers to a separate savings account. Even ₹5,000 per month can grow significantly over time with compound interest.";

pub const INVESTING_FALLBACK: &str = "Consider starting with SIP (Systematic Investment Plan) in diversified mutual funds. Start small with ₹1,000-2,000 monthly and gradually increase as your income grows.";

pub const GENERIC_FALLBACK: &str = "I'm having trouble connecting to the AI service right now. Please try again in a moment, or feel free to explore your dashboard for financial insights.";

pub const NOT_CONFIGURED_MESSAGE: &str = "AI service is not configured. Please check your API settings.";

/// Diagnostic attached to keyword-matched answers
pub const FALLBACK_DIAGNOSTIC: &str = "Using fallback response";

/// Diagnostic attached when no API key is configured
pub const MISSING_API_KEY: &str = "Missing API key";

/// Checked in this order; the first group with a hit wins.
const BUDGETING_KEYWORDS: &[&str] = &["budget", "expense"];
const SAVINGS_KEYWORDS: &[&str] = &["save", "saving"];
const INVESTING_KEYWORDS: &[&str] = &["invest", "investment"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTopic {
    Budgeting,
    Savings,
    Investing,
    Generic,
}

impl FallbackTopic {
    /// Pick a topic for a user message (case-insensitive)
    pub fn detect(text: &str) -> Self {
        let text = text.to_lowercase();
        let hit = |keywords: &[&str]| keywords.iter().any(|kw| text.contains(*kw));

        if hit(BUDGETING_KEYWORDS) {
            FallbackTopic::Budgeting
        } else if hit(SAVINGS_KEYWORDS) {
            FallbackTopic::Savings
        } else if hit(INVESTING_KEYWORDS) {
            FallbackTopic::Investing
        } else {
            FallbackTopic::Generic
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            FallbackTopic::Budgeting => BUDGETING_FALLBACK,
            FallbackTopic::Savings => SAVINGS_FALLBACK,
            FallbackTopic::Investing => INVESTING_FALLBACK,
            FallbackTopic::Generic => GENERIC_FALLBACK,
        }
    }
}

/// Content of the newest message, or "" for an empty history
pub fn last_user_message(history: &[ChatMessage]) -> &str {
    history.last().map(|m| m.content.as_str()).unwrap_or("")
}

/// Canned response for a failed completion.
///
/// Keyword topics carry [`FALLBACK_DIAGNOSTIC`]; the generic answer carries
/// the failure's own message so the cause stays visible.
pub fn fallback_response(history: &[ChatMessage], cause: &AdvisorError) -> ChatResponse {
    let topic = FallbackTopic::detect(last_user_message(history));

    let diagnostic = match topic {
        FallbackTopic::Generic => {
            let text = cause.to_string();
            if text.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                text
            }
        }
        _ => FALLBACK_DIAGNOSTIC.to_string(),
    };

    ChatResponse::degraded(topic.message(), diagnostic)
}

/// Response for a service with no API key
pub fn not_configured_response() -> ChatResponse {
    ChatResponse::degraded(NOT_CONFIGURED_MESSAGE, MISSING_API_KEY)
}
