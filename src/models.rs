//! Core data models for the advisory chat service

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//
// ================= Chat =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// One turn of a conversation. Order within a history is prompt order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }
}

/// Always-valid outcome handed back to callers.
///
/// `error` is set only when the message is a canned fallback; the message is
/// never empty in that case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn answered(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }

    pub fn degraded(message: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: Some(diagnostic.into()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}

//
// ================= Financial Context =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalSummary {
    pub title: String,
    pub target_amount: f64,
    pub current_amount: f64,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: GoalPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub category: Option<String>,
    pub date: NaiveDate,
}

/// Snapshot of the user's finances, recomputed per screen load.
///
/// Missing numbers render as `N/A` in the prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserFinancialContext {
    pub total_balance: Option<f64>,
    pub monthly_income: Option<f64>,
    pub monthly_expenses: Option<f64>,
    pub goals: Vec<GoalSummary>,
    pub recent_transactions: Vec<TransactionSummary>,
}

//
// ================= Store Records =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Credit,
    Investment,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GoalPriority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub balance: f64,
    pub currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub category_id: Option<Uuid>,
    /// Joined category name, when the category still exists
    pub category: Option<String>,
    pub amount: f64,
    pub description: String,
    pub transaction_date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub merchant: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_amount: f64,
    pub current_amount: f64,
    pub target_date: Option<NaiveDate>,
    pub category: String,
    pub priority: GoalPriority,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Goal> for GoalSummary {
    fn from(goal: &Goal) -> Self {
        Self {
            title: goal.title.clone(),
            target_amount: goal.target_amount,
            current_amount: goal.current_amount,
            target_date: goal.target_date,
            priority: goal.priority,
        }
    }
}

impl From<&Transaction> for TransactionSummary {
    fn from(tx: &Transaction) -> Self {
        Self {
            description: tx.description.clone(),
            amount: tx.amount,
            kind: tx.kind,
            category: tx.category.clone(),
            date: tx.transaction_date,
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Transfer => "transfer",
        };
        write!(f, "{}", s)
    }
}
