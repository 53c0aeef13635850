//! Session-scoped conversation history
//!
//! Lives only as long as the chat panel does; nothing here is persisted.
//! Each user turn is tagged with a sequence number and only the reply to the
//! newest turn is appended, so a slow answer to an earlier question can never
//! land after a newer one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::advisor::AdvisoryChatService;
use crate::models::{ChatMessage, ChatResponse, UserFinancialContext};

pub const GREETING: &str = "Hello! I'm your AI Financial Advisor. I can help you with budgeting, saving strategies, investment advice, and analyzing your spending patterns. What would you like to know?";

/// Suggested prompts shown under an empty conversation
pub const QUICK_QUESTIONS: &[&str] = &[
    "How can I save more money?",
    "Analyze my spending patterns",
    "Investment advice for beginners",
    "How to create an emergency fund?",
    "Best budgeting strategies",
    "Tax saving tips",
];

/// A user turn that has been recorded but not yet answered
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub sequence: u64,
    /// History to send, ending with the new user message
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Applied,
    /// A newer turn was started before this reply arrived, or the turn was
    /// already answered
    Stale,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    messages: Vec<ChatMessage>,
    last_issued: u64,
    /// Sequence still waiting for its reply
    awaiting: Option<u64>,
    /// Diagnostic of the most recent degraded reply, if any
    last_error: Option<String>,
}

impl Conversation {
    /// New conversation opened with the advisor greeting
    pub fn new() -> Self {
        Self::with_messages(vec![ChatMessage::assistant(GREETING)])
    }

    pub fn with_messages(messages: Vec<ChatMessage>) -> Self {
        let now = Utc::now();
        Self {
            conversation_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            messages,
            last_issued: 0,
            awaiting: None,
            last_error: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Record a user message. Blank input is ignored.
    pub fn begin_turn(&mut self, text: &str) -> Option<PendingTurn> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::user(text));
        self.last_issued += 1;
        self.awaiting = Some(self.last_issued);
        self.updated_at = Utc::now();

        debug!(
            conversation_id = %self.conversation_id,
            sequence = self.last_issued,
            "Turn started"
        );

        Some(PendingTurn {
            sequence: self.last_issued,
            history: self.messages.clone(),
        })
    }

    /// Append the reply for `sequence` unless a newer turn superseded it
    /// or it was already answered
    pub fn complete_turn(&mut self, sequence: u64, response: ChatResponse) -> TurnOutcome {
        if self.awaiting != Some(sequence) {
            info!(
                conversation_id = %self.conversation_id,
                sequence,
                latest = self.last_issued,
                "Discarding stale reply"
            );
            return TurnOutcome::Stale;
        }

        self.awaiting = None;
        self.last_error = response.error;
        self.messages.push(ChatMessage::assistant(response.message));
        self.updated_at = Utc::now();
        TurnOutcome::Applied
    }

    /// One full turn against the advisor
    pub async fn send(
        &mut self,
        service: &AdvisoryChatService,
        text: &str,
        context: &UserFinancialContext,
    ) -> Option<TurnOutcome> {
        let turn = self.begin_turn(text)?;
        let response = service.send_chat_message(&turn.history, context).await;
        Some(self.complete_turn(turn.sequence, response))
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
