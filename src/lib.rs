//! BudgetWise Advisor
//!
//! Advisory chat service for a personal-finance dashboard:
//! - Injects the user's financial snapshot into a grounded system prompt
//! - Calls a hosted chat-completion provider (OpenRouter)
//! - Never fails outward: provider errors collapse into topic-matched
//!   fallback answers, with the diagnostic kept alongside
//!
//! FLOW:
//! HISTORY + CONTEXT → PROMPT → COMPLETE → (OK | FALLBACK) → ChatResponse

pub mod advisor;
pub mod api;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod error;
pub mod fallback;
pub mod insights;
pub mod models;
pub mod prompt;
pub mod store;

pub use error::Result;

// Re-export common types
pub use advisor::AdvisoryChatService;
pub use config::AdvisorConfig;
pub use models::*;
