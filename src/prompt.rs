//! Grounded prompt construction
//!
//! Prepends a single system message carrying the advisor persona and the
//! user's numbers to whatever history the caller passes in.

use crate::models::{ChatMessage, UserFinancialContext};

const PERSONA: &str = "You are a helpful AI financial advisor. You provide personalized financial advice based on user data.";

const GUIDANCE: &str = "Provide helpful, actionable financial advice. Keep responses concise and practical. Use Indian Rupee (₹) for currency references.";

const MISSING: &str = "N/A";

/// Build the system message for a context snapshot
pub fn build_system_message(context: &UserFinancialContext) -> ChatMessage {
    let content = format!(
        "{}\n\nCurrent user context:\n\
         - Total Balance: {}\n\
         - Monthly Income: {}\n\
         - Monthly Expenses: {}\n\
         - Active Goals: {}\n\
         - Recent Transactions: {}\n\n\
         {}",
        PERSONA,
        rupees(context.total_balance),
        rupees(context.monthly_income),
        rupees(context.monthly_expenses),
        context.goals.len(),
        context.recent_transactions.len(),
        GUIDANCE,
    );

    ChatMessage::system(content)
}

/// System message followed by the full history, in order
pub fn build_messages(history: &[ChatMessage], context: &UserFinancialContext) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(build_system_message(context));
    messages.extend(history.iter().cloned());
    messages
}

fn rupees(amount: Option<f64>) -> String {
    match amount {
        Some(value) if value.is_finite() => format!("₹{}", format_currency(value)),
        _ => MISSING.to_string(),
    }
}

/// Group thousands with commas, keep at most three fractional digits.
///
/// `50000.0` → `50,000`, `1234.5` → `1,234.5`, `-0.0004` → `0`.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    if frac.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac)
    }
}
