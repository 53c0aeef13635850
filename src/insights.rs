//! Spending breakdown used by the advisor and the spending insights endpoint

use std::collections::HashMap;

use crate::models::{TransactionSummary, TransactionType};

const UNCATEGORIZED: &str = "Other";

/// Expense totals per category, largest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpendingBreakdown {
    total_expenses: f64,
    categories: Vec<(String, f64)>,
}

impl SpendingBreakdown {
    /// Only `expense` transactions count; amounts are taken as absolute values.
    pub fn from_transactions(transactions: &[TransactionSummary]) -> Self {
        let mut totals: HashMap<&str, f64> = HashMap::new();
        let mut total_expenses = 0.0;

        for tx in transactions.iter().filter(|t| t.kind == TransactionType::Expense) {
            let amount = tx.amount.abs();
            total_expenses += amount;

            let category = tx
                .category
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(UNCATEGORIZED);
            *totals.entry(category).or_insert(0.0) += amount;
        }

        let mut categories: Vec<(String, f64)> = totals
            .into_iter()
            .map(|(name, total)| (name.to_string(), total))
            .collect();

        // Ties broken by name so the top category is deterministic
        categories.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            total_expenses,
            categories,
        }
    }

    pub fn total_expenses(&self) -> f64 {
        self.total_expenses
    }

    pub fn categories(&self) -> &[(String, f64)] {
        &self.categories
    }

    pub fn top_category(&self) -> Option<(&str, f64)> {
        self.categories
            .first()
            .map(|(name, total)| (name.as_str(), *total))
    }
}
