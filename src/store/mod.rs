//! Financial data store
//!
//! Read-only view of the hosted backend holding accounts, transactions and
//! goals. The advisor only ever reads from it to build a context snapshot.

use chrono::{Datelike, NaiveDate};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    Account, Goal, GoalSummary, Transaction, TransactionSummary, TransactionType,
    UserFinancialContext,
};
use crate::Result;

pub mod postgres;
pub use postgres::PostgresFinancialStore;

/// How many transactions feed a context snapshot
pub const CONTEXT_TRANSACTION_LIMIT: i64 = 50;
/// How many of those are passed to the model as "recent"
pub const RECENT_TRANSACTION_COUNT: usize = 10;

/// Trait for financial data reads
#[async_trait::async_trait]
pub trait FinancialDataStore: Send + Sync {
    /// Active accounts, newest first
    async fn get_accounts(&self, user_id: Uuid) -> Result<Vec<Account>>;
    /// Newest first by transaction date, then creation time
    async fn get_transactions(&self, user_id: Uuid, limit: i64) -> Result<Vec<Transaction>>;
    /// Ordered by target date ascending
    async fn get_goals(&self, user_id: Uuid) -> Result<Vec<Goal>>;
}

/// Build the snapshot handed to the advisor.
///
/// Monthly figures cover the calendar month containing `today`.
pub async fn load_user_context(
    store: &dyn FinancialDataStore,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<UserFinancialContext> {
    let accounts = store.get_accounts(user_id).await?;
    let transactions = store
        .get_transactions(user_id, CONTEXT_TRANSACTION_LIMIT)
        .await?;
    let goals = store.get_goals(user_id).await?;

    let total_balance = accounts
        .iter()
        .filter(|a| a.is_active)
        .map(|a| a.balance)
        .sum::<f64>();

    let in_month = |tx: &&Transaction| {
        tx.transaction_date.year() == today.year() && tx.transaction_date.month() == today.month()
    };

    let monthly_income = transactions
        .iter()
        .filter(in_month)
        .filter(|tx| tx.kind == TransactionType::Income)
        .map(|tx| tx.amount.abs())
        .sum::<f64>();

    let monthly_expenses = transactions
        .iter()
        .filter(in_month)
        .filter(|tx| tx.kind == TransactionType::Expense)
        .map(|tx| tx.amount.abs())
        .sum::<f64>();

    debug!(
        %user_id,
        accounts = accounts.len(),
        transactions = transactions.len(),
        goals = goals.len(),
        "Loaded financial context"
    );

    Ok(UserFinancialContext {
        total_balance: Some(total_balance),
        monthly_income: Some(monthly_income),
        monthly_expenses: Some(monthly_expenses),
        goals: goals
            .iter()
            .filter(|g| !g.is_completed)
            .map(GoalSummary::from)
            .collect(),
        recent_transactions: transactions
            .iter()
            .take(RECENT_TRANSACTION_COUNT)
            .map(TransactionSummary::from)
            .collect(),
    })
}

/// In-memory store for development and tests
pub struct InMemoryFinancialStore {
    accounts: Arc<RwLock<Vec<Account>>>,
    transactions: Arc<RwLock<Vec<Transaction>>>,
    goals: Arc<RwLock<Vec<Goal>>>,
}

impl InMemoryFinancialStore {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(Vec::new())),
            transactions: Arc::new(RwLock::new(Vec::new())),
            goals: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn insert_account(&self, account: Account) {
        self.accounts.write().await.push(account);
    }

    pub async fn insert_transaction(&self, transaction: Transaction) {
        self.transactions.write().await.push(transaction);
    }

    pub async fn insert_goal(&self, goal: Goal) {
        self.goals.write().await.push(goal);
    }
}

impl Default for InMemoryFinancialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FinancialDataStore for InMemoryFinancialStore {
    async fn get_accounts(&self, user_id: Uuid) -> Result<Vec<Account>> {
        let accounts = self.accounts.read().await;

        let mut items: Vec<Account> = accounts
            .iter()
            .filter(|a| a.user_id == user_id && a.is_active)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(items)
    }

    async fn get_transactions(&self, user_id: Uuid, limit: i64) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;

        let mut items: Vec<Transaction> = transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.transaction_date
                .cmp(&a.transaction_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        items.truncate(limit.max(0) as usize);

        Ok(items)
    }

    async fn get_goals(&self, user_id: Uuid) -> Result<Vec<Goal>> {
        let goals = self.goals.read().await;

        let mut items: Vec<Goal> = goals
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        // Goals without a target date sort last
        items.sort_by_key(|g| (g.target_date.is_none(), g.target_date));

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountType, GoalPriority};
    use chrono::{Duration, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn account(user_id: Uuid, balance: f64, is_active: bool) -> Account {
        Account {
            id: Uuid::new_v4(),
            user_id,
            name: "Savings".to_string(),
            account_type: AccountType::Savings,
            balance,
            currency: "INR".to_string(),
            is_active,
            created_at: Utc::now(),
        }
    }

    fn transaction(user_id: Uuid, amount: f64, kind: TransactionType, on: NaiveDate) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            user_id,
            account_id: Uuid::new_v4(),
            category_id: None,
            category: Some("Food".to_string()),
            amount,
            description: "tx".to_string(),
            transaction_date: on,
            kind,
            merchant: None,
            notes: None,
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap(),
        }
    }

    fn goal(user_id: Uuid, title: &str, target_date: Option<NaiveDate>, done: bool) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            description: None,
            target_amount: 100000.0,
            current_amount: 10000.0,
            target_date,
            category: "savings".to_string(),
            priority: GoalPriority::Medium,
            is_completed: done,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_transactions_newest_first_and_limited() {
        let store = InMemoryFinancialStore::new();
        let user = Uuid::new_v4();

        for day in 1..=5 {
            store
                .insert_transaction(transaction(user, -100.0, TransactionType::Expense, date(2026, 10, day)))
                .await;
        }
        store
            .insert_transaction(transaction(Uuid::new_v4(), -1.0, TransactionType::Expense, date(2026, 10, 9)))
            .await;

        let items = tokio_test::assert_ok!(store.get_transactions(user, 3).await);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].transaction_date, date(2026, 10, 5));
        assert_eq!(items[2].transaction_date, date(2026, 10, 3));
    }

    #[tokio::test]
    async fn test_goals_by_target_date() {
        let store = InMemoryFinancialStore::new();
        let user = Uuid::new_v4();

        store.insert_goal(goal(user, "later", Some(date(2028, 1, 1)), false)).await;
        store.insert_goal(goal(user, "undated", None, false)).await;
        store.insert_goal(goal(user, "sooner", Some(date(2027, 1, 1)), false)).await;

        let titles: Vec<String> = store
            .get_goals(user)
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.title)
            .collect();
        assert_eq!(titles, vec!["sooner", "later", "undated"]);
    }

    #[tokio::test]
    async fn test_inactive_accounts_hidden() {
        let store = InMemoryFinancialStore::new();
        let user = Uuid::new_v4();

        store.insert_account(account(user, 1000.0, true)).await;
        store.insert_account(account(user, 9999.0, false)).await;

        assert_eq!(store.get_accounts(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_user_context() {
        let store = InMemoryFinancialStore::new();
        let user = Uuid::new_v4();
        let today = date(2026, 10, 16);

        store.insert_account(account(user, 30000.0, true)).await;
        store.insert_account(account(user, 20000.0, true)).await;
        store.insert_account(account(user, 70000.0, false)).await;

        store
            .insert_transaction(transaction(user, 20000.0, TransactionType::Income, date(2026, 10, 1)))
            .await;
        store
            .insert_transaction(transaction(user, -9000.0, TransactionType::Expense, date(2026, 10, 3)))
            .await;
        store
            .insert_transaction(transaction(user, -6000.0, TransactionType::Expense, date(2026, 10, 10)))
            .await;
        // Previous month and transfers do not count
        store
            .insert_transaction(transaction(user, -4000.0, TransactionType::Expense, date(2026, 9, 28)))
            .await;
        store
            .insert_transaction(transaction(user, -2500.0, TransactionType::Transfer, date(2026, 10, 11)))
            .await;

        store.insert_goal(goal(user, "Car", Some(date(2027, 6, 1)), false)).await;
        store.insert_goal(goal(user, "Phone", Some(date(2026, 1, 1)), true)).await;

        let context = load_user_context(&store, user, today).await.unwrap();

        assert_eq!(context.total_balance, Some(50000.0));
        assert_eq!(context.monthly_income, Some(20000.0));
        assert_eq!(context.monthly_expenses, Some(15000.0));
        assert_eq!(context.goals.len(), 1);
        assert_eq!(context.goals[0].title, "Car");
        assert_eq!(context.recent_transactions.len(), 5);
        assert_eq!(context.recent_transactions[0].date, date(2026, 10, 11));
    }

    #[tokio::test]
    async fn test_recent_transactions_capped() {
        let store = InMemoryFinancialStore::new();
        let user = Uuid::new_v4();
        let start = date(2026, 9, 1);

        for offset in 0..25 {
            let on = start + Duration::days(offset);
            store
                .insert_transaction(transaction(user, -10.0, TransactionType::Expense, on))
                .await;
        }

        let context = load_user_context(&store, user, date(2026, 9, 30)).await.unwrap();
        assert_eq!(context.recent_transactions.len(), RECENT_TRANSACTION_COUNT);
        assert_eq!(context.monthly_expenses, Some(250.0));
        assert_eq!(context.total_balance, Some(0.0));
    }
}
