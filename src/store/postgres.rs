//! Postgres-backed financial data store
//!
//! Reads the hosted schema directly. Numeric columns are cast to float8 in
//! SQL so rows decode straight into `f64`.

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

use crate::error::AdvisorError;
use crate::models::{Account, AccountType, Goal, GoalPriority, Transaction, TransactionType};
use crate::store::FinancialDataStore;
use crate::Result;

pub struct PostgresFinancialStore {
    pool: PgPool,
}

impl PostgresFinancialStore {
    /// Lazily connecting pool; the first query opens the connection
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(database_url)
            .map_err(|e| AdvisorError::Store(format!("Failed to create connection pool: {}", e)))?;

        info!("Financial data store backend: postgres");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_err(action: &'static str) -> impl Fn(sqlx::Error) -> AdvisorError {
    move |e| AdvisorError::Store(format!("Failed to {}: {}", action, e))
}

fn account_type_from_db(value: &str) -> AccountType {
    match value.to_lowercase().as_str() {
        "savings" => AccountType::Savings,
        "credit" => AccountType::Credit,
        "investment" => AccountType::Investment,
        _ => AccountType::Checking,
    }
}

fn transaction_type_from_db(value: &str) -> TransactionType {
    match value.to_lowercase().as_str() {
        "income" => TransactionType::Income,
        "transfer" => TransactionType::Transfer,
        _ => TransactionType::Expense,
    }
}

fn priority_from_db(value: &str) -> GoalPriority {
    match value.to_lowercase().as_str() {
        "high" => GoalPriority::High,
        "low" => GoalPriority::Low,
        _ => GoalPriority::Medium,
    }
}

fn account_from_row(row: &PgRow) -> std::result::Result<Account, sqlx::Error> {
    let kind: String = row.try_get("type")?;
    Ok(Account {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        account_type: account_type_from_db(&kind),
        balance: row.try_get("balance")?,
        currency: row.try_get("currency")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn transaction_from_row(row: &PgRow) -> std::result::Result<Transaction, sqlx::Error> {
    let kind: String = row.try_get("type")?;
    Ok(Transaction {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        account_id: row.try_get("account_id")?,
        category_id: row.try_get("category_id")?,
        category: row.try_get("category_name")?,
        amount: row.try_get("amount")?,
        description: row.try_get("description")?,
        transaction_date: row.try_get("transaction_date")?,
        kind: transaction_type_from_db(&kind),
        merchant: row.try_get("merchant")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
    })
}

fn goal_from_row(row: &PgRow) -> std::result::Result<Goal, sqlx::Error> {
    let priority: String = row.try_get("priority")?;
    Ok(Goal {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        target_amount: row.try_get("target_amount")?,
        current_amount: row.try_get("current_amount")?,
        target_date: row.try_get("target_date")?,
        category: row.try_get("category")?,
        priority: priority_from_db(&priority),
        is_completed: row.try_get("is_completed")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait::async_trait]
impl FinancialDataStore for PostgresFinancialStore {
    async fn get_accounts(&self, user_id: Uuid) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, name, type, balance::float8 AS balance, currency, is_active, created_at
            FROM accounts
            WHERE user_id = $1 AND is_active = TRUE
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("fetch accounts"))?;

        rows.iter()
            .map(account_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_err("decode accounts"))
    }

    async fn get_transactions(&self, user_id: Uuid, limit: i64) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.user_id, t.account_id, t.category_id, c.name AS category_name,
                   t.amount::float8 AS amount, t.description, t.transaction_date, t.type,
                   t.merchant, t.notes, t.created_at
            FROM transactions t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE t.user_id = $1
            ORDER BY t.transaction_date DESC, t.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("fetch transactions"))?;

        rows.iter()
            .map(transaction_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_err("decode transactions"))
    }

    async fn get_goals(&self, user_id: Uuid) -> Result<Vec<Goal>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, title, description,
                   target_amount::float8 AS target_amount,
                   current_amount::float8 AS current_amount,
                   target_date, category, priority, is_completed, created_at
            FROM goals
            WHERE user_id = $1
            ORDER BY target_date ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("fetch goals"))?;

        rows.iter()
            .map(goal_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_err("decode goals"))
    }
}
