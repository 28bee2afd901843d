// Database access layer
//
// Wraps a PgPool and executes the statements built by `sql`. Result rows
// are decoded through Postgres itself: queries are wrapped in
// `json_agg(row_to_json(..))` so arbitrary user tables come back as JSON
// values without compile-time row types.

use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

use crate::sql::Statement;

/// Database access layer wrapping a connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a database layer over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database at the given URL
    pub async fn from_url(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self { pool })
    }

    /// Access the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run a SELECT-shaped statement and return its rows as JSON objects.
    pub async fn select_json(&self, stmt: &Statement) -> Result<Vec<Value>> {
        let wrapped = format!(
            "SELECT COALESCE(json_agg(row_to_json(t)), '[]'::json) AS rows FROM ({}) t",
            stmt.sql
        );
        self.fetch_rows(&wrapped, &stmt.params).await
    }

    /// Run a DML statement with RETURNING and collect the returned rows.
    pub async fn returning_json(&self, stmt: &Statement) -> Result<Vec<Value>> {
        let wrapped = format!(
            "WITH t AS ({}) SELECT COALESCE(json_agg(row_to_json(t)), '[]'::json) AS rows FROM t",
            stmt.sql
        );
        self.fetch_rows(&wrapped, &stmt.params).await
    }

    /// Run a statement for its side effects (DDL, mostly).
    pub async fn execute(&self, stmt: &Statement) -> Result<u64> {
        tracing::debug!(sql = %stmt.sql, "executing statement");
        let query = bind_all(sqlx::query(&stmt.sql), &stmt.params);
        let result = query
            .execute(&self.pool)
            .await
            .with_context(|| format!("Statement failed: {}", stmt.sql))?;
        Ok(result.rows_affected())
    }

    /// Run a sequence of statements inside a single transaction.
    ///
    /// All statements commit together; any failure rolls the whole batch
    /// back (the transaction guard rolls back on drop).
    pub async fn run_transaction(&self, statements: &[Statement]) -> Result<usize> {
        tracing::debug!(count = statements.len(), "executing transaction batch");
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        for stmt in statements {
            let query = bind_all(sqlx::query(&stmt.sql), &stmt.params);
            query
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Statement failed in transaction: {}", stmt.sql))?;
        }

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(statements.len())
    }

    /// Issue a bare ROLLBACK on one pooled connection.
    ///
    /// Outside an open transaction this is a no-op warning on the server
    /// side; the conversational contract still reports it as handled.
    pub async fn rollback(&self) -> Result<()> {
        sqlx::query("ROLLBACK")
            .execute(&self.pool)
            .await
            .context("Rollback failed")?;
        Ok(())
    }

    async fn fetch_rows(&self, wrapped_sql: &str, params: &[Value]) -> Result<Vec<Value>> {
        let query = bind_all(sqlx::query(wrapped_sql), params);
        let row = query
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Query failed: {}", wrapped_sql))?;

        let rows: Value = row.try_get("rows").context("Failed to decode result rows")?;
        match rows {
            Value::Array(items) => Ok(items),
            other => Ok(vec![other]),
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

/// Bind JSON parameter values positionally.
///
/// Scalars bind as their natural Postgres types; anything structured goes
/// over as jsonb.
fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [Value],
) -> Query<'q, Postgres, PgArguments> {
    for value in params {
        query = match value {
            Value::Null => query.bind(Option::<String>::None),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    query.bind(i)
                } else {
                    query.bind(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => query.bind(s.as_str()),
            other => query.bind(other),
        };
    }
    query
}
