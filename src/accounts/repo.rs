use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::accounts::model::Account;

/// Durable store of account records. Uniqueness of `username` and
/// `email` is enforced by the schema itself, so a concurrent
/// registration race surfaces as a unique-constraint violation rather
/// than a double insert.
#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

impl AccountStore {
    /// Open (or create) the database at `database_url` and ensure the
    /// schema exists.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// In-memory store for tests. A single connection keeps every query
    /// on the same ephemeral database.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        debug!("accounts schema ready");
        Ok(())
    }

    /// Insert a new account. Fails with a unique-constraint violation
    /// if the username or email is already taken.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        created_at: &str,
    ) -> Result<Account, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r"
            INSERT INTO accounts (username, email, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, username, email, password_hash, created_at
            ",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r"
            SELECT id, username, email, password_hash, created_at
            FROM accounts
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r"
            SELECT id, username, email, password_hash, created_at
            FROM accounts
            WHERE username = ?
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    /// Equality match on both username and password hash; used by login.
    pub async fn find_by_credential(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r"
            SELECT id, username, email, password_hash, created_at
            FROM accounts
            WHERE username = ? AND password_hash = ?
            ",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
    }

    /// Registration pre-check: is either identifier already taken?
    pub async fn exists_with_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM accounts WHERE username = ? OR email = ?")
                .bind(username)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    /// All accounts in insertion order.
    pub async fn list_all(&self) -> Result<Vec<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r"
            SELECT id, username, email, password_hash, created_at
            FROM accounts
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Delete an account; returns whether a row was actually removed.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
