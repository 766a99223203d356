use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i64,              // store-assigned, immutable
    pub username: String,     // unique across all accounts
    pub email: String,        // unique across all accounts
    #[serde(skip_serializing)]
    pub password_hash: String, // SHA-256 hex digest, not exposed in JSON
    pub created_at: String,   // UTC, RFC 3339
}
