use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::accounts::{
    error::AccountError, model::Account, password::hash_password, repo::AccountStore,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Register a new account.
///
/// The pre-check gives a descriptive rejection on the common path; the
/// unique constraints on the table close the race with a concurrent
/// registration, which is reported as the same `Duplicate` outcome.
pub async fn register(
    store: &AccountStore,
    username: &str,
    email: &str,
    password: &str,
) -> Result<Account, AccountError> {
    if store.exists_with_username_or_email(username, email).await? {
        warn!(username, email, "registration rejected: identifier taken");
        return Err(AccountError::Duplicate);
    }

    let password_hash = hash_password(password);
    let created_at = Utc::now().to_rfc3339();

    let account = store
        .create(username, email, &password_hash, &created_at)
        .await
        .map_err(classify_insert_error)?;

    info!(account_id = account.id, username, "account registered");
    Ok(account)
}

/// A unique-constraint violation means we lost a registration race, not
/// that storage is broken.
fn classify_insert_error(err: sqlx::Error) -> AccountError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AccountError::Duplicate,
        other => AccountError::Storage(other),
    }
}

/// Authenticate a username/password pair.
///
/// Unknown username and wrong password collapse into the same
/// `InvalidCredentials` outcome so the error does not reveal which
/// field was wrong.
pub async fn login(
    store: &AccountStore,
    username: &str,
    password: &str,
) -> Result<Account, AccountError> {
    let password_hash = hash_password(password);
    match store.find_by_credential(username, &password_hash).await? {
        Some(account) => {
            info!(account_id = account.id, username, "login succeeded");
            Ok(account)
        }
        None => {
            warn!(username, "login failed");
            Err(AccountError::InvalidCredentials)
        }
    }
}

/// All accounts in creation order.
pub async fn list_accounts(store: &AccountStore) -> Result<Vec<Account>, AccountError> {
    Ok(store.list_all().await?)
}

pub async fn get_account(store: &AccountStore, id: i64) -> Result<Account, AccountError> {
    store.find_by_id(id).await?.ok_or(AccountError::NotFound)
}

pub async fn delete_account(store: &AccountStore, id: i64) -> Result<(), AccountError> {
    if store.delete_by_id(id).await? {
        info!(account_id = id, "account deleted");
        Ok(())
    } else {
        Err(AccountError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> AccountStore {
        AccountStore::in_memory().await.expect("in-memory store")
    }

    #[tokio::test]
    async fn register_returns_account_with_first_id() {
        let store = store().await;
        let account = register(&store, "alice", "a@x.com", "pw1").await.unwrap();
        assert_eq!(account.id, 1);
        assert_eq!(account.username, "alice");
        assert_eq!(account.email, "a@x.com");
        assert_eq!(account.password_hash, hash_password("pw1"));
        assert!(!account.created_at.is_empty());
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let store = store().await;
        register(&store, "alice", "a@x.com", "pw1").await.unwrap();
        let err = register(&store, "alice", "b@x.com", "pw2").await.unwrap_err();
        assert!(matches!(err, AccountError::Duplicate));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let store = store().await;
        register(&store, "alice", "a@x.com", "pw1").await.unwrap();
        let err = register(&store, "bob", "a@x.com", "pw2").await.unwrap_err();
        assert!(matches!(err, AccountError::Duplicate));
    }

    #[tokio::test]
    async fn constraint_violation_is_classified_as_duplicate() {
        // Bypass the service pre-check to hit the storage constraint
        // directly, as a racing registration would.
        let store = store().await;
        store
            .create("alice", "a@x.com", "h1", "2024-01-01T00:00:00+00:00")
            .await
            .unwrap();
        let err = store
            .create("alice", "b@x.com", "h2", "2024-01-01T00:00:01+00:00")
            .await
            .unwrap_err();
        assert!(matches!(classify_insert_error(err), AccountError::Duplicate));
    }

    #[tokio::test]
    async fn concurrent_registrations_of_same_username_yield_one_success() {
        let store = store().await;
        let (a, b) = tokio::join!(
            register(&store, "alice", "a@x.com", "pw1"),
            register(&store, "alice", "b@x.com", "pw2"),
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    }

    #[tokio::test]
    async fn login_succeeds_with_registered_credentials() {
        let store = store().await;
        let created = register(&store, "bob", "b@y.com", "secret").await.unwrap();
        let logged_in = login(&store, "bob", "secret").await.unwrap();
        assert_eq!(logged_in.id, created.id);
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_and_unknown_username() {
        let store = store().await;
        register(&store, "bob", "b@y.com", "secret").await.unwrap();

        let wrong_pw = login(&store, "bob", "wrong").await.unwrap_err();
        assert!(matches!(wrong_pw, AccountError::InvalidCredentials));

        let unknown = login(&store, "nobody", "secret").await.unwrap_err();
        assert!(matches!(unknown, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn list_returns_accounts_in_creation_order() {
        let store = store().await;
        register(&store, "first", "f@x.com", "pw").await.unwrap();
        register(&store, "second", "s@x.com", "pw").await.unwrap();

        let all = list_accounts(&store).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].username, "first");
        assert_eq!(all[1].username, "second");
    }

    #[tokio::test]
    async fn get_and_delete_report_not_found_for_unknown_ids() {
        let store = store().await;
        assert!(matches!(
            get_account(&store, 999).await.unwrap_err(),
            AccountError::NotFound
        ));
        assert!(matches!(
            delete_account(&store, 999).await.unwrap_err(),
            AccountError::NotFound
        ));
    }

    #[tokio::test]
    async fn deleted_account_is_gone() {
        let store = store().await;
        let account = register(&store, "alice", "a@x.com", "pw1").await.unwrap();

        delete_account(&store, account.id).await.unwrap();

        assert!(matches!(
            get_account(&store, account.id).await.unwrap_err(),
            AccountError::NotFound
        ));
        assert!(matches!(
            delete_account(&store, account.id).await.unwrap_err(),
            AccountError::NotFound
        ));
    }

    #[test]
    fn email_regex_accepts_plausible_addresses() {
        assert!(is_valid_email("rock@music.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@x.com"));
        assert!(!is_valid_email("spaces in@x.com"));
    }
}
