//! Snippet and user records and the stores that hold them.
//!
//! Stores are async traits so handlers do not care where records live. The
//! in-memory implementations keep everything behind a tokio `RwLock`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// How many snippets [`SnippetStore::latest`] returns at most.
pub const LATEST_LIMIT: usize = 10;

/// A stored text snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl Snippet {
    /// Returns `true` if the snippet is still visible at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires > now
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub created: DateTime<Utc>,
}

/// Storage for snippets.
#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Stores a new snippet that expires `expires_days` from now and returns
    /// its id.
    async fn insert(&self, title: &str, content: &str, expires_days: i64)
        -> Result<i64, StoreError>;

    /// Fetches a snippet that has not expired.
    ///
    /// # Errors
    ///
    /// [`StoreError::NoRecord`] if the id is unknown or the snippet expired.
    async fn get(&self, id: i64) -> Result<Snippet, StoreError>;

    /// The newest live snippets, newest first, at most [`LATEST_LIMIT`].
    async fn latest(&self) -> Result<Vec<Snippet>, StoreError>;
}

/// Storage for users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Hashes `password` and stores a new user, returning its id.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateEmail`] if the email is already registered.
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<i64, StoreError>;
}

#[derive(Debug)]
struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// An in-memory snippet store.
#[derive(Debug, Default, Clone)]
pub struct InMemorySnippetStore {
    table: Arc<RwLock<Table<Snippet>>>,
}

impl InMemorySnippetStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnippetStore for InMemorySnippetStore {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: i64,
    ) -> Result<i64, StoreError> {
        let created = Utc::now();
        let mut table = self.table.write().await;
        let id = table.next_id();
        table.rows.insert(
            id,
            Snippet {
                id,
                title: title.to_string(),
                content: content.to_string(),
                created,
                expires: created + Duration::days(expires_days),
            },
        );
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Snippet, StoreError> {
        let now = Utc::now();
        self.table
            .read()
            .await
            .rows
            .get(&id)
            .filter(|s| s.is_live(now))
            .cloned()
            .ok_or(StoreError::NoRecord)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, StoreError> {
        let now = Utc::now();
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .rev()
            .filter(|s| s.is_live(now))
            .take(LATEST_LIMIT)
            .cloned()
            .collect())
    }
}

/// An in-memory user store hashing passwords with bcrypt.
#[derive(Debug, Clone)]
pub struct InMemoryUserStore {
    table: Arc<RwLock<Table<User>>>,
    cost: u32,
}

impl InMemoryUserStore {
    /// Creates an empty store using bcrypt cost 12.
    pub fn new() -> Self {
        Self::with_cost(12)
    }

    /// Creates an empty store with a specific bcrypt cost.
    pub fn with_cost(cost: u32) -> Self {
        Self {
            table: Arc::new(RwLock::new(Table::default())),
            cost,
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<i64, StoreError> {
        if self
            .table
            .read()
            .await
            .rows
            .values()
            .any(|u| u.email == email)
        {
            return Err(StoreError::DuplicateEmail);
        }

        let password = password.to_string();
        let cost = self.cost;
        let hashed_password = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| StoreError::Hashing(format!("Task join error: {e}")))?
            .map_err(|e| StoreError::Hashing(e.to_string()))?;

        // Re-checked under the write lock.
        let mut table = self.table.write().await;
        if table.rows.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }
        let id = table.next_id();
        table.rows.insert(
            id,
            User {
                id,
                name: name.to_string(),
                email: email.to_string(),
                hashed_password,
                created: Utc::now(),
            },
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemorySnippetStore::new();
        let id = store.insert("An old silent pond", "A frog jumps in", 7).await.unwrap();
        assert_eq!(id, 1);

        let snippet = store.get(id).await.unwrap();
        assert_eq!(snippet.title, "An old silent pond");
        assert_eq!(snippet.expires - snippet.created, Duration::days(7));
    }

    #[tokio::test]
    async fn test_get_unknown_is_no_record() {
        let store = InMemorySnippetStore::new();
        assert!(matches!(store.get(99).await, Err(StoreError::NoRecord)));
    }

    #[tokio::test]
    async fn test_expired_snippets_are_hidden() {
        let store = InMemorySnippetStore::new();
        let id = store.insert("gone", "x", 0).await.unwrap();
        assert!(matches!(store.get(id).await, Err(StoreError::NoRecord)));
        assert!(store.latest().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_latest_newest_first_and_limited() {
        let store = InMemorySnippetStore::new();
        for i in 1..=12 {
            store.insert(&format!("s{i}"), "x", 1).await.unwrap();
        }
        let latest = store.latest().await.unwrap();
        assert_eq!(latest.len(), LATEST_LIMIT);
        assert_eq!(latest[0].id, 12);
        assert_eq!(latest[9].id, 3);
    }

    #[tokio::test]
    async fn test_user_insert_hashes_password() {
        let store = InMemoryUserStore::with_cost(4);
        let id = store.insert("Alice", "alice@example.com", "pa55word!").await.unwrap();
        let user = store.table.read().await.rows.get(&id).cloned().unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_ne!(user.hashed_password, "pa55word!");
        assert!(bcrypt::verify("pa55word!", &user.hashed_password).unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let store = InMemoryUserStore::with_cost(4);
        store.insert("Alice", "alice@example.com", "pa55word!").await.unwrap();
        let err = store
            .insert("Other", "alice@example.com", "different1")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }
}
