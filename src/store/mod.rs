//! Repository seam between the book logic and whatever holds the tables.

pub mod fixtures;
pub mod memory;
pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use bookmate_db::DbError;
use bookmate_kernel::settings::{Settings, StoreBackend};
use thiserror::Error;

use crate::modules::books::models::{Book, LikeRelation};
use crate::modules::users::models::{Profile, ProfileUpdate};

pub use memory::MemoryStore;
pub use rest::RestStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("conflicting write: {0}")]
    Conflict(String),

    #[error(transparent)]
    Remote(DbError),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(message) => StoreError::Conflict(message),
            other => StoreError::Remote(other),
        }
    }
}

/// Tables the service reads and writes: `books`, `book_likes` and
/// `profiles`.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Short label for logs
    fn backend(&self) -> &'static str;

    /// Every book, newest first
    async fn list_books(&self) -> Result<Vec<Book>, StoreError>;

    /// Books submitted by `user_id`, newest first
    async fn list_books_by_owner(&self, user_id: &str) -> Result<Vec<Book>, StoreError>;

    async fn get_book(&self, id: &str) -> Result<Option<Book>, StoreError>;

    async fn insert_book(&self, book: Book) -> Result<Book, StoreError>;

    /// Atomically add `delta` to the like counter, flooring at zero, and
    /// return the new value.
    async fn update_book_likes(&self, id: &str, delta: i64) -> Result<u32, StoreError>;

    /// Delete `id` only if `owner` submitted it. Returns whether a row went
    /// away. The book's like relationships go with it.
    async fn delete_book(&self, id: &str, owner: &str) -> Result<bool, StoreError>;

    async fn find_like(
        &self,
        book_id: &str,
        user_id: &str,
    ) -> Result<Option<LikeRelation>, StoreError>;

    /// Fails with [`StoreError::Conflict`] if the pair already exists.
    async fn insert_like(&self, like: LikeRelation) -> Result<(), StoreError>;

    async fn delete_like(&self, book_id: &str, user_id: &str) -> Result<bool, StoreError>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError>;

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, StoreError>;
}

/// Counter value after applying `delta`, floored at zero.
pub fn adjusted_likes(current: u32, delta: i64) -> u32 {
    let next = i64::from(current).saturating_add(delta);
    u32::try_from(next.max(0)).unwrap_or(u32::MAX)
}

/// Build the store named by `store.backend`.
pub fn from_settings(settings: &Settings) -> anyhow::Result<Arc<dyn BookStore>> {
    let store: Arc<dyn BookStore> = match settings.store.backend {
        StoreBackend::Memory => {
            let store = if settings.store.seed_sample_data {
                MemoryStore::with_books(fixtures::sample_books())
            } else {
                MemoryStore::new()
            };
            // No signup flow locally: statically configured users get a
            // profile row up front.
            let profiles = settings.auth.tokens.iter().map(|token| Profile {
                id: token.user_id.clone(),
                email: token.email.clone().unwrap_or_default(),
                full_name: None,
                avatar_url: None,
            });
            Arc::new(store.with_profiles(profiles))
        }
        StoreBackend::Rest => Arc::new(RestStore::new(bookmate_db::connect(&settings.store)?)),
    };
    tracing::info!(backend = store.backend(), "book store ready");
    Ok(store)
}
