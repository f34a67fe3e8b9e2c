use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{adjusted_likes, BookStore, StoreError};
use crate::modules::books::models::{Book, LikeRelation};
use crate::modules::users::models::{Profile, ProfileUpdate};

#[derive(Debug, Default)]
struct Tables {
    books: Vec<Book>,
    likes: Vec<LikeRelation>,
    profiles: HashMap<String, Profile>,
}

/// Process-local store. Every write takes the single write lock, so a
/// counter adjustment can never interleave with another.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_books(books: Vec<Book>) -> Self {
        Self {
            tables: RwLock::new(Tables {
                books,
                ..Tables::default()
            }),
        }
    }

    pub fn with_profiles(mut self, profiles: impl IntoIterator<Item = Profile>) -> Self {
        let tables = self.tables.get_mut();
        for profile in profiles {
            tables.profiles.insert(profile.id.clone(), profile);
        }
        self
    }

    pub async fn insert_profile(&self, profile: Profile) {
        self.tables
            .write()
            .await
            .profiles
            .insert(profile.id.clone(), profile);
    }

    /// Number of like relationships referencing `book_id`.
    pub async fn like_count(&self, book_id: &str) -> usize {
        self.tables
            .read()
            .await
            .likes
            .iter()
            .filter(|like| like.book_id == book_id)
            .count()
    }
}

fn newest_first(mut books: Vec<Book>) -> Vec<Book> {
    books.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    books
}

#[async_trait]
impl BookStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list_books(&self) -> Result<Vec<Book>, StoreError> {
        let books = self.tables.read().await.books.clone();
        Ok(newest_first(books))
    }

    async fn list_books_by_owner(&self, user_id: &str) -> Result<Vec<Book>, StoreError> {
        let books = self
            .tables
            .read()
            .await
            .books
            .iter()
            .filter(|book| book.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(books))
    }

    async fn get_book(&self, id: &str) -> Result<Option<Book>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .books
            .iter()
            .find(|book| book.id == id)
            .cloned())
    }

    async fn insert_book(&self, book: Book) -> Result<Book, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.books.iter().any(|existing| existing.id == book.id) {
            return Err(StoreError::Conflict(format!("book '{}' already exists", book.id)));
        }
        tables.books.push(book.clone());
        Ok(book)
    }

    async fn update_book_likes(&self, id: &str, delta: i64) -> Result<u32, StoreError> {
        let mut tables = self.tables.write().await;
        let book = tables
            .books
            .iter_mut()
            .find(|book| book.id == id)
            .ok_or_else(|| StoreError::not_found("book", id))?;
        book.likes = adjusted_likes(book.likes, delta);
        Ok(book.likes)
    }

    async fn delete_book(&self, id: &str, owner: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(position) = tables
            .books
            .iter()
            .position(|book| book.id == id && book.user_id == owner)
        else {
            return Ok(false);
        };
        tables.books.remove(position);
        tables.likes.retain(|like| like.book_id != id);
        Ok(true)
    }

    async fn find_like(
        &self,
        book_id: &str,
        user_id: &str,
    ) -> Result<Option<LikeRelation>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .likes
            .iter()
            .find(|like| like.book_id == book_id && like.user_id == user_id)
            .cloned())
    }

    async fn insert_like(&self, like: LikeRelation) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.books.iter().any(|book| book.id == like.book_id) {
            return Err(StoreError::not_found("book", like.book_id));
        }
        if tables.likes.contains(&like) {
            return Err(StoreError::Conflict(format!(
                "user '{}' already likes book '{}'",
                like.user_id, like.book_id
            )));
        }
        tables.likes.push(like);
        Ok(())
    }

    async fn delete_like(&self, book_id: &str, user_id: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.likes.len();
        tables
            .likes
            .retain(|like| !(like.book_id == book_id && like.user_id == user_id));
        Ok(tables.likes.len() != before)
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.tables.read().await.profiles.get(user_id).cloned())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, StoreError> {
        let mut tables = self.tables.write().await;
        let profile = tables
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| StoreError::not_found("profile", user_id))?;
        profile.full_name = update.full_name.clone();
        Ok(profile.clone())
    }
}
