use async_trait::async_trait;
use bookmate_db::{DbError, Query, RestClient};
use serde_json::json;

use super::{adjusted_likes, BookStore, StoreError};
use crate::modules::books::models::{Book, LikeRelation};
use crate::modules::users::models::{Profile, ProfileUpdate};

const BOOKS: &str = "books";
const LIKES: &str = "book_likes";
const PROFILES: &str = "profiles";

/// Compare-and-swap attempts before a counter update gives up.
const MAX_COUNTER_ATTEMPTS: usize = 5;

/// Store backed by the hosted tables.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: RestClient,
}

impl RestStore {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    fn by_id(id: &str) -> Query {
        Query::new().eq("id", id)
    }

    fn like_pair(book_id: &str, user_id: &str) -> Query {
        Query::new().eq("book_id", book_id).eq("user_id", user_id)
    }
}

#[async_trait]
impl BookStore for RestStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn list_books(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self
            .client
            .select(BOOKS, &Query::new().order_desc("created_at"))
            .await?)
    }

    async fn list_books_by_owner(&self, user_id: &str) -> Result<Vec<Book>, StoreError> {
        let query = Query::new().eq("user_id", user_id).order_desc("created_at");
        Ok(self.client.select(BOOKS, &query).await?)
    }

    async fn get_book(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let rows: Vec<Book> = self.client.select(BOOKS, &Self::by_id(id).limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_book(&self, book: Book) -> Result<Book, StoreError> {
        let rows: Vec<Book> = self.client.insert(BOOKS, &book).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Conflict(format!("insert of book '{}' returned no row", book.id)))
    }

    /// Read the counter, then write the new value only if nobody changed it
    /// in between (`PATCH … ?likes=eq.<old>`); retry on a lost race.
    async fn update_book_likes(&self, id: &str, delta: i64) -> Result<u32, StoreError> {
        for attempt in 1..=MAX_COUNTER_ATTEMPTS {
            let current = self
                .get_book(id)
                .await?
                .ok_or_else(|| StoreError::not_found("book", id))?
                .likes;
            let next = adjusted_likes(current, delta);
            if next == current {
                return Ok(current);
            }

            let guard = Self::by_id(id).eq("likes", current);
            let rows: Vec<Book> = self
                .client
                .update(BOOKS, &guard, &json!({ "likes": next }))
                .await?;
            if !rows.is_empty() {
                return Ok(next);
            }
            tracing::debug!(book_id = id, attempt, "like counter changed underneath; retrying");
        }

        tracing::warn!(book_id = id, "like counter update kept losing races");
        Err(StoreError::Conflict(format!(
            "like counter of book '{id}' is contended; try again"
        )))
    }

    async fn delete_book(&self, id: &str, owner: &str) -> Result<bool, StoreError> {
        let query = Self::by_id(id).eq("user_id", owner);
        Ok(self.client.delete(BOOKS, &query).await? > 0)
    }

    async fn find_like(
        &self,
        book_id: &str,
        user_id: &str,
    ) -> Result<Option<LikeRelation>, StoreError> {
        let rows: Vec<LikeRelation> = self
            .client
            .select(LIKES, &Self::like_pair(book_id, user_id).limit(1))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_like(&self, like: LikeRelation) -> Result<(), StoreError> {
        self.client
            .insert::<_, serde_json::Value>(LIKES, &like)
            .await
            .map(|_| ())
            .map_err(|err| like_insert_error(err, &like.book_id))
    }

    async fn delete_like(&self, book_id: &str, user_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .client
            .delete(LIKES, &Self::like_pair(book_id, user_id))
            .await?
            > 0)
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let rows: Vec<Profile> = self
            .client
            .select(PROFILES, &Self::by_id(user_id).limit(1))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, StoreError> {
        let rows: Vec<Profile> = self
            .client
            .update(PROFILES, &Self::by_id(user_id), update)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found("profile", user_id))
    }
}

/// A 409 that is not a duplicate pair is the book's foreign key failing:
/// the book went away between the lookup and the insert.
fn like_insert_error(err: DbError, book_id: &str) -> StoreError {
    match err {
        DbError::Status { status: 409, .. } => StoreError::not_found("book", book_id),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_guard_pins_the_old_value() {
        let guard = RestStore::by_id("1").eq("likes", 2);
        assert_eq!(
            guard.to_pairs(),
            vec![
                ("id".to_string(), "eq.1".to_string()),
                ("likes".to_string(), "eq.2".to_string()),
            ]
        );
    }

    #[test]
    fn like_lookup_filters_on_both_columns() {
        let pairs = RestStore::like_pair("1", "user-a").to_pairs();
        assert_eq!(pairs[0], ("book_id".to_string(), "eq.1".to_string()));
        assert_eq!(pairs[1], ("user_id".to_string(), "eq.user-a".to_string()));
    }

    #[test]
    fn like_on_a_vanished_book_is_not_found() {
        let err = like_insert_error(
            DbError::Status {
                status: 409,
                message: "violates foreign key constraint".to_string(),
            },
            "1",
        );
        assert!(matches!(err, StoreError::NotFound { entity: "book", ref id } if id == "1"));

        let err = like_insert_error(DbError::Conflict("duplicate key".to_string()), "1");
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
