//! Like / unlike toggle.

use bookmate_authz::Identity;

use super::error::BookError;
use super::models::{LikeOutcome, LikeRelation};
use crate::store::{BookStore, StoreError};

/// Flip the caller's like on `book_id` and move the counter with it.
///
/// The counter changes through the store's atomic adjust, and only when
/// this call actually created or removed the relationship. A racing
/// duplicate like or unlike leaves the counter alone.
pub async fn toggle_like(
    store: &dyn BookStore,
    identity: Option<&Identity>,
    book_id: &str,
) -> Result<LikeOutcome, BookError> {
    let identity = identity.ok_or(BookError::authentication_required("like books"))?;
    let user_id = identity.user_id.as_str();

    let Some(book) = store.get_book(book_id).await? else {
        return Err(BookError::BookNotFound(book_id.to_string()));
    };

    let existing = store.find_like(book_id, user_id).await?;

    let outcome = if existing.is_some() {
        let likes = if store.delete_like(book_id, user_id).await? {
            match store.update_book_likes(book_id, -1).await {
                Ok(likes) => likes,
                Err(err) => {
                    restore(store, book_id, user_id, true).await;
                    return Err(err.into());
                }
            }
        } else {
            book.likes
        };
        LikeOutcome {
            book_id: book_id.to_string(),
            liked: false,
            likes,
        }
    } else {
        let likes = match store.insert_like(LikeRelation::new(book_id, user_id)).await {
            Ok(()) => match store.update_book_likes(book_id, 1).await {
                Ok(likes) => likes,
                Err(err) => {
                    restore(store, book_id, user_id, false).await;
                    return Err(err.into());
                }
            },
            Err(StoreError::Conflict(_)) => book.likes,
            Err(err) => return Err(err.into()),
        };
        LikeOutcome {
            book_id: book_id.to_string(),
            liked: true,
            likes,
        }
    };

    tracing::info!(
        book_id,
        user_id,
        liked = outcome.liked,
        likes = outcome.likes,
        "like toggled"
    );
    Ok(outcome)
}

/// Put the relationship back the way it was after the counter refused to
/// move, so the counter keeps matching the relationships.
async fn restore(store: &dyn BookStore, book_id: &str, user_id: &str, liked: bool) {
    let restored = if liked {
        store
            .insert_like(LikeRelation::new(book_id, user_id))
            .await
            .map(|()| true)
    } else {
        store.delete_like(book_id, user_id).await
    };
    match restored {
        Ok(_) => tracing::warn!(
            book_id,
            user_id,
            liked,
            "like counter update failed; relationship restored"
        ),
        Err(err) => tracing::error!(
            book_id,
            user_id,
            liked,
            error = %err,
            "like counter update failed and the relationship could not be restored"
        ),
    }
}
