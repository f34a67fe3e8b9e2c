//! Book operations that need a store and, usually, a signed-in user.

use bookmate_authz::Identity;
use rand::Rng;
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::{BookError, FieldError};
use super::models::{Book, Genre, NewBook, ViewQuery};
use super::view;
use crate::store::BookStore;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Fetch the whole list and derive the requested view of it.
pub async fn browse(
    store: &dyn BookStore,
    identity: Option<&Identity>,
    query: &ViewQuery,
) -> Result<Vec<Book>, BookError> {
    identity.ok_or(BookError::authentication_required("browse books"))?;
    let books = store.list_books().await?;
    Ok(view::derive_view(&books, query))
}

/// A uniformly random book from the full list, if there is one.
pub async fn random_book<R: Rng + Send>(
    store: &dyn BookStore,
    identity: Option<&Identity>,
    rng: &mut R,
) -> Result<Option<Book>, BookError> {
    identity.ok_or(BookError::authentication_required("browse books"))?;
    let books = store.list_books().await?;
    Ok(view::random_pick(&books, rng).cloned())
}

/// Check a submission and return it as a fresh book owned by `user_id`.
pub fn validate(
    submission: &NewBook,
    user_id: &str,
    now: OffsetDateTime,
) -> Result<Book, BookError> {
    let mut problems = Vec::new();

    let title = submission.title.trim();
    let author = submission.author.trim();
    let description = submission.description.trim();
    for (field, value) in [
        ("title", title),
        ("author", author),
        ("description", description),
    ] {
        if value.is_empty() {
            problems.push(FieldError::new(field, "required"));
        }
    }

    let genre = if submission.genre.is_empty() {
        problems.push(FieldError::new("genre", "required"));
        None
    } else {
        match submission.genre.parse::<Genre>() {
            Ok(genre) => Some(genre),
            Err(err) => {
                problems.push(FieldError::new("genre", err.to_string()));
                None
            }
        }
    };

    let rating = u8::try_from(submission.rating)
        .ok()
        .filter(|_| (MIN_RATING..=MAX_RATING).contains(&submission.rating));
    if rating.is_none() {
        problems.push(FieldError::new(
            "rating",
            format!("must be between {MIN_RATING} and {MAX_RATING}"),
        ));
    }

    match (genre, rating) {
        (Some(genre), Some(rating)) if problems.is_empty() => Ok(Book {
            id: Uuid::now_v7().to_string(),
            title: title.to_string(),
            author: author.to_string(),
            genre,
            rating,
            description: description.to_string(),
            likes: 0,
            created_at: now,
            user_id: user_id.to_string(),
        }),
        _ => Err(BookError::Validation(problems)),
    }
}

/// Add a recommendation on behalf of the signed-in user.
pub async fn submit_book(
    store: &dyn BookStore,
    identity: Option<&Identity>,
    submission: &NewBook,
) -> Result<Book, BookError> {
    let identity = identity.ok_or(BookError::authentication_required("add books"))?;
    let book = validate(submission, &identity.user_id, OffsetDateTime::now_utc())?;
    let book = store.insert_book(book).await?;

    tracing::info!(
        book_id = %book.id,
        user_id = %identity.user_id,
        genre = %book.genre,
        "book submitted"
    );
    Ok(book)
}

/// Delete one of the caller's own books. Someone else's book looks the same
/// as a missing one.
pub async fn delete_book(
    store: &dyn BookStore,
    identity: Option<&Identity>,
    book_id: &str,
) -> Result<(), BookError> {
    let identity = identity.ok_or(BookError::authentication_required("delete books"))?;
    if !store.delete_book(book_id, &identity.user_id).await? {
        return Err(BookError::BookNotFound(book_id.to_string()));
    }
    tracing::info!(book_id, user_id = %identity.user_id, "book deleted");
    Ok(())
}

/// The caller's own submissions, newest first.
pub async fn own_books(
    store: &dyn BookStore,
    identity: Option<&Identity>,
) -> Result<Vec<Book>, BookError> {
    let identity = identity.ok_or(BookError::authentication_required("view your books"))?;
    Ok(store.list_books_by_owner(&identity.user_id).await?)
}
