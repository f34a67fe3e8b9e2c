//! HTTP handlers for the books module.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bookmate_http::{error::AppError, session::CurrentSession};
use rand::{rngs::StdRng, SeedableRng};
use time::OffsetDateTime;

use super::error::BookError;
use super::models::{Book, BookCard, GenreFilter, LikeOutcome, NewBook, ViewQuery};
use super::{likes, service, view};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_books).post(submit_book))
        .route("/random", get(random_book))
        .route("/genres", get(genres))
        .route("/health", get(health_check))
        .route("/{id}", axum::routing::delete(delete_book))
        .route("/{id}/like", post(toggle_like))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

/// Search, filter and sort the shared list.
async fn list_books(
    State(state): State<AppState>,
    session: CurrentSession,
    query: Result<Query<ViewQuery>, QueryRejection>,
) -> Result<Json<Vec<BookCard>>, AppError> {
    // Signed-out callers get the sign-in answer whatever the query says.
    if session.identity().is_none() {
        return Err(state.reject(BookError::authentication_required("browse books")));
    }
    let Query(query) = query.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let books = service::browse(state.store.as_ref(), session.identity(), &query)
        .await
        .map_err(|err| state.reject(err))?;

    let now = OffsetDateTime::now_utc();
    Ok(Json(
        books
            .into_iter()
            .map(|book| view::to_card(book, now))
            .collect(),
    ))
}

async fn random_book(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<BookCard>, AppError> {
    let mut rng = StdRng::from_entropy();
    let book = service::random_book(state.store.as_ref(), session.identity(), &mut rng)
        .await
        .map_err(|err| state.reject(err))?
        .ok_or_else(|| AppError::not_found("No books have been recommended yet"))?;

    Ok(Json(view::to_card(book, OffsetDateTime::now_utc())))
}

async fn genres() -> Json<Vec<String>> {
    Json(
        GenreFilter::options()
            .into_iter()
            .map(|filter| filter.to_string())
            .collect(),
    )
}

async fn submit_book(
    State(state): State<AppState>,
    session: CurrentSession,
    payload: Result<Json<NewBook>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(submission) =
        payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let book = service::submit_book(state.store.as_ref(), session.identity(), &submission)
        .await
        .map_err(|err| state.reject(err))?;

    Ok((StatusCode::CREATED, Json(book)))
}

async fn delete_book(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    service::delete_book(state.store.as_ref(), session.identity(), &id)
        .await
        .map_err(|err| state.reject(err))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_like(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<LikeOutcome>, AppError> {
    let outcome = likes::toggle_like(state.store.as_ref(), session.identity(), &id)
        .await
        .map_err(|err| state.reject(err))?;
    Ok(Json(outcome))
}
