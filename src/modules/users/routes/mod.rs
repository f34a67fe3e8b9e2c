use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bookmate_http::{error::AppError, session::CurrentSession};
use time::OffsetDateTime;

use super::models::{Profile, ProfileUpdate};
use super::service;
use crate::modules::books::{models::BookCard, service as books, view};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/profile", get(get_profile).put(put_profile))
        .route("/books", get(own_books))
        .route("/sign-out", post(sign_out))
        .route("/health", get(health_check))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "users module is healthy"
}

async fn get_profile(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<Profile>, AppError> {
    let profile = service::load_profile(state.store.as_ref(), session.identity())
        .await
        .map_err(|err| state.reject(err))?;
    Ok(Json(profile))
}

async fn put_profile(
    State(state): State<AppState>,
    session: CurrentSession,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<Profile>, AppError> {
    let Json(update) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let profile = service::update_profile(state.store.as_ref(), session.identity(), &update)
        .await
        .map_err(|err| state.reject(err))?;
    Ok(Json(profile))
}

/// The caller's own submissions as cards.
async fn own_books(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<Vec<BookCard>>, AppError> {
    let books = books::own_books(state.store.as_ref(), session.identity())
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

async fn sign_out(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<StatusCode, AppError> {
    let (Some(identity), Some(token)) = (session.identity(), session.token.as_deref()) else {
        return Err(state
            .sessions
            .authentication_required("Please sign in to sign out."));
    };

    state
        .sessions
        .provider
        .sign_out(token)
        .await
        .map_err(|err| AppError::upstream(err.to_string()))?;

    tracing::info!(user_id = %identity.user_id, "signed out");
    Ok(StatusCode::NO_CONTENT)
}
