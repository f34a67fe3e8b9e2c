use std::sync::Arc;

use axum::extract::FromRef;
use bookmate_authz::SessionProvider;
use bookmate_http::{error::AppError, session::SessionState};
use bookmate_kernel::settings::Settings;
use serde_json::json;

use crate::modules::books::error::BookError;
use crate::store::{self, BookStore, StoreError};

/// Shared handles cloned into every module router.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookStore>,
    pub sessions: SessionState,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl AppState {
    pub fn new(
        store: Arc<dyn BookStore>,
        provider: Arc<dyn SessionProvider>,
        sign_in_url: &str,
    ) -> Self {
        Self {
            store,
            sessions: SessionState::new(provider, sign_in_url),
        }
    }

    /// Wire the configured store and session provider.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let provider = bookmate_authz::from_settings(settings)?;
        let store = store::from_settings(settings)?;
        Ok(Self::new(store, provider, &settings.auth.sign_in_url))
    }

    /// Translate a domain failure into the HTTP error envelope.
    pub fn reject(&self, err: BookError) -> AppError {
        match err {
            BookError::AuthenticationRequired { action } => self
                .sessions
                .authentication_required(format!("Please sign in to {action}.")),
            BookError::BookNotFound(id) => AppError::not_found(format!("Book '{id}' not found")),
            BookError::ProfileNotFound(id) => {
                AppError::not_found(format!("Profile '{id}' not found"))
            }
            BookError::Validation(problems) => AppError::validation(
                problems
                    .iter()
                    .map(|p| json!({ "field": p.field, "error": p.error }))
                    .collect(),
                "Submission has invalid fields",
            ),
            BookError::Store(StoreError::NotFound { entity, id }) => {
                AppError::not_found(format!("{entity} '{id}' not found"))
            }
            BookError::Store(StoreError::Conflict(message)) => {
                AppError::conflict(Vec::new(), message)
            }
            BookError::Store(err @ StoreError::Remote(_)) => AppError::upstream(err.to_string()),
        }
    }
}
