use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// One rejected field of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub error: String,
}

impl FieldError {
    pub fn new(field: &'static str, error: impl Into<String>) -> Self {
        Self {
            field,
            error: error.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BookError {
    /// The action needs a signed-in user; `action` completes "Please sign in to …"
    #[error("authentication required to {action}")]
    AuthenticationRequired { action: &'static str },

    #[error("book '{0}' not found")]
    BookNotFound(String),

    #[error("profile '{0}' not found")]
    ProfileNotFound(String),

    #[error("submission rejected: {} invalid field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookError {
    pub fn authentication_required(action: &'static str) -> Self {
        Self::AuthenticationRequired { action }
    }
}
