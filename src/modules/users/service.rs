//! Profile operations for the signed-in user.

use bookmate_authz::Identity;

use super::models::{Profile, ProfileUpdate};
use crate::modules::books::error::{BookError, FieldError};
use crate::store::{BookStore, StoreError};

pub const MAX_FULL_NAME_CHARS: usize = 120;

pub async fn load_profile(
    store: &dyn BookStore,
    identity: Option<&Identity>,
) -> Result<Profile, BookError> {
    let identity = identity.ok_or(BookError::authentication_required("view your profile"))?;
    store
        .get_profile(&identity.user_id)
        .await?
        .ok_or_else(|| BookError::ProfileNotFound(identity.user_id.clone()))
}

/// Replace the editable fields. A blank name clears it.
pub async fn update_profile(
    store: &dyn BookStore,
    identity: Option<&Identity>,
    update: &ProfileUpdate,
) -> Result<Profile, BookError> {
    let identity = identity.ok_or(BookError::authentication_required("update your profile"))?;

    let full_name = update
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    if full_name.is_some_and(|name| name.chars().count() > MAX_FULL_NAME_CHARS) {
        return Err(BookError::Validation(vec![FieldError::new(
            "full_name",
            format!("must be at most {MAX_FULL_NAME_CHARS} characters"),
        )]));
    }

    let update = ProfileUpdate {
        full_name: full_name.map(str::to_string),
    };
    match store.update_profile(&identity.user_id, &update).await {
        Ok(profile) => {
            tracing::info!(user_id = %identity.user_id, "profile updated");
            Ok(profile)
        }
        Err(StoreError::NotFound { .. }) => {
            Err(BookError::ProfileNotFound(identity.user_id.clone()))
        }
        Err(err) => Err(err.into()),
    }
}
