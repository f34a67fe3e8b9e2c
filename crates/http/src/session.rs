//! Per-request session extraction.
//!
//! A missing, malformed or unknown bearer token is not an error here: the
//! request simply carries no identity, and operations that need one answer
//! with `authentication_required`.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use bookmate_authz::{bearer_token, Identity, SessionProvider};

use crate::error::AppError;

/// What handlers need to resolve sessions and to point anonymous callers
/// at the sign-in view.
#[derive(Clone)]
pub struct SessionState {
    pub provider: Arc<dyn SessionProvider>,
    pub sign_in_url: Arc<str>,
}

impl SessionState {
    pub fn new(provider: Arc<dyn SessionProvider>, sign_in_url: &str) -> Self {
        Self {
            provider,
            sign_in_url: Arc::from(sign_in_url),
        }
    }

    pub fn authentication_required(&self, message: impl Into<String>) -> AppError {
        AppError::authentication_required(message, self.sign_in_url.as_ref())
    }
}

/// The caller's identity, if any, plus the raw token for sign-out.
#[derive(Debug, Clone, Default)]
pub struct CurrentSession {
    pub identity: Option<Identity>,
    pub token: Option<String>,
}

impl CurrentSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    SessionState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_string)
        else {
            return Ok(Self::anonymous());
        };

        let sessions = SessionState::from_ref(state);
        let identity = sessions.provider.resolve(&token).await.map_err(|err| {
            tracing::warn!(provider = sessions.provider.name(), error = %err, "session lookup failed");
            AppError::upstream(err.to_string())
        })?;

        if identity.is_none() {
            tracing::debug!("bearer token not recognised; treating request as anonymous");
        }

        Ok(Self {
            identity,
            token: Some(token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use bookmate_authz::{SessionError, StaticSessions};
    use tower::ServiceExt;

    async fn whoami(session: CurrentSession) -> String {
        session
            .identity()
            .map(|identity| identity.user_id.clone())
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn router() -> Router {
        let sessions = StaticSessions::new();
        sessions.insert("t-a", Identity::new("user-a"));
        let state = SessionState::new(Arc::new(sessions), "/auth");
        Router::new().route("/whoami", get(whoami)).with_state(state)
    }

    async fn call(auth: Option<&str>) -> String {
        let mut request = Request::get("/whoami");
        if let Some(auth) = auth {
            request = request.header("authorization", auth);
        }
        let response = router()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn resolves_known_bearer_token() {
        assert_eq!(call(Some("Bearer t-a")).await, "user-a");
    }

    #[tokio::test]
    async fn unknown_or_missing_token_is_anonymous() {
        assert_eq!(call(None).await, "anonymous");
        assert_eq!(call(Some("Bearer nope")).await, "anonymous");
        assert_eq!(call(Some("Basic dXNlcg==")).await, "anonymous");
    }

    struct UnreachableProvider;

    #[async_trait::async_trait]
    impl SessionProvider for UnreachableProvider {
        fn name(&self) -> &'static str {
            "unreachable"
        }

        async fn resolve(&self, _token: &str) -> Result<Option<Identity>, SessionError> {
            Err(SessionError::Backend(bookmate_db::DbError::Status {
                status: 503,
                message: "upstream connect error at https://xyz.example.co/auth/v1/user".to_string(),
            }))
        }

        async fn sign_out(&self, _token: &str) -> Result<(), SessionError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn provider_failure_is_a_generic_bad_gateway() {
        let state = SessionState::new(Arc::new(UnreachableProvider), "/auth");
        let app = Router::new().route("/whoami", get(whoami)).with_state(state);

        let response = app
            .oneshot(
                Request::get("/whoami")
                    .header("authorization", "Bearer t-a")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains(crate::error::UPSTREAM_MESSAGE));
        assert!(!body.contains("example.co"));
    }
}
