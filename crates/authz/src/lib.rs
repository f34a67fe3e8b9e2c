//! Session resolution.
//!
//! The identity provider is external: this crate only turns a bearer token
//! into an [`Identity`] (or nothing) and asks the provider to revoke a
//! session. Operations that need a signed-in user take the resolved
//! identity as an explicit argument.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bookmate_db::{DbError, RestClient};
use bookmate_kernel::settings::{SessionBackend, Settings, StaticToken};
use serde::Serialize;
use thiserror::Error;

/// The signed-in user, as far as the core cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session provider unavailable: {0}")]
    Backend(#[from] DbError),
}

/// Source of truth for who a bearer token belongs to.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the token is unknown, expired or revoked.
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, SessionError>;

    async fn sign_out(&self, token: &str) -> Result<(), SessionError>;
}

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Tokens fixed at startup; signing out forgets the token for the lifetime
/// of the process.
#[derive(Debug, Default)]
pub struct StaticSessions {
    tokens: RwLock<HashMap<String, Identity>>,
}

impl StaticSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens(tokens: &[StaticToken]) -> Self {
        let sessions = Self::new();
        for entry in tokens {
            let mut identity = Identity::new(&entry.user_id);
            identity.email = entry.email.clone();
            sessions.insert(&entry.token, identity);
        }
        sessions
    }

    pub fn insert(&self, token: &str, identity: Identity) {
        self.tokens
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(token.to_string(), identity);
    }
}

#[async_trait]
impl SessionProvider for StaticSessions {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn resolve(&self, token: &str) -> Result<Option<Identity>, SessionError> {
        Ok(self
            .tokens
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(token)
            .cloned())
    }

    async fn sign_out(&self, token: &str) -> Result<(), SessionError> {
        self.tokens
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(token);
        Ok(())
    }
}

/// Sessions owned by the hosted auth service.
#[derive(Debug, Clone)]
pub struct RemoteSessions {
    client: RestClient,
}

impl RemoteSessions {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionProvider for RemoteSessions {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn resolve(&self, token: &str) -> Result<Option<Identity>, SessionError> {
        let user = self.client.auth_user(token).await?;
        Ok(user.map(|user| Identity {
            user_id: user.id,
            email: user.email,
        }))
    }

    async fn sign_out(&self, token: &str) -> Result<(), SessionError> {
        self.client.sign_out(token).await?;
        Ok(())
    }
}

/// Pick the provider named by `auth.provider`.
pub fn from_settings(settings: &Settings) -> anyhow::Result<Arc<dyn SessionProvider>> {
    let provider: Arc<dyn SessionProvider> = match settings.auth.provider {
        SessionBackend::Static => {
            if settings.auth.tokens.is_empty() {
                tracing::warn!("static session provider has no tokens; every request is anonymous");
            }
            Arc::new(StaticSessions::from_tokens(&settings.auth.tokens))
        }
        SessionBackend::Remote => Arc::new(RemoteSessions::new(bookmate_db::connect(
            &settings.store,
        )?)),
    };
    tracing::info!(provider = provider.name(), "session provider ready");
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer   abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[tokio::test]
    async fn static_sessions_resolve_and_sign_out() {
        let sessions = StaticSessions::from_tokens(&[StaticToken {
            token: "t-a".to_string(),
            user_id: "user-a".to_string(),
            email: Some("a@example.com".to_string()),
        }]);

        let identity = sessions.resolve("t-a").await.unwrap().unwrap();
        assert_eq!(identity.user_id, "user-a");
        assert_eq!(identity.email.as_deref(), Some("a@example.com"));
        assert!(sessions.resolve("t-b").await.unwrap().is_none());

        sessions.sign_out("t-a").await.unwrap();
        assert!(sessions.resolve("t-a").await.unwrap().is_none());
    }

    #[test]
    fn settings_select_static_provider_by_default() {
        let provider = from_settings(&Settings::default()).unwrap();
        assert_eq!(provider.name(), "static");
    }

    #[test]
    fn remote_provider_needs_endpoint() {
        let mut settings = Settings::default();
        settings.auth.provider = SessionBackend::Remote;
        assert!(from_settings(&settings).is_err());
    }
}
