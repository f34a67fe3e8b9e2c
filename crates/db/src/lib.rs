//! Thin client for the hosted backend: PostgREST-style tables under
//! `/rest/v1` and the auth endpoints under `/auth/v1`.
//!
//! The client knows nothing about books. Callers describe rows with their
//! own serde types and narrow requests with [`Query`].

use std::time::Duration;

use bookmate_kernel::settings::StoreSettings;
use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

const REST_PREFIX: &str = "/rest/v1";
const AUTH_PREFIX: &str = "/auth/v1";
/// Postgres unique-violation code as reported by PostgREST
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("invalid store configuration: {0}")]
    Config(String),

    #[error("request to hosted store failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("conflicting write: {0}")]
    Conflict(String),

    #[error("hosted store returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// Row filter, ordering and limit for a table request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    filters: Vec<(String, String)>,
    order: Option<String>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = value`
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{value}")));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(format!("{column}.desc"));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string pairs in the order PostgREST expects them.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.filters.clone();
        if let Some(order) = &self.order {
            pairs.push(("order".to_string(), order.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// User record returned by the auth endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

/// Client for one hosted project.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Build a client from the `store` settings section.
pub fn connect(settings: &StoreSettings) -> Result<RestClient, DbError> {
    let base_url = settings.endpoint.trim_end_matches('/').to_string();
    if base_url.is_empty() {
        return Err(DbError::Config("store.endpoint is empty".to_string()));
    }
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(DbError::Config(format!(
            "store.endpoint must be an http(s) URL, got '{base_url}'"
        )));
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(settings.request_timeout_ms))
        .build()?;

    tracing::info!(target: "bookmate-db", endpoint = %base_url, "hosted store client ready");

    Ok(RestClient {
        http,
        base_url,
        api_key: settings.api_key.clone(),
    })
}

impl RestClient {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}{}/{}", self.base_url, REST_PREFIX, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}{}/{}", self.base_url, AUTH_PREFIX, path)
    }

    fn request(&self, method: Method, url: String, bearer: Option<&str>) -> RequestBuilder {
        let bearer = bearer.unwrap_or(&self.api_key);
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
    }

    /// Rows of `table` matching `query`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, DbError> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(query.to_pairs());

        let response = self
            .request(Method::GET, self.table_url(table), None)
            .query(&pairs)
            .send()
            .await?;
        decode(response).await
    }

    /// Insert one row and return what the service stored.
    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
    ) -> Result<Vec<T>, DbError> {
        let response = self
            .request(Method::POST, self.table_url(table), None)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        decode(response).await
    }

    /// Patch every row matching `query`; returns the updated rows.
    pub async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
        patch: &B,
    ) -> Result<Vec<T>, DbError> {
        let response = self
            .request(Method::PATCH, self.table_url(table), None)
            .header("Prefer", "return=representation")
            .query(&query.to_pairs())
            .json(patch)
            .send()
            .await?;
        decode(response).await
    }

    /// Delete every row matching `query`; returns how many went away.
    pub async fn delete(&self, table: &str, query: &Query) -> Result<usize, DbError> {
        let response = self
            .request(Method::DELETE, self.table_url(table), None)
            .header("Prefer", "return=representation")
            .query(&query.to_pairs())
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = decode(response).await?;
        Ok(rows.len())
    }

    /// Resolve an access token to its user; `None` when the token is not
    /// accepted.
    pub async fn auth_user(&self, access_token: &str) -> Result<Option<AuthUser>, DbError> {
        let response = self
            .request(Method::GET, self.auth_url("user"), Some(access_token))
            .send()
            .await?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => decode(response).await.map(Some),
        }
    }

    /// Revoke the session behind `access_token`.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), DbError> {
        let response = self
            .request(Method::POST, self.auth_url("logout"), Some(access_token))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify(status.as_u16(), &body))
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, DbError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    let body = response.text().await.unwrap_or_default();
    let err = classify(status.as_u16(), &body);
    tracing::warn!(target: "bookmate-db", status = status.as_u16(), error = %err, "hosted store request failed");
    Err(err)
}

/// Map a non-success response to a [`DbError`].
fn classify(status: u16, body: &str) -> DbError {
    let parsed: Option<RemoteErrorBody> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|b| b.message.clone().or_else(|| b.msg.clone()))
        .unwrap_or_else(|| body.trim().to_string());
    let unique_violation = parsed
        .as_ref()
        .and_then(|b| b.code.as_deref())
        .is_some_and(|code| code == UNIQUE_VIOLATION);

    // Only a duplicate key is a conflict; a 409 also covers foreign-key
    // violations, which mean the referenced row is gone.
    if unique_violation {
        DbError::Conflict(message)
    } else {
        DbError::Status { status, message }
    }
}
