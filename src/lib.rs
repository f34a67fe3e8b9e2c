//! BookMate application library
//!
//! Book recommendation modules, the store seam and the wiring that turns
//! settings into a running HTTP service.

pub mod modules;
pub mod state;
pub mod store;
pub mod utils;

use anyhow::Context;
use bookmate_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub use state::AppState;

/// Register and initialize every module against `state`.
pub async fn build_registry(state: &AppState, settings: &Settings) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, state)?;
    registry
        .init_all(&InitCtx { settings })
        .await
        .context("failed to initialize modules")?;
    Ok(registry)
}

/// Wire the configured backends and serve until shutdown.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let state = AppState::from_settings(&settings)?;
    let registry = build_registry(&state, &settings).await?;
    bookmate_http::start_server(&registry, &settings).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use bookmate_authz::{Identity, StaticSessions};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::modules::users::models::Profile;
    use crate::store::{fixtures::sample_books, MemoryStore};

    const TOKEN_A: &str = "token-a";
    const TOKEN_B: &str = "token-b";

    async fn app() -> Router {
        let store = MemoryStore::with_books(sample_books()).with_profiles([Profile {
            id: "user-a".to_string(),
            email: "a@example.com".to_string(),
            full_name: None,
            avatar_url: None,
        }]);
        let sessions = StaticSessions::new();
        sessions.insert(TOKEN_A, Identity::new("user-a").with_email("a@example.com"));
        sessions.insert(TOKEN_B, Identity::new("user-b"));

        let settings = Settings::default();
        let state = AppState::new(Arc::new(store), Arc::new(sessions), "/auth");
        let registry = build_registry(&state, &settings).await.unwrap();
        bookmate_http::build_router(&registry, &settings)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn ids(cards: &Value) -> Vec<&str> {
        cards
            .as_array()
            .unwrap()
            .iter()
            .map(|card| card["id"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn signed_out_browse_points_at_sign_in() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/api/books", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "authentication_required");
        assert_eq!(body["error"]["message"], "Please sign in to browse books.");
        assert_eq!(body["error"]["details"][0]["sign_in_url"], "/auth");
    }

    #[tokio::test]
    async fn browse_applies_search_genre_and_sort() {
        let app = app().await;

        let (status, body) = send(&app, Method::GET, "/api/books", Some(TOKEN_A), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body)[0], "sample-6");
        assert_eq!(body.as_array().unwrap().len(), 6);

        let (_, body) = send(
            &app,
            Method::GET,
            "/api/books?sort=most-liked",
            Some(TOKEN_A),
            None,
        )
        .await;
        assert_eq!(
            ids(&body),
            ["sample-2", "sample-5", "sample-1", "sample-3", "sample-4", "sample-6"]
        );

        let (_, body) = send(&app, Method::GET, "/api/books?search=WEIR", Some(TOKEN_A), None).await;
        assert_eq!(ids(&body), ["sample-2"]);

        let (_, body) = send(&app, Method::GET, "/api/books?genre=Romance", Some(TOKEN_A), None).await;
        assert_eq!(ids(&body), ["sample-5"]);
        assert_eq!(body[0]["is_new"], false);
    }

    #[tokio::test]
    async fn unknown_sort_or_genre_is_a_bad_request() {
        let app = app().await;
        let (status, body) = send(
            &app,
            Method::GET,
            "/api/books?sort=alphabetical",
            Some(TOKEN_A),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");

        let (status, _) = send(&app, Method::GET, "/api/books?genre=Poetry", Some(TOKEN_A), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signed_out_browse_with_bad_query_still_asks_for_sign_in() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/api/books?sort=bogus", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "authentication_required");
        assert_eq!(body["error"]["details"][0]["sign_in_url"], "/auth");
    }

    #[tokio::test]
    async fn like_toggle_round_trips() {
        let app = app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/books/sample-1/like",
            Some(TOKEN_A),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "book_id": "sample-1", "liked": true, "likes": 13 }));

        let (_, body) = send(
            &app,
            Method::POST,
            "/api/books/sample-1/like",
            Some(TOKEN_B),
            None,
        )
        .await;
        assert_eq!(body["likes"], 14);

        let (_, body) = send(
            &app,
            Method::POST,
            "/api/books/sample-1/like",
            Some(TOKEN_A),
            None,
        )
        .await;
        assert_eq!(body, json!({ "book_id": "sample-1", "liked": false, "likes": 13 }));

        let (status, _) = send(&app, Method::POST, "/api/books/sample-1/like", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, Method::POST, "/api/books/missing/like", Some(TOKEN_A), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn submit_then_delete_own_book() {
        let app = app().await;
        let submission = json!({
            "title": "  Dune ",
            "author": "Frank Herbert",
            "genre": "Sci-Fi",
            "rating": 5,
            "description": "Spice, sandworms and politics."
        });

        let (status, book) = send(&app, Method::POST, "/api/books", Some(TOKEN_A), Some(submission)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(book["title"], "Dune");
        assert_eq!(book["likes"], 0);
        assert_eq!(book["user_id"], "user-a");
        let id = book["id"].as_str().unwrap().to_string();

        let (_, cards) = send(&app, Method::GET, "/api/books", Some(TOKEN_A), None).await;
        assert_eq!(ids(&cards)[0], id);
        assert_eq!(cards[0]["is_new"], true);

        let (_, own) = send(&app, Method::GET, "/api/users/books", Some(TOKEN_A), None).await;
        assert_eq!(ids(&own), [id.as_str()]);

        let uri = format!("/api/books/{id}");
        let (status, _) = send(&app, Method::DELETE, &uri, Some(TOKEN_B), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, &uri, Some(TOKEN_A), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, own) = send(&app, Method::GET, "/api/users/books", Some(TOKEN_A), None).await;
        assert!(own.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_submission_lists_every_field() {
        let app = app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/books",
            Some(TOKEN_A),
            Some(json!({ "title": " ", "genre": "Poetry", "rating": 9 })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<&str> = body["error"]["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|detail| detail["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, ["title", "author", "description", "genre", "rating"]);
    }

    #[tokio::test]
    async fn random_pick_and_genres() {
        let app = app().await;
        let (status, card) = send(&app, Method::GET, "/api/books/random", Some(TOKEN_A), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(card["id"].as_str().unwrap().starts_with("sample-"));

        let (status, genres) = send(&app, Method::GET, "/api/books/genres", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(genres[0], "All");
        assert_eq!(genres.as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn profile_read_update_and_sign_out() {
        let app = app().await;

        let (status, profile) = send(&app, Method::GET, "/api/users/profile", Some(TOKEN_A), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["email"], "a@example.com");

        let (status, profile) = send(
            &app,
            Method::PUT,
            "/api/users/profile",
            Some(TOKEN_A),
            Some(json!({ "full_name": "Ada" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["full_name"], "Ada");

        let (status, _) = send(&app, Method::GET, "/api/users/profile", Some(TOKEN_B), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::POST, "/api/users/sign-out", Some(TOKEN_A), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::GET, "/api/users/profile", Some(TOKEN_A), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn openapi_lists_module_paths() {
        let app = app().await;
        let (status, doc) = send(&app, Method::GET, "/docs/openapi.json", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/api/books"]["get"].is_object());
        assert!(doc["paths"]["/api/books/{id}/like"]["post"].is_object());
        assert!(doc["paths"]["/api/users/profile"]["put"].is_object());
        assert!(doc["components"]["schemas"]["BookCard"].is_object());
    }
}
