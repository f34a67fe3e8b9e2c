pub mod error;
pub mod likes;
pub mod models;
pub mod routes;
pub mod service;
pub mod view;

use async_trait::async_trait;
use axum::Router;
use bookmate_kernel::{InitCtx, Module};
use serde_json::json;

use crate::state::AppState;

/// Shared recommendation list: browse, submit, delete, like
pub struct BooksModule {
    state: AppState,
}

impl BooksModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            store = self.state.store.backend(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "description": "Error",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        });
        let sign_in = json!({
            "description": "Sign-in required; details carry sign_in_url",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        });
        let id_param = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Search, filter and sort the shared list",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "parameters": [
                            { "name": "search", "in": "query", "schema": { "type": "string" } },
                            { "name": "genre", "in": "query", "schema": { "$ref": "#/components/schemas/GenreFilter" } },
                            { "name": "sort", "in": "query", "schema": { "$ref": "#/components/schemas/SortKey" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "Matching books as cards",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/BookCard" }
                                        }
                                    }
                                }
                            },
                            "400": error,
                            "401": sign_in
                        }
                    },
                    "post": {
                        "summary": "Submit a recommendation",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/NewBook" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Stored book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "401": sign_in,
                            "422": error
                        }
                    }
                },
                "/random": {
                    "get": {
                        "summary": "Random pick from the whole list",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "responses": {
                            "200": {
                                "description": "A random book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/BookCard" }
                                    }
                                }
                            },
                            "401": sign_in,
                            "404": error
                        }
                    }
                },
                "/genres": {
                    "get": {
                        "summary": "Genre filter options",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "All, then every genre",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/GenreFilter" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}": {
                    "delete": {
                        "summary": "Delete one of your own books",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "parameters": [id_param],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "401": sign_in,
                            "404": error
                        }
                    }
                },
                "/{id}/like": {
                    "post": {
                        "summary": "Like or unlike a book",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "parameters": [id_param],
                        "responses": {
                            "200": {
                                "description": "State after the toggle",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/LikeOutcome" }
                                    }
                                }
                            },
                            "401": sign_in,
                            "404": error
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Genre": {
                        "type": "string",
                        "enum": ["Fiction", "Non-fiction", "Sci-Fi", "Romance", "Thriller", "Mystery"]
                    },
                    "GenreFilter": {
                        "type": "string",
                        "enum": ["All", "Fiction", "Non-fiction", "Sci-Fi", "Romance", "Thriller", "Mystery"]
                    },
                    "SortKey": {
                        "type": "string",
                        "enum": ["latest", "oldest", "most-liked"]
                    },
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "genre": { "$ref": "#/components/schemas/Genre" },
                            "rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "description": { "type": "string" },
                            "likes": { "type": "integer", "minimum": 0 },
                            "created_at": { "type": "string", "format": "date-time" },
                            "user_id": { "type": "string" }
                        },
                        "required": ["id", "title", "author", "genre", "rating", "description", "likes", "created_at", "user_id"]
                    },
                    "BookCard": {
                        "allOf": [
                            { "$ref": "#/components/schemas/Book" },
                            {
                                "type": "object",
                                "properties": {
                                    "is_new": { "type": "boolean" },
                                    "excerpt": { "type": "string" }
                                },
                                "required": ["is_new", "excerpt"]
                            }
                        ]
                    },
                    "NewBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "genre": { "$ref": "#/components/schemas/Genre" },
                            "rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "description": { "type": "string" }
                        },
                        "required": ["title", "author", "genre", "rating", "description"]
                    },
                    "LikeOutcome": {
                        "type": "object",
                        "properties": {
                            "book_id": { "type": "string" },
                            "liked": { "type": "boolean" },
                            "likes": { "type": "integer", "minimum": 0 }
                        },
                        "required": ["book_id", "liked", "likes"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(state))
}
