pub mod models;
pub mod routes;
pub mod service;

use async_trait::async_trait;
use axum::Router;
use bookmate_kernel::{InitCtx, Module};
use serde_json::json;

use crate::state::AppState;

/// Profile, own submissions and sign-out for the signed-in user
pub struct UsersModule {
    state: AppState,
}

impl UsersModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            sessions = self.state.sessions.provider.name(),
            "users module initialized"
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
        let profile = json!({
            "description": "User profile",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/Profile" }
                }
            }
        });

        Some(json!({
            "paths": {
                "/profile": {
                    "get": {
                        "summary": "Get your profile",
                        "tags": ["Users"],
                        "security": [{ "bearer": [] }],
                        "responses": {
                            "200": profile,
                            "401": error,
                            "404": error
                        }
                    },
                    "put": {
                        "summary": "Update your display name",
                        "tags": ["Users"],
                        "security": [{ "bearer": [] }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ProfileUpdate" }
                                }
                            }
                        },
                        "responses": {
                            "200": profile,
                            "401": error,
                            "404": error,
                            "422": error
                        }
                    }
                },
                "/books": {
                    "get": {
                        "summary": "Books you have recommended",
                        "tags": ["Users"],
                        "security": [{ "bearer": [] }],
                        "responses": {
                            "200": {
                                "description": "Your books as cards, newest first",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/BookCard" }
                                        }
                                    }
                                }
                            },
                            "401": error
                        }
                    }
                },
                "/sign-out": {
                    "post": {
                        "summary": "End the current session",
                        "tags": ["Users"],
                        "security": [{ "bearer": [] }],
                        "responses": {
                            "204": { "description": "Signed out" },
                            "401": error,
                            "502": error
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Users health check",
                        "tags": ["Users"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": {
                                    "text/plain": {
                                        "schema": {
                                            "type": "string"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Profile": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "string",
                                "description": "Same as the session's user id"
                            },
                            "email": {
                                "type": "string",
                                "format": "email"
                            },
                            "full_name": {
                                "type": "string",
                                "nullable": true
                            },
                            "avatar_url": {
                                "type": "string",
                                "format": "uri",
                                "nullable": true
                            }
                        },
                        "required": ["id", "email"]
                    },
                    "ProfileUpdate": {
                        "type": "object",
                        "properties": {
                            "full_name": {
                                "type": "string",
                                "nullable": true,
                                "description": "Blank clears the name"
                            }
                        }
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

/// Create a new instance of the users module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(UsersModule::new(state))
}
