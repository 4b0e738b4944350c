pub mod authors;
pub mod compose;
pub mod models;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use books_db::{BookStore, InMemoryBookStore};
use books_kernel::{settings::Settings, InitCtx, Module};
use serde_json::{json, Value};

use authors::{AuthorLookup, HttpAuthorClient};
use routes::BooksState;
use service::BooksService;

/// Books module: CRUD over the book store, enriched by the authors service.
pub struct BooksModule {
    state: BooksState,
    seed_on_start: bool,
}

impl BooksModule {
    pub fn new(
        store: Arc<dyn BookStore>,
        authors: Arc<dyn AuthorLookup>,
        settings: &Settings,
    ) -> Self {
        Self {
            state: BooksState {
                service: Arc::new(BooksService::new(store, authors, settings)),
                policy: settings.books.status_policy,
            },
            seed_on_start: settings.books.seed_on_start,
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    /// Routes already carry the `/books` prefix.
    fn base_path(&self) -> String {
        String::new()
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            authors_url = %ctx.settings.authors.base_url,
            status_policy = ?self.state.policy,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if self.seed_on_start {
            if let Err(err) = self.state.service.seed().await {
                tracing::warn!(module = self.name(), error = %err, "seeding on start skipped");
            }
        }
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module with the in-memory store and the HTTP authors client
pub fn create_module(settings: &Settings) -> anyhow::Result<Arc<dyn Module>> {
    let authors = HttpAuthorClient::new(&settings.authors)?;
    Ok(Arc::new(BooksModule::new(
        Arc::new(InMemoryBookStore::new()),
        Arc::new(authors),
        settings,
    )))
}

fn envelope_of(result_schema: Value) -> Value {
    json!({
        "description": "Result envelope, or an error envelope carrying a BOOKS_* code",
        "content": {
            "application/json": {
                "schema": {
                    "oneOf": [
                        {
                            "type": "object",
                            "properties": { "result": result_schema },
                            "required": ["result"]
                        },
                        { "$ref": "#/components/schemas/ErrorEnvelope" }
                    ]
                }
            }
        }
    })
}

fn outcome_response() -> Value {
    envelope_of(json!({ "$ref": "#/components/schemas/OperationOutcome" }))
}

fn book_body() -> Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookDto" }
            }
        }
    })
}

fn path_param(name: &str) -> Value {
    json!({ "name": name, "in": "path", "required": true, "schema": { "type": "string" } })
}

fn openapi_fragment() -> Value {
    let view = json!({ "$ref": "#/components/schemas/BookView" });
    let delete = json!({
        "summary": "Delete a book",
        "tags": ["Books"],
        "parameters": [path_param("id")],
        "responses": { "200": outcome_response() }
    });

    json!({
        "paths": {
            "/books": {
                "get": {
                    "summary": "List books, optionally filtered by exact title or ISBN",
                    "tags": ["Books"],
                    "parameters": [
                        { "name": "book_title", "in": "query", "required": false, "schema": { "type": "string" } },
                        { "name": "book_isbn", "in": "query", "required": false, "schema": { "type": "string" } }
                    ],
                    "responses": { "200": envelope_of(json!({ "type": "array", "items": view })) }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": book_body(),
                    "responses": { "200": outcome_response() }
                },
                "put": {
                    "summary": "Update title and description of a book",
                    "tags": ["Books"],
                    "requestBody": book_body(),
                    "responses": { "200": outcome_response() }
                }
            },
            "/books/init": {
                "get": {
                    "summary": "Seed the store with the bootstrap books",
                    "tags": ["Books"],
                    "responses": { "200": outcome_response() }
                }
            },
            "/books/health": {
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
            },
            "/books/{id}": {
                "get": {
                    "summary": "Get a book by id",
                    "tags": ["Books"],
                    "parameters": [path_param("id")],
                    "responses": { "200": envelope_of(view.clone()) }
                },
                "post": delete.clone(),
                "delete": delete
            },
            "/books/isbn/{isbn}": {
                "get": {
                    "summary": "Get a book by ISBN",
                    "tags": ["Books"],
                    "parameters": [path_param("isbn")],
                    "responses": { "200": envelope_of(view) }
                }
            }
        },
        "components": {
            "schemas": {
                "Author": {
                    "type": "object",
                    "properties": {
                        "author_id": { "type": "string" },
                        "author_name": { "type": "string" },
                        "author_surname": { "type": "string" }
                    },
                    "required": ["author_id"]
                },
                "BookDto": {
                    "type": "object",
                    "properties": {
                        "book_id": { "type": "string", "description": "Ignored on create, required on update" },
                        "book_isbn": { "type": "string" },
                        "book_title": { "type": "string" },
                        "book_description": { "type": "string" },
                        "author_id": { "type": "string" }
                    }
                },
                "BookView": {
                    "type": "object",
                    "properties": {
                        "book_id": { "type": "string" },
                        "book_isbn": { "type": "string" },
                        "book_title": { "type": "string" },
                        "book_description": { "type": "string" },
                        "author_id": { "type": "string" },
                        "author": {
                            "oneOf": [{ "$ref": "#/components/schemas/Author" }, { "type": "null" }]
                        }
                    },
                    "required": ["book_id", "book_isbn", "book_title", "book_description", "author_id", "author"]
                },
                "OperationOutcome": {
                    "type": "object",
                    "properties": { "message": { "type": "string" } },
                    "required": ["message"]
                }
            }
        }
    })
}
