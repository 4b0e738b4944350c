//! HTTP surface of the books module.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::Response,
    routing::get,
    Json, Router,
};
use books_http::{reply, AppError};
use books_kernel::settings::StatusPolicy;

use super::models::{BookDto, ListParams};
use super::service::{BooksService, GETLIST_ERROR, INSERT_ERROR, UPDATE_ERROR};

#[derive(Clone)]
pub struct BooksState {
    pub service: Arc<BooksService>,
    pub policy: StatusPolicy,
}

pub fn router(state: BooksState) -> Router {
    Router::new()
        .route(
            "/books",
            get(list_books).post(create_book).put(update_book),
        )
        .route("/books/init", get(init_books))
        .route("/books/health", get(health_check))
        .route(
            "/books/{id}",
            get(get_book).post(delete_book).delete(delete_book),
        )
        .route("/books/isbn/{isbn}", get(get_book_by_isbn))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn init_books(State(state): State<BooksState>) -> Response {
    reply(state.policy, state.service.seed().await)
}

async fn list_books(
    State(state): State<BooksState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Response {
    let outcome = match params {
        Ok(Query(params)) => state.service.list(params).await,
        Err(rejection) => Err(AppError::bad_request(
            GETLIST_ERROR,
            format!("Unable to retrieve books: {}", rejection.body_text()),
        )),
    };
    reply(state.policy, outcome)
}

async fn get_book(State(state): State<BooksState>, Path(id): Path<String>) -> Response {
    reply(state.policy, state.service.get_by_id(&id).await)
}

async fn get_book_by_isbn(State(state): State<BooksState>, Path(isbn): Path<String>) -> Response {
    reply(state.policy, state.service.get_by_isbn(&isbn).await)
}

async fn create_book(
    State(state): State<BooksState>,
    payload: Result<Json<BookDto>, JsonRejection>,
) -> Response {
    let outcome = match payload {
        Ok(Json(dto)) => state.service.create(dto).await,
        Err(rejection) => Err(malformed(INSERT_ERROR, "Unable to persist book", rejection)),
    };
    reply(state.policy, outcome)
}

async fn update_book(
    State(state): State<BooksState>,
    payload: Result<Json<BookDto>, JsonRejection>,
) -> Response {
    let outcome = match payload {
        Ok(Json(dto)) => state.service.update(dto).await,
        Err(rejection) => Err(malformed(UPDATE_ERROR, "Unable to update book", rejection)),
    };
    reply(state.policy, outcome)
}

async fn delete_book(State(state): State<BooksState>, Path(id): Path<String>) -> Response {
    reply(state.policy, state.service.delete(&id).await)
}

fn malformed(code: &str, context: &str, rejection: JsonRejection) -> AppError {
    AppError::bad_request(code, format!("{}: {}", context, rejection.body_text()))
}
