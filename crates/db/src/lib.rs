//! Book storage.
//!
//! [`BookStore`] is the persistence contract used by the request handlers;
//! [`InMemoryBookStore`] is the backend wired in by default.

mod memory;
mod model;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryBookStore;
pub use model::{Book, BookProbe, NewBook};

/// Failures reported by a [`BookStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("book '{id}' not found")]
    NotFound { id: String },

    #[error("duplicate {field} '{value}'")]
    Conflict { field: &'static str, value: String },

    #[error("field '{field}' must not be empty")]
    Constraint { field: &'static str },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for book records.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a new record; the store assigns the identifier.
    async fn insert(&self, book: NewBook) -> StoreResult<Book>;

    /// Insert every record or none of them.
    async fn insert_all(&self, books: Vec<NewBook>) -> StoreResult<Vec<Book>>;

    /// Look a record up by identifier. Absence is `Ok(None)`.
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Book>>;

    /// Look a record up by ISBN. Absence is `Ok(None)`.
    async fn find_by_isbn(&self, isbn: &str) -> StoreResult<Option<Book>>;

    /// Every record matching the probe; unset or empty probe fields match anything.
    async fn find_all(&self, probe: &BookProbe) -> StoreResult<Vec<Book>>;

    /// Overwrite title and description of the record with `book.id`.
    async fn update(&self, book: &Book) -> StoreResult<Book>;

    /// Remove the record with `id`.
    async fn delete(&self, id: &str) -> StoreResult<()>;
}
