use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{Book, BookProbe, BookStore, NewBook, StoreError, StoreResult};

/// Process-local store keeping records in insertion order.
///
/// Clones share the same underlying collection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookStore {
    books: Arc<RwLock<Vec<Book>>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.books.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.books.read().await.is_empty()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn insert(&self, book: NewBook) -> StoreResult<Book> {
        book.check_constraints()?;

        let mut books = self.books.write().await;
        if books.iter().any(|existing| existing.isbn == book.isbn) {
            return Err(StoreError::Conflict {
                field: "isbn",
                value: book.isbn,
            });
        }

        let stored = book.with_id(Uuid::now_v7().to_string());
        books.push(stored.clone());
        tracing::debug!(book_id = %stored.id, isbn = %stored.isbn, "book inserted");
        Ok(stored)
    }

    async fn insert_all(&self, batch: Vec<NewBook>) -> StoreResult<Vec<Book>> {
        let mut books = self.books.write().await;
        for (index, book) in batch.iter().enumerate() {
            book.check_constraints()?;
            let duplicate = books.iter().any(|existing| existing.isbn == book.isbn)
                || batch[..index].iter().any(|earlier| earlier.isbn == book.isbn);
            if duplicate {
                return Err(StoreError::Conflict {
                    field: "isbn",
                    value: book.isbn.clone(),
                });
            }
        }

        let stored: Vec<Book> = batch
            .into_iter()
            .map(|book| book.with_id(Uuid::now_v7().to_string()))
            .collect();
        books.extend(stored.iter().cloned());
        tracing::debug!(count = stored.len(), "books inserted");
        Ok(stored)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books.iter().find(|book| book.id == id).cloned())
    }

    async fn find_by_isbn(&self, isbn: &str) -> StoreResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books.iter().find(|book| book.isbn == isbn).cloned())
    }

    async fn find_all(&self, probe: &BookProbe) -> StoreResult<Vec<Book>> {
        let books = self.books.read().await;
        Ok(books
            .iter()
            .filter(|book| probe.matches(book))
            .cloned()
            .collect())
    }

    async fn update(&self, book: &Book) -> StoreResult<Book> {
        if book.title.trim().is_empty() {
            return Err(StoreError::Constraint { field: "title" });
        }

        let mut books = self.books.write().await;
        let stored = books
            .iter_mut()
            .find(|existing| existing.id == book.id)
            .ok_or_else(|| StoreError::not_found(&book.id))?;

        stored.title = book.title.clone();
        stored.description = book.description.clone();
        tracing::debug!(book_id = %stored.id, "book updated");
        Ok(stored.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut books = self.books.write().await;
        let position = books
            .iter()
            .position(|book| book.id == id)
            .ok_or_else(|| StoreError::not_found(id))?;
        books.remove(position);
        tracing::debug!(book_id = %id, "book deleted");
        Ok(())
    }
}
