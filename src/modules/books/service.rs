//! Book operations: store access, author enrichment and error coding.

use std::sync::Arc;

use books_db::{Book, BookStore, NewBook, StoreError};
use books_http::{AppError, OperationOutcome};
use books_kernel::settings::Settings;
use futures_util::{stream, StreamExt};

use super::authors::AuthorLookup;
use super::compose::{self, ComposeError};
use super::models::{Author, BookDto, BookView, ListParams, SEED_BOOKS};

pub const GETLIST_ERROR: &str = "BOOKS_GETLIST_001";
pub const GETSINGLE_ERROR: &str = "BOOKS_GETSINGLE_001";
pub const GETSINGLE_ISBN_ERROR: &str = "BOOKS_GETSINGLE_002";
pub const INSERT_ERROR: &str = "BOOKS_INSERT_001";
pub const UPDATE_ERROR: &str = "BOOKS_UPDATE_001";
pub const DELETE_ERROR: &str = "BOOKS_DELETE_001";
pub const INIT_ERROR: &str = "BOOKS_INIT_001";

pub struct BooksService {
    store: Arc<dyn BookStore>,
    authors: Arc<dyn AuthorLookup>,
    lookup_concurrency: usize,
    empty_list_is_error: bool,
}

impl BooksService {
    pub fn new(
        store: Arc<dyn BookStore>,
        authors: Arc<dyn AuthorLookup>,
        settings: &Settings,
    ) -> Self {
        Self {
            store,
            authors,
            lookup_concurrency: settings.authors.lookup_concurrency(),
            empty_list_is_error: settings.books.empty_list_is_error,
        }
    }

    /// Insert the fixed bootstrap records; nothing is written if any of them clashes.
    pub async fn seed(&self) -> Result<OperationOutcome, AppError> {
        let batch = SEED_BOOKS
            .iter()
            .map(|(isbn, title, description, author_id)| {
                NewBook::new(isbn, title, description, author_id)
            })
            .collect();
        let seeded = self
            .store
            .insert_all(batch)
            .await
            .map_err(|e| persistence_error(INIT_ERROR, "Unable to initialise books", e))?;
        tracing::info!(count = seeded.len(), "books seeded");
        Ok(OperationOutcome::new("Books successfully initialised"))
    }

    pub async fn list(&self, params: ListParams) -> Result<Vec<BookView>, AppError> {
        let probe = compose::to_probe(params);
        let books = self.store.find_all(&probe).await.map_err(|e| {
            tracing::error!(error = %e, "book listing failed");
            AppError::persistence(GETLIST_ERROR, "Unable to retrieve books")
        })?;

        if books.is_empty() && self.empty_list_is_error {
            return Err(AppError::not_found(GETLIST_ERROR, "Unable to retrieve books"));
        }

        Ok(self.compose_all(books).await)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<BookView, AppError> {
        let book = self
            .store
            .find_by_id(id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, book_id = id, "book lookup failed");
                AppError::persistence(GETSINGLE_ERROR, "Unable to retrieve book")
            })?
            .ok_or_else(|| AppError::not_found(GETSINGLE_ERROR, "Unable to retrieve book"))?;

        let author = self.resolve_author(&book).await;
        Ok(compose::to_view(book, author))
    }

    pub async fn get_by_isbn(&self, isbn: &str) -> Result<BookView, AppError> {
        let book = self
            .store
            .find_by_isbn(isbn)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, isbn, "book lookup by isbn failed");
                AppError::persistence(GETSINGLE_ISBN_ERROR, "Unable to retrieve book by ISBN")
            })?
            .ok_or_else(|| {
                AppError::not_found(GETSINGLE_ISBN_ERROR, "Unable to retrieve book by ISBN")
            })?;

        let author = self.resolve_author(&book).await;
        Ok(compose::to_view(book, author))
    }

    pub async fn create(&self, dto: BookDto) -> Result<OperationOutcome, AppError> {
        let new_book = compose::to_new_book(dto)
            .map_err(|e| invalid_input(INSERT_ERROR, "Unable to persist book", e))?;

        let book = self
            .store
            .insert(new_book)
            .await
            .map_err(|e| persistence_error(INSERT_ERROR, "Unable to persist book", e))?;

        tracing::info!(book_id = %book.id, isbn = %book.isbn, "book persisted");
        Ok(OperationOutcome::new("Book successfully persisted"))
    }

    pub async fn update(&self, dto: BookDto) -> Result<OperationOutcome, AppError> {
        let book = compose::to_entity(dto)
            .map_err(|e| invalid_input(UPDATE_ERROR, "Unable to update book", e))?;

        let updated = self
            .store
            .update(&book)
            .await
            .map_err(|e| persistence_error(UPDATE_ERROR, "Unable to update book", e))?;

        tracing::info!(book_id = %updated.id, "book updated");
        Ok(OperationOutcome::new("Book successfully updated"))
    }

    pub async fn delete(&self, id: &str) -> Result<OperationOutcome, AppError> {
        self.store
            .delete(id)
            .await
            .map_err(|e| persistence_error(DELETE_ERROR, "Unable to delete book", e))?;

        tracing::info!(book_id = id, "book deleted");
        Ok(OperationOutcome::new("Book successfully deleted"))
    }

    /// Failed lookups degrade to `None`.
    async fn resolve_author(&self, book: &Book) -> Option<Author> {
        match self.authors.fetch_author(&book.author_id).await {
            Ok(author) => Some(author),
            Err(err) => {
                tracing::warn!(
                    author_id = %book.author_id,
                    book_id = %book.id,
                    error = %err,
                    "author lookup failed"
                );
                None
            }
        }
    }

    /// Bounded fan-out; output order matches `books`.
    async fn compose_all(&self, books: Vec<Book>) -> Vec<BookView> {
        stream::iter(books)
            .map(|book| async move {
                let author = self.resolve_author(&book).await;
                compose::to_view(book, author)
            })
            .buffered(self.lookup_concurrency)
            .collect()
            .await
    }
}

fn persistence_error(code: &str, context: &str, err: StoreError) -> AppError {
    let message = format!("{}: {}", context, err);
    match err {
        StoreError::NotFound { .. } => AppError::not_found(code, message),
        StoreError::Conflict { .. } | StoreError::Constraint { .. } => {
            AppError::conflict(code, message)
        }
        StoreError::Unavailable(_) => AppError::persistence(code, message),
    }
}

fn invalid_input(code: &str, context: &str, err: ComposeError) -> AppError {
    AppError::bad_request(code, format!("{}: {}", context, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::authors::LookupError;
    use async_trait::async_trait;
    use books_db::InMemoryBookStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct KnownAuthors;

    #[async_trait]
    impl AuthorLookup for KnownAuthors {
        async fn fetch_author(&self, author_id: &str) -> Result<Author, LookupError> {
            match author_id {
                "1" | "2" => Ok(Author {
                    author_id: author_id.to_string(),
                    author_name: format!("Name {}", author_id),
                    author_surname: format!("Surname {}", author_id),
                }),
                other => Err(LookupError::NotFound(other.to_string())),
            }
        }
    }

    /// Tracks the highest number of lookups running at the same time.
    #[derive(Default)]
    struct CountingAuthors {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl AuthorLookup for CountingAuthors {
        async fn fetch_author(&self, author_id: &str) -> Result<Author, LookupError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            // later books answer faster, so completion order differs from store order
            let delay = 5 * (10 - author_id.parse::<u64>().unwrap_or(0));
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Author {
                author_id: author_id.to_string(),
                author_name: String::new(),
                author_surname: String::new(),
            })
        }
    }

    async fn peak_lookups(max_concurrent_lookups: usize) -> (usize, Vec<String>) {
        let mut settings = Settings::default();
        settings.authors.max_concurrent_lookups = max_concurrent_lookups;
        let authors = Arc::new(CountingAuthors::default());
        let service = BooksService::new(
            Arc::new(InMemoryBookStore::new()),
            authors.clone(),
            &settings,
        );
        for n in 0..6 {
            service
                .create(dto(&format!("ISO-{}", n), "Title", &n.to_string()))
                .await
                .unwrap();
        }

        let views = service.list(ListParams::default()).await.unwrap();
        let isbns = views.into_iter().map(|v| v.book_isbn).collect();
        (authors.peak.load(Ordering::SeqCst), isbns)
    }

    #[tokio::test]
    async fn test_should_bound_author_lookups() {
        let expected: Vec<String> = (0..6).map(|n| format!("ISO-{}", n)).collect();

        let (peak, isbns) = peak_lookups(3).await;
        assert!(peak > 1 && peak <= 3, "peak was {}", peak);
        assert_eq!(isbns, expected);

        let (peak, isbns) = peak_lookups(1).await;
        assert_eq!(peak, 1);
        assert_eq!(isbns, expected);

        let (peak, _) = peak_lookups(0).await;
        assert_eq!(peak, 1);
    }

    fn service(settings: &Settings) -> (BooksService, InMemoryBookStore) {
        let store = InMemoryBookStore::new();
        let service = BooksService::new(Arc::new(store.clone()), Arc::new(KnownAuthors), settings);
        (service, store)
    }

    fn dto(isbn: &str, title: &str, author_id: &str) -> BookDto {
        BookDto {
            book_isbn: Some(isbn.to_string()),
            book_title: Some(title.to_string()),
            book_description: Some("desc".to_string()),
            author_id: Some(author_id.to_string()),
            ..BookDto::default()
        }
    }

    #[tokio::test]
    async fn test_should_seed_once() {
        let (service, store) = service(&Settings::default());
        service.seed().await.unwrap();
        assert_eq!(store.len().await, 3);

        let err = service.seed().await.unwrap_err();
        assert_eq!(err.code(), INIT_ERROR);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_should_not_seed_partially() {
        let (service, store) = service(&Settings::default());
        service.create(dto("ISO-332", "Taken", "1")).await.unwrap();

        let err = service.seed().await.unwrap_err();
        assert_eq!(err.code(), INIT_ERROR);
        assert_eq!(store.len().await, 1);
        assert!(store.find_by_isbn("ISO-331").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_should_list_seeded_books_with_authors() {
        let (service, _) = service(&Settings::default());
        service.seed().await.unwrap();

        let views = service.list(ListParams::default()).await.unwrap();
        let author_ids: Vec<_> = views
            .iter()
            .map(|v| v.author.as_ref().unwrap().author_id.as_str())
            .collect();
        assert_eq!(author_ids, ["1", "1", "2"]);
    }

    #[tokio::test]
    async fn test_should_report_empty_list_by_setting() {
        let (service, _) = service(&Settings::default());
        let err = service.list(ListParams::default()).await.unwrap_err();
        assert_eq!(err.code(), GETLIST_ERROR);

        let mut settings = Settings::default();
        settings.books.empty_list_is_error = false;
        let (service, _) = self::service(&settings);
        assert!(service.list(ListParams::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_should_keep_author_id_when_author_is_unknown() {
        let (service, store) = service(&Settings::default());
        service.create(dto("ISO-9", "Orphan", "99")).await.unwrap();
        let id = store.find_by_isbn("ISO-9").await.unwrap().unwrap().id;

        let view = service.get_by_id(&id).await.unwrap();
        assert_eq!(view.author_id, "99");
        assert!(view.author.is_none());
    }

    #[tokio::test]
    async fn test_should_code_create_failures() {
        let (service, _) = service(&Settings::default());

        let err = service.create(BookDto::default()).await.unwrap_err();
        assert_eq!(err.code(), INSERT_ERROR);
        assert!(matches!(err, AppError::BadRequest { .. }));

        service.create(dto("ISO-1", "One", "1")).await.unwrap();
        let err = service.create(dto("ISO-1", "Again", "1")).await.unwrap_err();
        assert!(matches!(err, AppError::Persistence { conflict: true, .. }));
        assert!(err.to_string().contains("ISO-1"));
    }

    #[tokio::test]
    async fn test_should_code_missing_records() {
        let (service, _) = service(&Settings::default());

        assert_eq!(service.get_by_id("nope").await.unwrap_err().code(), GETSINGLE_ERROR);
        assert_eq!(
            service.get_by_isbn("NOPE").await.unwrap_err().code(),
            GETSINGLE_ISBN_ERROR
        );
        assert_eq!(service.delete("nope").await.unwrap_err().code(), DELETE_ERROR);

        let err = service
            .update(BookDto {
                book_id: Some("nope".to_string()),
                book_title: Some("t".to_string()),
                ..BookDto::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), UPDATE_ERROR);
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
