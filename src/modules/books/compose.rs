//! Conversions between wire payloads and stored records.

use books_db::{Book, BookProbe, NewBook};
use thiserror::Error;

use super::models::{Author, BookDto, BookView, ListParams};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ComposeError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ComposeError::MissingField(field))
}

/// Join a stored book with its (possibly unresolved) author.
pub fn to_view(book: Book, author: Option<Author>) -> BookView {
    BookView {
        book_id: book.id,
        book_isbn: book.isbn,
        book_title: book.title,
        book_description: book.description,
        author_id: book.author_id,
        author,
    }
}

/// Payload of a create request; any caller-supplied `book_id` is ignored.
pub fn to_new_book(dto: BookDto) -> Result<NewBook, ComposeError> {
    Ok(NewBook {
        isbn: required(dto.book_isbn, "book_isbn")?,
        title: required(dto.book_title, "book_title")?,
        description: dto.book_description.unwrap_or_default(),
        author_id: required(dto.author_id, "author_id")?,
    })
}

/// Payload of an update request; `book_id` is mandatory.
pub fn to_entity(dto: BookDto) -> Result<Book, ComposeError> {
    Ok(Book {
        id: required(dto.book_id, "book_id")?,
        isbn: dto.book_isbn.unwrap_or_default(),
        title: dto.book_title.unwrap_or_default(),
        description: dto.book_description.unwrap_or_default(),
        author_id: dto.author_id.unwrap_or_default(),
    })
}

/// Probe for the list endpoint; blank parameters act as wildcards.
pub fn to_probe(params: ListParams) -> BookProbe {
    BookProbe {
        title: params.book_title,
        isbn: params.book_isbn,
        ..BookProbe::default()
    }
}

impl From<BookView> for Book {
    fn from(view: BookView) -> Self {
        Self {
            id: view.book_id,
            isbn: view.book_isbn,
            title: view.book_title,
            description: view.book_description,
            author_id: view.author_id,
        }
    }
}
