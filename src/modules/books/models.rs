use serde::{Deserialize, Serialize};

/// Author record owned by the authors service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_surname: String,
}

/// Inbound book payload for create and update.
///
/// Every field is optional on the wire; the composer decides which ones an
/// operation requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDto {
    pub book_id: Option<String>,
    pub book_isbn: Option<String>,
    pub book_title: Option<String>,
    pub book_description: Option<String>,
    pub author_id: Option<String>,
}

/// Book joined with its author, as returned by read operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookView {
    pub book_id: String,
    pub book_isbn: String,
    pub book_title: String,
    pub book_description: String,
    pub author_id: String,
    /// `None` when the authors service could not resolve `author_id`.
    pub author: Option<Author>,
}

/// Query string of the list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListParams {
    pub book_title: Option<String>,
    pub book_isbn: Option<String>,
}

/// Records written by the init endpoint: (isbn, title, description, author id).
pub const SEED_BOOKS: [(&str, &str, &str, &str); 3] = [
    (
        "ISO-331",
        "This is a test book",
        "The test book was written for test purposes",
        "1",
    ),
    (
        "ISO-332",
        "This is the second test book",
        "The second test book was written for test purposes",
        "1",
    ),
    (
        "ISO-333",
        "This is the third test book",
        "The third test book was written for test purposes",
        "2",
    ),
];
