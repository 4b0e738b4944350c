use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Stored book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub isbn: String,
    pub title: String,
    pub description: String,
    /// Identifier of an author owned by the authors service.
    pub author_id: String,
}

/// Book awaiting insertion; it has no identifier yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub isbn: String,
    pub title: String,
    pub description: String,
    pub author_id: String,
}

impl NewBook {
    pub fn new(isbn: &str, title: &str, description: &str, author_id: &str) -> Self {
        Self {
            isbn: isbn.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            author_id: author_id.to_string(),
        }
    }

    /// Mirrors the non-empty assertions on the book table.
    pub(crate) fn check_constraints(&self) -> Result<(), StoreError> {
        for (field, value) in [
            ("isbn", &self.isbn),
            ("title", &self.title),
            ("author_id", &self.author_id),
        ] {
            if value.trim().is_empty() {
                return Err(StoreError::Constraint { field });
            }
        }
        Ok(())
    }

    pub(crate) fn with_id(self, id: String) -> Book {
        Book {
            id,
            isbn: self.isbn,
            title: self.title,
            description: self.description,
            author_id: self.author_id,
        }
    }
}

/// Partial-match query: each non-empty field must equal the stored field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookProbe {
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub author_id: Option<String>,
}

impl BookProbe {
    pub fn matches(&self, book: &Book) -> bool {
        fn field_matches(probe: &Option<String>, value: &str) -> bool {
            match probe.as_deref() {
                None | Some("") => true,
                Some(expected) => expected == value,
            }
        }

        field_matches(&self.isbn, &book.isbn)
            && field_matches(&self.title, &book.title)
            && field_matches(&self.description, &book.description)
            && field_matches(&self.author_id, &book.author_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> Book {
        NewBook::new("ISO-331", "This is a test book", "desc", "1").with_id("b-1".to_string())
    }

    #[test]
    fn test_empty_probe_matches_everything() {
        assert!(BookProbe::default().matches(&book()));
    }

    #[test]
    fn test_empty_strings_are_wildcards() {
        let probe = BookProbe {
            title: Some(String::new()),
            isbn: Some(String::new()),
            ..BookProbe::default()
        };
        assert!(probe.matches(&book()));
    }

    #[test]
    fn test_probe_requires_exact_equality() {
        let exact = BookProbe {
            title: Some("This is a test book".to_string()),
            ..BookProbe::default()
        };
        let partial = BookProbe {
            title: Some("This is a test".to_string()),
            ..BookProbe::default()
        };
        assert!(exact.matches(&book()));
        assert!(!partial.matches(&book()));
    }

    #[test]
    fn test_blank_required_fields_violate_constraints() {
        let err = NewBook::new("ISO-1", " ", "", "1")
            .check_constraints()
            .unwrap_err();
        assert_eq!(err, StoreError::Constraint { field: "title" });
        assert!(NewBook::new("ISO-1", "t", "", "1").check_constraints().is_ok());
    }
}
