//! Book entity.

use crate::model::entity::Entity;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Store-assigned surrogate key of a book.
pub type BookId = i64;

/// Catalog entry identified by title and ISBN.
///
/// ISBN uniqueness is enforced by the store schema, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// `None` until the first successful create.
    pub id: Option<BookId>,
    pub title: String,
    pub isbn: String,
}

impl Book {
    /// Creates a transient book.
    pub fn new(title: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            isbn: isbn.into(),
        }
    }
}

impl Entity for Book {
    const NAME: &'static str = "Book";
    const TABLE: &'static str = "books";
    const COLUMNS: &'static [&'static str] = &["title", "isbn"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.title.clone()),
            Value::Text(self.isbn.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            title: row.get("title")?,
            isbn: row.get("isbn")?,
        })
    }
}
