//! Author entity.

use crate::model::entity::Entity;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Store-assigned surrogate key of an author.
pub type AuthorId = i64;

/// Person credited with one or more books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// `None` until the first successful create.
    pub id: Option<AuthorId>,
    pub first_name: String,
    pub last_name: String,
}

impl Author {
    /// Creates a transient author.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

impl Entity for Author {
    const NAME: &'static str = "Author";
    const TABLE: &'static str = "authors";
    const COLUMNS: &'static [&'static str] = &["first_name", "last_name"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.first_name.clone()),
            Value::Text(self.last_name.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
        })
    }
}
