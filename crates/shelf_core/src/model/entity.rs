//! Table mapping contract shared by all persistent entities.

use rusqlite::types::Value;
use rusqlite::Row;

/// Surrogate key column shared by every mapped table.
pub const ID_COLUMN: &str = "id";

/// Mapping metadata and row codec for one persistent entity type.
///
/// Implementations are plain value holders; the session layer is generic over
/// this trait and never inspects concrete entity types.
pub trait Entity: Clone + 'static {
    /// Logical entity name used in errors and log events.
    const NAME: &'static str;
    /// Backing table.
    const TABLE: &'static str;
    /// Non-key columns, in the order returned by [`Entity::column_values`].
    const COLUMNS: &'static [&'static str];

    /// Store-assigned identity, `None` while transient.
    fn id(&self) -> Option<i64>;

    /// Records the identity assigned by the store.
    fn assign_id(&mut self, id: i64);

    /// Values for [`Entity::COLUMNS`], in the same order.
    fn column_values(&self) -> Vec<Value>;

    /// Decodes one row selected with [`select_clause`].
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Returns whether `attribute` names the key or a mapped column.
    fn has_attribute(attribute: &str) -> bool {
        attribute == ID_COLUMN || Self::COLUMNS.contains(&attribute)
    }
}

/// `SELECT id, <columns> FROM <table>` for an entity.
pub fn select_clause<E: Entity>() -> String {
    format!(
        "SELECT {ID_COLUMN}, {} FROM {}",
        E::COLUMNS.join(", "),
        E::TABLE
    )
}
