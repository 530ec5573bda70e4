//! Per-session cache of managed entities keyed by entity name and identity.

use crate::model::entity::Entity;
use std::any::Any;
use std::collections::HashMap;

#[derive(Default)]
pub(crate) struct IdentityMap {
    entries: HashMap<(&'static str, i64), Box<dyn Any>>,
}

impl IdentityMap {
    pub(crate) fn get<E: Entity>(&self, id: i64) -> Option<E> {
        self.entries
            .get(&(E::NAME, id))
            .and_then(|entry| entry.downcast_ref::<E>())
            .cloned()
    }

    pub(crate) fn contains<E: Entity>(&self, id: i64) -> bool {
        self.entries.contains_key(&(E::NAME, id))
    }

    /// Transient entities are ignored.
    pub(crate) fn put<E: Entity>(&mut self, entity: &E) {
        if let Some(id) = entity.id() {
            self.entries.insert((E::NAME, id), Box::new(entity.clone()));
        }
    }

    pub(crate) fn evict<E: Entity>(&mut self, id: i64) {
        self.entries.remove(&(E::NAME, id));
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::IdentityMap;
    use crate::model::author::Author;
    use crate::model::book::Book;

    #[test]
    fn entries_are_keyed_by_entity_and_identity() {
        let mut map = IdentityMap::default();
        let mut author = Author::new("Craig", "Walls");
        author.id = Some(1);
        let mut book = Book::new("Spring in Action", "978-1617294945");
        book.id = Some(1);

        map.put(&author);
        map.put(&book);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get::<Author>(1), Some(author));
        assert_eq!(map.get::<Book>(1), Some(book));

        map.evict::<Author>(1);
        assert!(!map.contains::<Author>(1));
        assert!(map.contains::<Book>(1));
    }

    #[test]
    fn transient_entities_are_not_cached() {
        let mut map = IdentityMap::default();
        map.put(&Author::new("Eric", "Evans"));
        assert_eq!(map.len(), 0);
    }
}
