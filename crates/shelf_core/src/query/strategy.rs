//! Static vs. dynamic exact-match lookups.
//!
//! # Invariants
//! - For the same `ExactLookup`, both strategies return the same row or fail
//!   with the same error kind.
//! - The catalog query named by a lookup must restrict on exactly the lookup
//!   fields, each bound by its attribute name.

use crate::error::DaoResult;
use crate::model::entity::Entity;
use crate::query::criteria::{CriteriaQuery, Predicate};
use crate::session::Session;

/// Exact-match lookup: a catalog query plus the attribute values it binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactLookup {
    named_query: &'static str,
    fields: Vec<(&'static str, String)>,
}

impl ExactLookup {
    pub fn new(named_query: &'static str) -> Self {
        Self {
            named_query,
            fields: Vec::new(),
        }
    }

    /// Adds an `attribute = value` condition.
    pub fn field(mut self, attribute: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((attribute, value.into()));
        self
    }

    pub fn named_query(&self) -> &'static str {
        self.named_query
    }

    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }
}

/// How an [`ExactLookup`] is turned into a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExactMatchStrategy {
    /// Runs the catalog query named by the lookup.
    Precompiled,
    /// Builds an AND of per-field equality predicates.
    Dynamic,
}

impl ExactMatchStrategy {
    pub const ALL: [Self; 2] = [Self::Precompiled, Self::Dynamic];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Precompiled => "precompiled",
            Self::Dynamic => "dynamic",
        }
    }

    /// Executes `lookup` with singleton-result semantics.
    pub fn find_one<E: Entity>(self, session: &Session, lookup: &ExactLookup) -> DaoResult<E> {
        match self {
            Self::Precompiled => {
                let mut query = session.create_named_query::<E>(lookup.named_query())?;
                for (attribute, value) in lookup.fields() {
                    query = query.set_parameter(attribute, value.clone());
                }
                query.get_single_result()
            }
            Self::Dynamic => {
                let mut criteria = CriteriaQuery::<E>::new();
                let mut bindings = Vec::with_capacity(lookup.fields().len());
                let mut predicates = Vec::with_capacity(lookup.fields().len());
                for (attribute, value) in lookup.fields() {
                    let parameter = criteria.parameter();
                    predicates.push(Predicate::equal(*attribute, &parameter));
                    bindings.push((parameter, value.clone()));
                }
                criteria.select_where(Predicate::and(predicates));

                let mut query = session.create_criteria_query(&criteria)?;
                for (parameter, value) in bindings {
                    query = query.set_parameter(parameter.name(), value);
                }
                query.get_single_result()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExactLookup, ExactMatchStrategy};
    use crate::query::catalog::FIND_AUTHOR_BY_NAME;

    #[test]
    fn lookup_keeps_fields_in_declaration_order() {
        let lookup = ExactLookup::new(FIND_AUTHOR_BY_NAME)
            .field("first_name", "Eric")
            .field("last_name", "Evans");

        assert_eq!(lookup.named_query(), "find_by_name");
        assert_eq!(
            lookup.fields(),
            &[
                ("first_name", "Eric".to_string()),
                ("last_name", "Evans".to_string())
            ]
        );
    }

    #[test]
    fn strategy_names_are_distinct() {
        let names: Vec<_> = ExactMatchStrategy::ALL
            .iter()
            .map(|strategy| strategy.as_str())
            .collect();
        assert_eq!(names, vec!["precompiled", "dynamic"]);
    }
}
