//! Programmatic predicate builder.
//!
//! Conditions are composed as `Predicate` trees over entity attribute names
//! and rendered to SQL with named parameters, so criteria queries run through
//! the same executor as catalog queries.

use crate::error::{DaoError, DaoResult};
use crate::model::entity::{select_clause, Entity};
use std::marker::PhantomData;

/// Placeholder allocated by a [`CriteriaQuery`] and bound at execution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterExpression {
    name: String,
}

impl ParameterExpression {
    /// Parameter name to pass to `TypedQuery::set_parameter`.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Composable query condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Equal {
        attribute: String,
        parameter: ParameterExpression,
    },
    Like {
        attribute: String,
        parameter: ParameterExpression,
    },
    /// Empty conjunction matches every row.
    And(Vec<Predicate>),
    /// Empty disjunction matches no row.
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn equal(attribute: impl Into<String>, parameter: &ParameterExpression) -> Self {
        Self::Equal {
            attribute: attribute.into(),
            parameter: parameter.clone(),
        }
    }

    pub fn like(attribute: impl Into<String>, parameter: &ParameterExpression) -> Self {
        Self::Like {
            attribute: attribute.into(),
            parameter: parameter.clone(),
        }
    }

    pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self::And(predicates.into_iter().collect())
    }

    pub fn or(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Or(predicates.into_iter().collect())
    }

    fn render<E: Entity>(&self, out: &mut String) -> DaoResult<()> {
        match self {
            Self::Equal {
                attribute,
                parameter,
            } => {
                ensure_attribute::<E>(attribute)?;
                out.push_str(&format!("{attribute} = :{}", parameter.name));
            }
            Self::Like {
                attribute,
                parameter,
            } => {
                ensure_attribute::<E>(attribute)?;
                out.push_str(&format!("{attribute} LIKE :{}", parameter.name));
            }
            Self::And(parts) => render_group::<E>(parts, " AND ", "1 = 1", out)?,
            Self::Or(parts) => render_group::<E>(parts, " OR ", "1 = 0", out)?,
        }
        Ok(())
    }
}

fn render_group<E: Entity>(
    parts: &[Predicate],
    separator: &str,
    empty: &str,
    out: &mut String,
) -> DaoResult<()> {
    if parts.is_empty() {
        out.push_str(empty);
        return Ok(());
    }

    out.push('(');
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            out.push_str(separator);
        }
        part.render::<E>(out)?;
    }
    out.push(')');
    Ok(())
}

// Attributes are interpolated into SQL text; only mapped names may pass.
fn ensure_attribute<E: Entity>(attribute: &str) -> DaoResult<()> {
    if E::has_attribute(attribute) {
        Ok(())
    } else {
        Err(DaoError::InvalidQuery(format!(
            "{} has no attribute `{attribute}`",
            E::NAME
        )))
    }
}

/// Select-from-root query over `E` with an optional restriction.
#[derive(Debug, Clone)]
pub struct CriteriaQuery<E: Entity> {
    restriction: Option<Predicate>,
    parameters: usize,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Default for CriteriaQuery<E> {
    fn default() -> Self {
        Self {
            restriction: None,
            parameters: 0,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> CriteriaQuery<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh named parameter.
    pub fn parameter(&mut self) -> ParameterExpression {
        self.parameters += 1;
        ParameterExpression {
            name: format!("p{}", self.parameters),
        }
    }

    /// Sets the `WHERE` restriction, replacing any earlier one.
    pub fn select_where(&mut self, predicate: Predicate) -> &mut Self {
        self.restriction = Some(predicate);
        self
    }

    pub fn restriction(&self) -> Option<&Predicate> {
        self.restriction.as_ref()
    }

    /// Renders the query text.
    ///
    /// # Errors
    /// - `InvalidQuery` when a predicate names an unmapped attribute.
    pub fn to_sql(&self) -> DaoResult<String> {
        let mut sql = select_clause::<E>();
        if let Some(predicate) = &self.restriction {
            sql.push_str(" WHERE ");
            predicate.render::<E>(&mut sql)?;
        }
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::{CriteriaQuery, Predicate};
    use crate::error::DaoError;
    use crate::model::author::Author;
    use crate::model::book::Book;

    #[test]
    fn renders_conjunction_of_equalities() {
        let mut criteria = CriteriaQuery::<Author>::new();
        let first = criteria.parameter();
        let last = criteria.parameter();
        criteria.select_where(Predicate::and([
            Predicate::equal("first_name", &first),
            Predicate::equal("last_name", &last),
        ]));

        assert_eq!(
            criteria.to_sql().unwrap(),
            "SELECT id, first_name, last_name FROM authors \
             WHERE (first_name = :p1 AND last_name = :p2)"
        );
    }

    #[test]
    fn renders_nested_groups_and_empty_groups() {
        let mut criteria = CriteriaQuery::<Book>::new();
        let title = criteria.parameter();
        let isbn = criteria.parameter();
        criteria.select_where(Predicate::or([
            Predicate::like("title", &title),
            Predicate::and([Predicate::equal("isbn", &isbn), Predicate::or([])]),
        ]));

        assert_eq!(
            criteria.to_sql().unwrap(),
            "SELECT id, title, isbn FROM books \
             WHERE (title LIKE :p1 OR (isbn = :p2 AND 1 = 0))"
        );
    }

    #[test]
    fn no_restriction_selects_everything() {
        let criteria = CriteriaQuery::<Book>::new();
        assert!(criteria.restriction().is_none());
        assert_eq!(criteria.to_sql().unwrap(), "SELECT id, title, isbn FROM books");
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let mut criteria = CriteriaQuery::<Author>::new();
        let param = criteria.parameter();
        criteria.select_where(Predicate::equal("last_name; DROP TABLE authors", &param));

        let err = criteria.to_sql().unwrap_err();
        assert!(matches!(err, DaoError::InvalidQuery(_)));
    }
}
