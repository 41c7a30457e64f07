//! Filter Expression Engine.
//!
//! A filter is the logical AND of attribute comparisons. The text form is
//! parsed into a [`FilterExpression`] and then compiled against a schema
//! into a [`Filter`], which is what derived data sources evaluate.

mod escape;
mod operator;
mod parser;
mod predicate;

pub use escape::{escape, is_reserved, unescape, RESERVED};
pub use operator::Operator;
pub use parser::{FilterCriteria, FilterExpression};
pub use predicate::Predicate;

use core::fmt;
use vista_core::{Result, Schema};

/// A filter compiled against a schema.
pub struct Filter<T> {
    expression: FilterExpression,
    predicates: Vec<Predicate<T>>,
}

impl<T> Filter<T> {
    /// Compiles an expression. Every attribute must exist on the schema and
    /// every operator must be valid for the attribute's declared type.
    pub fn compile(expression: &FilterExpression, schema: &Schema<T>) -> Result<Self> {
        let predicates = expression
            .criteria()
            .iter()
            .map(|c| Predicate::compile(c.clone(), schema.require(&c.attribute)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            expression: expression.clone(),
            predicates,
        })
    }

    /// Parses and compiles the text form.
    pub fn parse(text: &str, schema: &Schema<T>) -> Result<Self> {
        Self::compile(&FilterExpression::parse(text)?, schema)
    }

    /// Returns true if the item passes every criterion.
    #[inline]
    pub fn include(&self, item: &T) -> bool {
        self.predicates.iter().all(|p| p.eval(item))
    }

    /// Returns true if this filter has no criteria.
    #[inline]
    pub fn is_match_all(&self) -> bool {
        self.predicates.is_empty()
    }

    #[inline]
    pub fn expression(&self) -> &FilterExpression {
        &self.expression
    }
}

impl<T> fmt::Display for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("expression", &self.expression.to_string())
            .finish()
    }
}
