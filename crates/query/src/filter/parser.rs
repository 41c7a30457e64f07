//! Parser for the filter expression text form.
//!
//! Grammar: `<attribute><operator><value>[,<attribute><operator><value>...]`.
//! Parts are joined by logical AND. Values are escape-encoded (see
//! [`escape`](super::escape)) and decoded here.

use super::escape::{escape, is_reserved, unescape};
use super::operator::{Operator, OPERATOR_CHARS};
use core::fmt;
use core::str::FromStr;
use vista_core::{Error, Result};

/// One `attribute <op> value` comparison, before type resolution.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FilterCriteria {
    pub attribute: String,
    pub operator: Operator,
    /// Decoded comparison value. Empty for unary operators.
    pub value: String,
}

impl FilterCriteria {
    /// Creates a criterion, rewriting an empty `=`/`!=` value to a null test.
    pub fn new(attribute: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        let value = value.into();
        let operator = match operator {
            Operator::Equals if value.is_empty() => Operator::IsNull,
            Operator::NotEquals if value.is_empty() => Operator::IsNotNull,
            op => op,
        };
        let value = if operator.is_unary() { String::new() } else { value };
        Self {
            attribute: attribute.into(),
            operator,
            value,
        }
    }

    /// Splits a `Contains` value into its alternatives.
    pub fn alternatives(&self) -> impl Iterator<Item = &str> {
        self.value.split(',')
    }
}

impl fmt::Display for FilterCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator.is_unary() {
            write!(f, "{}{}", self.attribute, self.operator)
        } else {
            let value = escape(&self.value);
            // A literal `null` must not read back as a null test.
            let value = if value == "null" { "#110;ull".to_string() } else { value };
            write!(f, "{}{}{}", self.attribute, self.operator, value)
        }
    }
}

/// A parsed, untyped filter expression: the AND of its criteria.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FilterExpression {
    criteria: Vec<FilterCriteria>,
}

impl FilterExpression {
    /// Creates an expression from criteria.
    pub fn new(criteria: Vec<FilterCriteria>) -> Self {
        Self { criteria }
    }

    /// The match-all expression.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parses the text form. Whitespace before an attribute is ignored;
    /// whitespace inside a value is kept.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::all());
        }
        let criteria = text
            .split(',')
            .map(|part| parse_criteria(text, part))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { criteria })
    }

    /// Returns the criteria.
    #[inline]
    pub fn criteria(&self) -> &[FilterCriteria] {
        &self.criteria
    }

    /// Returns true if this expression matches everything.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl FromStr for FilterExpression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.criteria.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

fn parse_criteria(expression: &str, part: &str) -> Result<FilterCriteria> {
    let part = part.trim_start();
    if part.is_empty() {
        return Err(Error::invalid_filter(expression, "empty criterion"));
    }
    let op_start = part
        .find(OPERATOR_CHARS)
        .ok_or_else(|| Error::invalid_filter(expression, format!("missing operator in `{}`", part)))?;

    let attribute = part[..op_start].trim();
    if attribute.is_empty() {
        return Err(Error::invalid_filter(expression, format!("missing attribute in `{}`", part)));
    }

    let (operator, token_len) = Operator::match_prefix(&part[op_start..]).ok_or_else(|| {
        Error::invalid_filter(expression, format!("unknown operator in `{}`", part))
    })?;

    let raw_value = &part[op_start + token_len..];
    if let Some(c) = raw_value.chars().find(|&c| c != '#' && is_reserved(c)) {
        return Err(Error::invalid_filter(
            expression,
            format!("reserved character `{}` must be escaped in `{}`", c, part),
        ));
    }

    Ok(FilterCriteria::new(attribute, operator, unescape(raw_value)))
}
