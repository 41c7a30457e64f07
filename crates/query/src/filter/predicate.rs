//! Typed predicates compiled from filter criteria.
//!
//! Compilation resolves each operator against the attribute's declared type
//! once, when the filter is defined. Invalid operator/type pairs are
//! rejected there; evaluation never fails.

use super::operator::Operator;
use super::parser::FilterCriteria;
use hashbrown::HashSet;
use vista_core::{Attribute, DataType, Error, Result, Value};

/// The comparison selected for an operator/type pair.
#[derive(Clone, Debug)]
enum Test {
    /// Documented always-false default (ordering on booleans).
    Never,
    Eq(Value),
    Ne(Value),
    Ge(Value),
    Le(Value),
    OneOf(HashSet<Value>),
    Prefix(String),
    HasElement(String),
    LacksElement(String),
    ElementPrefix(String),
    HasAnyElement(Vec<String>),
    /// Null, or empty for strings and collections.
    Empty,
    NotEmpty,
    /// Strictly null.
    Null,
    NotNull,
}

/// A single compiled criterion bound to its attribute accessor.
pub struct Predicate<T> {
    criteria: FilterCriteria,
    attribute: Attribute<T>,
    test: Test,
}

impl<T> Predicate<T> {
    /// Resolves `criteria` against the attribute's declared type.
    pub fn compile(criteria: FilterCriteria, attribute: &Attribute<T>) -> Result<Self> {
        let test = resolve(&criteria, attribute.data_type())?;
        Ok(Self {
            criteria,
            attribute: attribute.clone(),
            test,
        })
    }

    /// Returns the source criterion.
    #[inline]
    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Evaluates the predicate against an item.
    pub fn eval(&self, item: &T) -> bool {
        let value = self.attribute.get(item);
        self.eval_value(&value)
    }

    fn eval_value(&self, value: &Value) -> bool {
        if value.is_null() {
            return matches!(
                self.test,
                Test::Ne(_) | Test::LacksElement(_) | Test::Empty | Test::Null
            );
        }

        let declared = self.attribute.data_type();
        if !is_compatible(declared, value) {
            tracing::warn!(
                target: "vista_query::filter",
                attribute = self.attribute.name(),
                declared = %declared,
                actual = ?value.data_type(),
                "attribute value does not match its declared type"
            );
            return false;
        }

        match &self.test {
            Test::Never => false,
            Test::Eq(expected) => value == expected,
            Test::Ne(expected) => value != expected,
            Test::Ge(bound) => value >= bound,
            Test::Le(bound) => value <= bound,
            Test::OneOf(set) => set.contains(value),
            Test::Prefix(prefix) => value.as_str().is_some_and(|s| s.starts_with(prefix.as_str())),
            Test::HasElement(e) => has_element(value, e),
            Test::LacksElement(e) => !has_element(value, e),
            Test::ElementPrefix(prefix) => elements(value).any(|e| e.starts_with(prefix.as_str())),
            Test::HasAnyElement(wanted) => wanted.iter().any(|w| has_element(value, w)),
            Test::Empty => value.is_empty(),
            Test::NotEmpty => !value.is_empty(),
            Test::Null => false,
            Test::NotNull => true,
        }
    }
}

/// Picks the test for an operator applied to a declared type.
fn resolve(criteria: &FilterCriteria, data_type: DataType) -> Result<Test> {
    let unsupported = || {
        Error::unsupported_operator(
            criteria.attribute.as_str(),
            criteria.operator.token(),
            data_type,
        )
    };
    let literal = |raw: &str| parse_literal(criteria, data_type, raw);
    let value = criteria.value.as_str();

    let test = match (criteria.operator, data_type) {
        (Operator::IsNull, DataType::String | DataType::Set | DataType::Map) => Test::Empty,
        (Operator::IsNotNull, DataType::String | DataType::Set | DataType::Map) => Test::NotEmpty,
        (Operator::IsNull, _) => Test::Null,
        (Operator::IsNotNull, _) => Test::NotNull,

        (Operator::Equals, DataType::Set | DataType::Map) => Test::HasElement(value.to_string()),
        (Operator::NotEquals, DataType::Set | DataType::Map) => Test::LacksElement(value.to_string()),
        (Operator::Equals, _) => Test::Eq(literal(value)?),
        (Operator::NotEquals, _) => Test::Ne(literal(value)?),

        (Operator::GreaterThanOrEqual | Operator::LessThanOrEqual, DataType::Boolean) => Test::Never,
        (Operator::GreaterThanOrEqual | Operator::LessThanOrEqual, DataType::Set | DataType::Map) => {
            return Err(unsupported())
        }
        (Operator::GreaterThanOrEqual, _) => Test::Ge(literal(value)?),
        (Operator::LessThanOrEqual, _) => Test::Le(literal(value)?),

        (Operator::StartsWith, DataType::String) => Test::Prefix(value.to_string()),
        (Operator::StartsWith, DataType::Set | DataType::Map) => Test::ElementPrefix(value.to_string()),
        (Operator::StartsWith, _) => return Err(unsupported()),

        (Operator::Contains, DataType::Boolean) => return Err(unsupported()),
        (Operator::Contains, DataType::Set | DataType::Map) => {
            Test::HasAnyElement(criteria.alternatives().map(str::to_string).collect())
        }
        (Operator::Contains, _) => Test::OneOf(
            criteria
                .alternatives()
                .map(literal)
                .collect::<Result<HashSet<_>>>()?,
        ),
    };
    Ok(test)
}

/// Parses a comparison literal as the declared scalar type.
fn parse_literal(criteria: &FilterCriteria, data_type: DataType, raw: &str) -> Result<Value> {
    let invalid = || {
        Error::invalid_filter(
            criteria.to_string(),
            format!("`{}` is not a valid {} value", raw, data_type),
        )
    };
    let value = match data_type {
        DataType::String => Value::String(raw.to_string()),
        DataType::Int32 | DataType::Int64 => Value::Int64(raw.trim().parse().map_err(|_| invalid())?),
        DataType::Float64 => Value::Float64(raw.trim().parse().map_err(|_| invalid())?),
        DataType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => return Err(invalid()),
        },
        DataType::Set | DataType::Map => return Err(invalid()),
    };
    Ok(value)
}

fn is_compatible(declared: DataType, value: &Value) -> bool {
    match (declared, value) {
        (DataType::Int32 | DataType::Int64, Value::Int32(_) | Value::Int64(_)) => true,
        (DataType::Float64, Value::Int32(_) | Value::Int64(_) | Value::Float64(_)) => true,
        (declared, value) => value.data_type() == Some(declared),
    }
}

fn has_element(value: &Value, element: &str) -> bool {
    match value {
        Value::Set(set) => set.contains(element),
        Value::Map(map) => map.contains_key(element),
        _ => false,
    }
}

fn elements(value: &Value) -> Box<dyn Iterator<Item = &String> + '_> {
    match value {
        Value::Set(set) => Box::new(set.iter()),
        Value::Map(map) => Box::new(map.keys()),
        _ => Box::new(core::iter::empty()),
    }
}
