//! Sort criteria and compiled sorters.
//!
//! Criteria are an ordered list of `(attribute, direction)` pairs; earlier
//! pairs take priority and the first non-equal comparison wins. A compiled
//! [`Sorter`] turns an item into a [`Rank`], whose natural order is the
//! order the criteria describe.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;
use vista_core::{Attribute, Error, Result, Schema, Value};

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Parses `ASC` / `DESC`, case-insensitively.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(SortDirection::Ascending),
            "DESC" => Some(SortDirection::Descending),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }

    /// Applies this direction to an ascending comparison.
    #[inline]
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One `attribute=direction` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SortField {
    pub attribute: String,
    pub direction: SortDirection,
}

impl SortField {
    pub fn new(attribute: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            attribute: attribute.into(),
            direction,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attribute, self.direction)
    }
}

/// Ordered sort fields, highest priority first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SortCriteria {
    fields: Vec<SortField>,
}

impl SortCriteria {
    /// Creates criteria, rejecting duplicate attributes.
    pub fn new(fields: Vec<SortField>) -> Result<Self> {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.attribute == field.attribute) {
                let text = fields.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(",");
                return Err(Error::invalid_sort(
                    text,
                    format!("attribute `{}` listed twice", field.attribute),
                ));
            }
        }
        Ok(Self { fields })
    }

    /// Criteria that leave the upstream order unchanged.
    pub fn none() -> Self {
        Self::default()
    }

    /// Parses `attr=ASC|DESC[,attr=ASC|DESC...]`.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::none());
        }
        let mut fields = Vec::new();
        for part in trimmed.split(',') {
            let (attribute, direction) = part
                .split_once('=')
                .ok_or_else(|| Error::invalid_sort(text, format!("expected attr=ASC|DESC, got `{}`", part)))?;
            let attribute = attribute.trim();
            if attribute.is_empty() {
                return Err(Error::invalid_sort(text, format!("missing attribute in `{}`", part)));
            }
            let direction = SortDirection::parse(direction).ok_or_else(|| {
                Error::invalid_sort(text, format!("unknown direction `{}`", direction.trim()))
            })?;
            fields.push(SortField::new(attribute, direction));
        }
        Self::new(fields).map_err(|e| match e {
            Error::InvalidSort { message, .. } => Error::invalid_sort(text, message),
            other => other,
        })
    }

    #[inline]
    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Moves `attribute` to the highest priority with `direction`, or
    /// removes it when `direction` is `None`.
    pub fn promote(&mut self, attribute: &str, direction: Option<SortDirection>) {
        self.fields.retain(|f| f.attribute != attribute);
        if let Some(direction) = direction {
            self.fields.insert(0, SortField::new(attribute, direction));
        }
    }
}

impl FromStr for SortCriteria {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SortCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

/// An attribute value ordered by its field's direction.
#[derive(Clone, Debug)]
pub struct SortValue {
    value: Value,
    direction: SortDirection,
}

impl SortValue {
    pub fn new(value: Value, direction: SortDirection) -> Self {
        Self { value, direction }
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl PartialEq for SortValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortValue {}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.direction.apply(self.value.cmp(&other.value))
    }
}

/// Position-determining tuple of an item under some criteria. Ties are
/// broken by item key by the structures that store ranks.
pub type Rank = Vec<SortValue>;

/// Sort criteria compiled against a schema.
pub struct Sorter<T> {
    criteria: SortCriteria,
    fields: Vec<(Attribute<T>, SortDirection)>,
}

impl<T> Sorter<T> {
    /// Resolves every sort attribute on the schema.
    pub fn compile(criteria: &SortCriteria, schema: &Schema<T>) -> Result<Self> {
        let fields = criteria
            .fields()
            .iter()
            .map(|f| Ok((schema.require(&f.attribute)?.clone(), f.direction)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            criteria: criteria.clone(),
            fields,
        })
    }

    /// The sorter of a root source: every rank is empty.
    pub fn unsorted() -> Self {
        Self {
            criteria: SortCriteria::none(),
            fields: Vec::new(),
        }
    }

    /// Computes an item's rank.
    pub fn rank(&self, item: &T) -> Rank {
        self.fields
            .iter()
            .map(|(attribute, direction)| SortValue::new(attribute.get(item), *direction))
            .collect()
    }

    /// Compares two items; equal ranks compare equal.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        for (attribute, direction) in &self.fields {
            let cmp = attribute.get(a).cmp(&attribute.get(b));
            if cmp != Ordering::Equal {
                return direction.apply(cmp);
            }
        }
        Ordering::Equal
    }

    #[inline]
    pub fn criteria(&self) -> &SortCriteria {
        &self.criteria
    }
}

impl<T> Clone for Sorter<T> {
    fn clone(&self) -> Self {
        Self {
            criteria: self.criteria.clone(),
            fields: self.fields.clone(),
        }
    }
}

impl<T> fmt::Debug for Sorter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sorter")
            .field("criteria", &self.criteria.to_string())
            .finish()
    }
}
