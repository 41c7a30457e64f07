//! Summary handlers: running aggregates over a source's event stream.
//!
//! A handler is configured from text of the form `type[:customRef]` and
//! bound to one attribute. Built-in types map onto the incremental
//! aggregates; `custom` resolves its reference in a [`SummaryCatalog`]
//! when the handler is created, never later.

use crate::aggregate::{IncrementalAvg, IncrementalCount, IncrementalMax, IncrementalMin, IncrementalSum};
use crate::delta::{Delta, EventDeltas};
use core::fmt;
use core::str::FromStr;
use hashbrown::HashMap;
use std::sync::Arc;
use vista_core::{Attribute, Error, Event, Result, Schema, Value};

/// A running aggregate fed with a source's events.
pub trait Summary<T>: Send {
    /// Applies one event. Snapshots and clears replace the running state.
    fn apply(&mut self, event: &Event<T>);

    /// Returns the current value.
    fn value(&self) -> Value;

    /// Discards all accumulated state.
    fn reset(&mut self);
}

/// Summary handler type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SummaryKind {
    Avg,
    Count,
    Custom,
    Max,
    Min,
    Sum,
}

impl SummaryKind {
    /// Parses a handler type name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "avg" => Some(SummaryKind::Avg),
            "count" => Some(SummaryKind::Count),
            "custom" => Some(SummaryKind::Custom),
            "max" => Some(SummaryKind::Max),
            "min" => Some(SummaryKind::Min),
            "sum" => Some(SummaryKind::Sum),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SummaryKind::Avg => "avg",
            SummaryKind::Count => "count",
            SummaryKind::Custom => "custom",
            SummaryKind::Max => "max",
            SummaryKind::Min => "min",
            SummaryKind::Sum => "sum",
        }
    }
}

impl fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parsed summary configuration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SummarySpec {
    pub kind: SummaryKind,
    /// Reference of a custom handler registered in a [`SummaryCatalog`].
    pub custom: Option<String>,
}

impl SummarySpec {
    pub fn new(kind: SummaryKind) -> Self {
        Self { kind, custom: None }
    }

    pub fn custom(reference: impl Into<String>) -> Self {
        Self {
            kind: SummaryKind::Custom,
            custom: Some(reference.into()),
        }
    }

    /// Parses `type[:customRef]`.
    ///
    /// `custom` requires a reference; the reference is ignored for built-in
    /// types.
    pub fn parse(text: &str) -> Result<Self> {
        let (name, reference) = match text.split_once(':') {
            Some((name, reference)) => (name, Some(reference.trim())),
            None => (text, None),
        };
        let kind = SummaryKind::parse(name).ok_or_else(|| Error::unknown_summary(text.trim()))?;
        match (kind, reference) {
            (SummaryKind::Custom, Some(reference)) if !reference.is_empty() => Ok(Self::custom(reference)),
            (SummaryKind::Custom, _) => Err(Error::unknown_summary(text.trim())),
            (kind, _) => Ok(Self::new(kind)),
        }
    }
}

impl FromStr for SummarySpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SummarySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.custom {
            Some(reference) => write!(f, "{}:{}", self.kind, reference),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[derive(Clone, Debug)]
enum Aggregate {
    Count(IncrementalCount),
    Sum(IncrementalSum),
    Avg(IncrementalAvg),
    Min(IncrementalMin),
    Max(IncrementalMax),
}

impl Aggregate {
    fn apply(&mut self, deltas: &[Delta<Value>]) {
        match self {
            Aggregate::Count(a) => a.apply(deltas),
            Aggregate::Sum(a) => a.apply(deltas),
            Aggregate::Avg(a) => a.apply(deltas),
            Aggregate::Min(a) => a.apply(deltas),
            Aggregate::Max(a) => a.apply(deltas),
        }
    }

    fn value(&self) -> Value {
        match self {
            Aggregate::Count(a) => Value::Int64(a.get()),
            Aggregate::Sum(a) => Value::Float64(a.get()),
            Aggregate::Avg(a) => a.get().into(),
            Aggregate::Min(a) => a.get().into(),
            Aggregate::Max(a) => a.get().into(),
        }
    }

    fn reset(&mut self) {
        match self {
            Aggregate::Count(a) => a.reset(),
            Aggregate::Sum(a) => a.reset(),
            Aggregate::Avg(a) => a.reset(),
            Aggregate::Min(a) => a.reset(),
            Aggregate::Max(a) => a.reset(),
        }
    }
}

/// A built-in aggregate bound to one attribute.
pub struct FieldSummary<T> {
    attribute: Attribute<T>,
    aggregate: Aggregate,
}

impl<T> FieldSummary<T> {
    /// Creates a built-in handler. Fails for [`SummaryKind::Custom`].
    pub fn new(kind: SummaryKind, attribute: &Attribute<T>) -> Result<Self> {
        let aggregate = match kind {
            SummaryKind::Count => Aggregate::Count(IncrementalCount::new()),
            SummaryKind::Sum => Aggregate::Sum(IncrementalSum::new()),
            SummaryKind::Avg => Aggregate::Avg(IncrementalAvg::new()),
            SummaryKind::Min => Aggregate::Min(IncrementalMin::new()),
            SummaryKind::Max => Aggregate::Max(IncrementalMax::new()),
            SummaryKind::Custom => return Err(Error::unknown_summary(kind.name())),
        };
        Ok(Self {
            attribute: attribute.clone(),
            aggregate,
        })
    }

    /// Returns the summarized attribute.
    #[inline]
    pub fn attribute(&self) -> &Attribute<T> {
        &self.attribute
    }
}

impl<T> Summary<T> for FieldSummary<T> {
    fn apply(&mut self, event: &Event<T>) {
        let change = EventDeltas::from_event(event, |item| self.attribute.get(item));
        if change.reset {
            self.aggregate.reset();
        }
        self.aggregate.apply(&change.deltas);
    }

    fn value(&self) -> Value {
        self.aggregate.value()
    }

    fn reset(&mut self) {
        self.aggregate.reset();
    }
}

/// Creates a custom handler for an attribute.
pub type SummaryFactory<T> = Arc<dyn Fn(&Attribute<T>) -> Box<dyn Summary<T>> + Send + Sync>;

/// Caller-registered custom summary handlers, looked up by reference.
pub struct SummaryCatalog<T> {
    factories: HashMap<String, SummaryFactory<T>>,
}

impl<T> Default for SummaryCatalog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SummaryCatalog<T> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a custom handler factory, replacing any previous one.
    pub fn register<F>(&mut self, reference: impl Into<String>, factory: F)
    where
        F: Fn(&Attribute<T>) -> Box<dyn Summary<T>> + Send + Sync + 'static,
    {
        self.factories.insert(reference.into(), Arc::new(factory));
    }

    #[inline]
    pub fn contains(&self, reference: &str) -> bool {
        self.factories.contains_key(reference)
    }
}

impl<T: 'static> SummaryCatalog<T> {
    /// Creates the handler for `spec` over the named attribute.
    pub fn create(&self, spec: &SummarySpec, field: &str, schema: &Schema<T>) -> Result<Box<dyn Summary<T>>> {
        let attribute = schema.require(field)?;
        match (&spec.kind, &spec.custom) {
            (SummaryKind::Custom, Some(reference)) => {
                let factory = self
                    .factories
                    .get(reference)
                    .ok_or_else(|| Error::unknown_summary(spec.to_string()))?;
                Ok(factory(attribute))
            }
            (SummaryKind::Custom, None) => Err(Error::unknown_summary(spec.to_string())),
            (kind, _) => Ok(Box::new(FieldSummary::new(*kind, attribute)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_core::DataType;

    struct Item {
        id: u32,
        amount: Option<i64>,
    }

    fn item(id: u32, amount: i64) -> Arc<Item> {
        Arc::new(Item { id, amount: Some(amount) })
    }

    fn schema() -> Schema<Item> {
        Schema::builder("items")
            .unwrap()
            .key(|i: &Item| i.id.to_string())
            .add_attribute("amount", DataType::Int64, |i: &Item| Value::from(i.amount))
            .unwrap()
            .build()
            .unwrap()
    }

    fn create(text: &str) -> Box<dyn Summary<Item>> {
        SummaryCatalog::new()
            .create(&SummarySpec::parse(text).unwrap(), "amount", &schema())
            .unwrap()
    }

    /// Counts items whose amount is even.
    struct EvenCount {
        attribute: Attribute<Item>,
        count: i64,
    }

    impl Summary<Item> for EvenCount {
        fn apply(&mut self, event: &Event<Item>) {
            let change = EventDeltas::from_event(event, |i| self.attribute.get(i));
            if change.reset {
                self.count = 0;
            }
            for d in change.deltas {
                if d.data.as_i64().is_some_and(|v| v % 2 == 0) {
                    self.count += d.diff as i64;
                }
            }
        }

        fn value(&self) -> Value {
            Value::Int64(self.count)
        }

        fn reset(&mut self) {
            self.count = 0;
        }
    }

    #[test]
    fn test_parse_spec() {
        assert_eq!(SummarySpec::parse("SUM").unwrap(), SummarySpec::new(SummaryKind::Sum));
        assert_eq!(SummarySpec::parse("max:ignored").unwrap(), SummarySpec::new(SummaryKind::Max));
        assert_eq!(SummarySpec::parse("custom:even").unwrap(), SummarySpec::custom("even"));
        assert_eq!(SummarySpec::custom("even").to_string(), "custom:even");
    }

    #[test]
    fn test_parse_spec_errors() {
        assert!(matches!(SummarySpec::parse("median"), Err(Error::UnknownSummary { .. })));
        assert!(SummarySpec::parse("custom").is_err());
        assert!(SummarySpec::parse("custom:").is_err());
    }

    #[test]
    fn test_sum_follows_events() {
        let mut sum = create("sum");
        sum.apply(&Event::snapshot(vec![item(1, 10), item(2, 20), item(3, 30)]));
        assert_eq!(sum.value(), Value::Float64(60.0));
        sum.apply(&Event::remove(item(2, 20), 1));
        assert_eq!(sum.value(), Value::Float64(40.0));
        sum.apply(&Event::add(item(4, 5), 0));
        assert_eq!(sum.value(), Value::Float64(45.0));
        sum.apply(&Event::update(item(4, 5), item(4, 15), 0));
        assert_eq!(sum.value(), Value::Float64(55.0));
    }

    #[test]
    fn test_count_and_clear() {
        let mut count = create("count");
        count.apply(&Event::add(item(1, 1), 0));
        count.apply(&Event::add(Arc::new(Item { id: 2, amount: None }), 1));
        assert_eq!(count.value(), Value::Int64(2));
        count.apply(&Event::Clear);
        assert_eq!(count.value(), Value::Int64(0));
    }

    #[test]
    fn test_avg_min_max_null_when_empty() {
        for text in ["avg", "min", "max"] {
            let mut s = create(text);
            assert_eq!(s.value(), Value::Null);
            s.apply(&Event::add(item(1, 4), 0));
            assert_eq!(s.value(), Value::Float64(4.0));
            s.apply(&Event::Destroy);
            assert_eq!(s.value(), Value::Null);
        }
    }

    #[test]
    fn test_custom_handler() {
        let mut catalog = SummaryCatalog::new();
        catalog.register("even", |attribute: &Attribute<Item>| {
            Box::new(EvenCount { attribute: attribute.clone(), count: 0 }) as Box<dyn Summary<Item>>
        });
        let spec = SummarySpec::parse("custom:even").unwrap();
        let mut even = catalog.create(&spec, "amount", &schema()).unwrap();
        even.apply(&Event::snapshot(vec![item(1, 2), item(2, 3), item(3, 4)]));
        assert_eq!(even.value(), Value::Int64(2));

        let missing = SummarySpec::custom("odd");
        assert!(matches!(
            catalog.create(&missing, "amount", &schema()),
            Err(Error::UnknownSummary { .. })
        ));
    }

    #[test]
    fn test_unknown_field() {
        let spec = SummarySpec::new(SummaryKind::Sum);
        assert!(matches!(
            SummaryCatalog::<Item>::new().create(&spec, "price", &schema()),
            Err(Error::UnknownAttribute { .. })
        ));
    }
}
