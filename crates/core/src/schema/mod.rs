//! Schema definitions for item types.
//!
//! A `Schema<T>` is the context object shared by collections, derived
//! sources and aggregators. It owns the key extractor and the attribute
//! accessor table for one item type, registered explicitly through
//! [`SchemaBuilder`].

mod attribute;

pub use attribute::{AccessorFn, Attribute, KeyFn};

use crate::error::{Error, Result};
use crate::types::DataType;
use crate::value::Value;
use hashbrown::HashMap;
use std::fmt;
use std::sync::Arc;

/// Key extractor and attribute table for an item type.
pub struct Schema<T> {
    /// Item type name, used in diagnostics.
    name: String,
    key: KeyFn<T>,
    /// Attributes in declaration order.
    attributes: Vec<Attribute<T>>,
    by_name: HashMap<String, usize>,
}

impl<T> Schema<T> {
    /// Starts building a schema for the named item type.
    pub fn builder(name: impl Into<String>) -> Result<SchemaBuilder<T>> {
        SchemaBuilder::new(name)
    }

    /// Returns the item type name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extracts the identity key of an item.
    #[inline]
    pub fn key_of(&self, item: &T) -> String {
        (self.key)(item)
    }

    /// Returns the attributes in declaration order.
    #[inline]
    pub fn attributes(&self) -> &[Attribute<T>] {
        &self.attributes
    }

    /// Gets an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute<T>> {
        self.by_name.get(name).map(|&i| &self.attributes[i])
    }

    /// Gets an attribute by name, failing with `UnknownAttribute`.
    pub fn require(&self, name: &str) -> Result<&Attribute<T>> {
        self.attribute(name)
            .ok_or_else(|| Error::unknown_attribute(name))
    }

    /// Gets an attribute by its declaration position.
    pub fn attribute_at(&self, ordinal: usize) -> Option<&Attribute<T>> {
        self.attributes.get(ordinal)
    }

    /// Reads a named attribute from an item.
    pub fn value_of(&self, item: &T, name: &str) -> Option<Value> {
        self.attribute(name).map(|a| a.get(item))
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Builder for creating schemas.
pub struct SchemaBuilder<T> {
    name: String,
    key: Option<KeyFn<T>>,
    attributes: Vec<Attribute<T>>,
}

impl<T> SchemaBuilder<T> {
    /// Creates a new schema builder.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;
        Ok(Self {
            name,
            key: None,
            attributes: Vec::new(),
        })
    }

    /// Validates a name follows naming rules.
    ///
    /// Attribute names may not contain filter operator characters or
    /// separators, otherwise expressions over them could not be parsed.
    fn check_naming_rules(name: &str) -> Result<()> {
        let Some(first) = name.chars().next() else {
            return Err(Error::invalid_schema("Name cannot be empty"));
        };
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(Error::invalid_schema(format!(
                "Name must start with letter or underscore: {}",
                name
            )));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            return Err(Error::invalid_schema(format!(
                "Name contains invalid characters: {}",
                name
            )));
        }
        Ok(())
    }

    /// Sets the key extraction function.
    pub fn key<F>(mut self, key: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.key = Some(Arc::new(key));
        self
    }

    /// Registers a typed attribute accessor.
    pub fn add_attribute<F>(mut self, name: impl Into<String>, data_type: DataType, accessor: F) -> Result<Self>
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        let name = name.into();
        Self::check_naming_rules(&name)?;
        if self.attributes.iter().any(|a| a.name() == name) {
            return Err(Error::invalid_schema(format!(
                "Attribute already exists: {}",
                name
            )));
        }
        let ordinal = self.attributes.len();
        self.attributes
            .push(Attribute::new(name, data_type, ordinal, Arc::new(accessor)));
        Ok(self)
    }

    /// Builds the schema.
    pub fn build(self) -> Result<Schema<T>> {
        let key = self.key.ok_or_else(|| {
            Error::invalid_schema(format!("Schema {} has no key extractor", self.name))
        })?;
        let by_name = self
            .attributes
            .iter()
            .map(|a| (a.name().to_string(), a.ordinal()))
            .collect();
        Ok(Schema {
            name: self.name,
            key,
            attributes: self.attributes,
            by_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Order {
        id: u32,
        status: &'static str,
        amount: i64,
    }

    fn order_schema() -> Schema<Order> {
        Schema::builder("orders")
            .unwrap()
            .key(|o: &Order| o.id.to_string())
            .add_attribute("status", DataType::String, |o: &Order| Value::from(o.status))
            .unwrap()
            .add_attribute("amount", DataType::Int64, |o: &Order| Value::Int64(o.amount))
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_schema_builder() {
        let schema = order_schema();
        assert_eq!(schema.name(), "orders");
        assert_eq!(schema.attributes().len(), 2);
        assert_eq!(schema.attribute("amount").unwrap().ordinal(), 1);
        assert_eq!(schema.attribute_at(0).unwrap().name(), "status");
    }

    #[test]
    fn test_schema_accessors() {
        let schema = order_schema();
        let order = Order {
            id: 7,
            status: "Active",
            amount: 120,
        };
        assert_eq!(schema.key_of(&order), "7");
        assert_eq!(schema.value_of(&order, "status"), Some(Value::from("Active")));
        assert_eq!(schema.value_of(&order, "amount"), Some(Value::Int64(120)));
        assert_eq!(schema.value_of(&order, "missing"), None);
    }

    #[test]
    fn test_require_unknown_attribute() {
        let schema = order_schema();
        assert!(matches!(
            schema.require("nope"),
            Err(Error::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn test_duplicate_attribute() {
        let result = Schema::<Order>::builder("orders")
            .unwrap()
            .add_attribute("a", DataType::Int32, |_| Value::Null)
            .unwrap()
            .add_attribute("a", DataType::Int32, |_| Value::Null);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_names() {
        assert!(Schema::<Order>::builder("").is_err());
        assert!(Schema::<Order>::builder("1orders").is_err());
        let result = Schema::<Order>::builder("orders")
            .unwrap()
            .add_attribute("a=b", DataType::Int32, |_| Value::Null);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_key() {
        let result = Schema::<Order>::builder("orders").unwrap().build();
        assert!(matches!(result, Err(Error::InvalidSchema { .. })));
    }
}
