//! Typed attribute accessors.

use crate::types::DataType;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Extracts an attribute value from an item.
pub type AccessorFn<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// Extracts the identity key from an item.
pub type KeyFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// A named, typed attribute of an item type.
pub struct Attribute<T> {
    name: String,
    data_type: DataType,
    ordinal: usize,
    accessor: AccessorFn<T>,
}

impl<T> Attribute<T> {
    pub(crate) fn new(name: String, data_type: DataType, ordinal: usize, accessor: AccessorFn<T>) -> Self {
        Self {
            name,
            data_type,
            ordinal,
            accessor,
        }
    }

    /// Returns the attribute name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared data type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the declaration position within the schema.
    #[inline]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Reads the attribute from an item.
    #[inline]
    pub fn get(&self, item: &T) -> Value {
        (self.accessor)(item)
    }

    /// Returns a shareable handle to the accessor.
    pub fn accessor(&self) -> AccessorFn<T> {
        Arc::clone(&self.accessor)
    }
}

impl<T> Clone for Attribute<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            data_type: self.data_type,
            ordinal: self.ordinal,
            accessor: Arc::clone(&self.accessor),
        }
    }
}

impl<T> fmt::Debug for Attribute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("data_type", &self.data_type)
            .field("ordinal", &self.ordinal)
            .finish()
    }
}
