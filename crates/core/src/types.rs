//! Data type definitions for Vista attributes.
//!
//! Every attribute registered on a [`Schema`](crate::Schema) declares one of
//! these types. Filter operators are resolved against the declared type, not
//! against whatever value an accessor happens to return at runtime.

use core::fmt;

/// Declared value type of an item attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean type (true/false)
    Boolean,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point number
    Float64,
    /// UTF-8 string
    String,
    /// Set of strings, compared by membership
    Set,
    /// String-keyed map, compared by key membership
    Map,
}

impl DataType {
    /// Returns whether values of this type can be summed or averaged.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int32 | DataType::Int64 | DataType::Float64)
    }

    /// Returns whether values of this type hold several elements.
    pub fn is_collection(&self) -> bool {
        matches!(self, DataType::Set | DataType::Map)
    }

    /// Returns the lowercase name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Int32 => "integer",
            DataType::Int64 => "long",
            DataType::Float64 => "double",
            DataType::String => "string",
            DataType::Set => "set",
            DataType::Map => "map",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
