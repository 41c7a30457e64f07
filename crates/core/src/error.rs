//! Error types for Vista.

use crate::types::DataType;
use thiserror::Error;

/// Result type alias for Vista operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for Vista operations.
///
/// Configuration errors are raised when a filter, sort, summary or schema is
/// defined; nothing is created when one is returned. Lifecycle misuse
/// (stale handles, double unsubscribe) is never reported through this type.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed filter expression.
    #[error("Invalid filter `{expression}`: {message}")]
    InvalidFilter { expression: String, message: String },
    /// Operator that cannot be applied to the attribute's declared type.
    #[error("Operator {operator} is not supported on {data_type} attribute `{attribute}`")]
    UnsupportedOperator {
        attribute: String,
        operator: String,
        data_type: DataType,
    },
    /// Malformed sort criteria.
    #[error("Invalid sort `{expression}`: {message}")]
    InvalidSort { expression: String, message: String },
    /// Attribute not registered on the schema.
    #[error("Unknown attribute: {attribute}")]
    UnknownAttribute { attribute: String },
    /// Summary handler type or custom reference not known.
    #[error("Unknown summary handler: {name}")]
    UnknownSummary { name: String },
    /// Invalid schema definition.
    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },
    /// Data source or collection not found.
    #[error("Data source not found: {id}")]
    SourceNotFound { id: String },
    /// Session not open.
    #[error("Unknown session: {session}")]
    UnknownSession { session: u64 },
    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    Config { message: String },
    /// Mutation attempted on a derived source.
    #[error("Derived data sources are read-only")]
    ReadOnlySource,
}

impl Error {
    /// Creates a malformed filter error.
    pub fn invalid_filter(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidFilter {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Creates an unsupported operator error.
    pub fn unsupported_operator(
        attribute: impl Into<String>,
        operator: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Error::UnsupportedOperator {
            attribute: attribute.into(),
            operator: operator.into(),
            data_type,
        }
    }

    /// Creates a malformed sort error.
    pub fn invalid_sort(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidSort {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown attribute error.
    pub fn unknown_attribute(attribute: impl Into<String>) -> Self {
        Error::UnknownAttribute {
            attribute: attribute.into(),
        }
    }

    /// Creates an unknown summary handler error.
    pub fn unknown_summary(name: impl Into<String>) -> Self {
        Error::UnknownSummary { name: name.into() }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates a source not found error.
    pub fn source_not_found(id: impl Into<String>) -> Self {
        Error::SourceNotFound { id: id.into() }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Returns true for errors raised while defining a filter, sort or summary.
    ///
    /// The request layer maps these to a rejected subscription.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidFilter { .. }
                | Error::UnsupportedOperator { .. }
                | Error::InvalidSort { .. }
                | Error::UnknownAttribute { .. }
                | Error::UnknownSummary { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::config(e.to_string())
    }
}
