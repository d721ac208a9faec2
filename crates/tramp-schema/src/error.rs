//! Error types for schema compilation and execution.

/// Boxed error produced by a connection driver.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by a [`Connection`](crate::Connection) implementation.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The connection has not been opened, or was already closed.
    #[error("Connection is not open")]
    NotConnected,

    /// The underlying driver rejected the request.
    #[error(transparent)]
    Driver(BoxError),
}

impl ConnectionError {
    /// Wraps a driver error.
    pub fn driver(error: impl Into<BoxError>) -> Self {
        Self::Driver(error.into())
    }
}

/// Errors that can occur while compiling or executing a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A modifier was requested on a column type that cannot carry it.
    #[error("{modifier} modifier for `{column}` of type {column_type} is unsupported")]
    UnsupportedModifier {
        /// The modifier that was rejected.
        modifier: &'static str,
        /// The column carrying the modifier.
        column: String,
        /// The column's type name.
        column_type: &'static str,
    },

    /// The grammar has no renderer for a column type.
    #[error("The {grammar} grammar cannot render `{column}` of type {column_type}")]
    MissingTypeRenderer {
        /// Grammar name.
        grammar: &'static str,
        /// The column being rendered.
        column: String,
        /// The column's type name.
        column_type: &'static str,
    },

    /// A capability was invoked that the active grammar does not implement.
    #[error("`{capability}` has not been implemented for the {grammar} grammar")]
    NotImplemented {
        /// The missing capability.
        capability: &'static str,
        /// Grammar name.
        grammar: &'static str,
    },

    /// The connection rejected a statement.
    #[error("Failed to execute statement: {sql}")]
    Execution {
        /// The statement that failed.
        sql: String,
        /// The driver error.
        #[source]
        source: ConnectionError,
    },

    /// Connection-level failure outside of statement execution.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Serialization error while rendering string literals.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
