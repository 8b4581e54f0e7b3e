//! Error types for dynamo-linq.

use thiserror::Error;

/// The main error type for query translation.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Failed to parse a textual query chain.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// A host expression has no PartiQL equivalent.
    #[error(
        "The expression '{expression}' could not be translated{}",
        .details.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
    )]
    Untranslatable {
        expression: String,
        details: Option<String>,
    },

    /// The query operator exists in the host language but is not translated.
    #[error("Query operator '{0}' is not supported")]
    UnsupportedOperator(&'static str),

    /// The operator chain is malformed (no root, two roots, ...).
    #[error("Invalid query chain: {0}")]
    InvalidChain(String),

    #[error("Unknown entity type: '{0}'")]
    UnknownEntity(String),

    #[error("Entity type '{entity}' has no property '{property}'")]
    UnknownProperty { entity: String, property: String },

    /// The entity model is inconsistent or could not be loaded.
    #[error("Model error: {0}")]
    Model(String),

    /// An internal invariant was violated; this is a bug, not bad input.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Render error: {0}")]
    Render(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl QueryError {
    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create an untranslatable-expression error.
    pub fn untranslatable(expression: impl ToString, details: Option<String>) -> Self {
        Self::Untranslatable {
            expression: expression.to_string(),
            details,
        }
    }
}

/// Result type alias for translation operations.
pub type QueryResult<T> = Result<T, QueryError>;
