//! Core error types.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while declaring shapes, building schemas, or normalizing data.
#[derive(Debug, Error)]
pub enum Error {
    /// A relation points at a shape that is not registered.
    #[error("invalid shape reference: `{target}` is not a registered shape")]
    InvalidShapeReference {
        /// Entity name the relation tried to reference.
        target: String,
    },

    /// Two different shapes share an entity name, or a shape has an empty name.
    #[error("ambiguous entity name `{entity}`: {reason}")]
    AmbiguousEntityName {
        /// The offending entity name.
        entity: String,
        /// What made it ambiguous.
        reason: String,
    },

    /// Data was singular where the schema expects a sequence, or the reverse.
    #[error("schema arity mismatch for `{entity}`: expected {expected}, got {actual}")]
    SchemaArityMismatch {
        /// Entity the schema node describes.
        entity: String,
        /// Expected input kind.
        expected: &'static str,
        /// Kind of the input actually received.
        actual: &'static str,
    },

    /// Input has the wrong JSON type for the operation.
    #[error("invalid data for `{entity}`: expected {expected}, got {actual}")]
    InvalidData {
        /// Entity the input was meant for.
        entity: String,
        /// Accepted input kinds.
        expected: &'static str,
        /// Kind of the input actually received.
        actual: &'static str,
    },

    /// A record lacks a usable identifier.
    #[error("missing identifier for `{entity}`: {reason}")]
    MissingIdentifier {
        /// Entity the record belongs to.
        entity: String,
        /// Why the identifier could not be extracted.
        reason: String,
    },

    /// Attempted to write a field the shape does not declare.
    #[error("unknown field `{field}` on `{entity}`")]
    UnknownField {
        /// Entity the record belongs to.
        entity: String,
        /// Undeclared field name.
        field: String,
    },

    /// Input nesting went deeper than the configured limit.
    #[error("nesting depth limit of {limit} exceeded at `{entity}`")]
    DepthExceeded {
        /// Entity being normalized when the limit was hit.
        entity: String,
        /// Configured limit.
        limit: usize,
    },

    /// A registry declared the same entity twice.
    #[error("shape `{0}` declared more than once")]
    DuplicateShape(String),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Short name for the kind of a JSON value, used in error messages.
pub(crate) fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
