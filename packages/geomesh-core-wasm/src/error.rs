//! Error types for the polygon geometry engine.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Result type alias for geometry operations.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Errors that can occur while decomposing, triangulating or assembling geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Input data cannot be interpreted (non-finite values, wrong coordinate arity).
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The self-intersection solver could not resolve a polygon.
    #[error("polygon decomposition failed: {0}")]
    Decomposition(String),

    /// The triangulator found its simple-polygon precondition violated.
    #[error("internal consistency error: {0}")]
    InternalConsistency(String),

    /// A configuration value was rejected.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

impl GeometryError {
    /// Create a malformed input error.
    #[must_use]
    pub fn malformed_input(details: impl Into<String>) -> Self {
        Self::MalformedInput(details.into())
    }

    /// Create a decomposition error.
    #[must_use]
    pub fn decomposition(details: impl Into<String>) -> Self {
        Self::Decomposition(details.into())
    }

    /// Create an internal consistency error.
    #[must_use]
    pub fn internal(details: impl Into<String>) -> Self {
        Self::InternalConsistency(details.into())
    }

    /// Create an invalid options error.
    #[must_use]
    pub fn invalid_options(details: impl Into<String>) -> Self {
        Self::InvalidOptions(details.into())
    }

    /// True when the error points at an engine bug rather than bad data.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::InternalConsistency(_))
    }
}

impl From<GeometryError> for JsValue {
    fn from(err: GeometryError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
