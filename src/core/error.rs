//! SS-000: Error taxonomy for composition and synthesis.
//!
//! Every variant is raised before any document leaves the process and names
//! the identity path(s) involved, so a failing pass can be traced back to the
//! construct that caused it.

use super::types::Shape;
use thiserror::Error;

/// Composition / synthesis failure. Any error aborts the whole pass.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SynthError {
    /// Two siblings share a local name.
    #[error("duplicate name: '{name}' already exists under '{parent}'")]
    DuplicateName { parent: String, name: String },

    /// A local name is empty or contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid name: '{name}' (must match ^[A-Za-z][A-Za-z0-9_-]*$)")]
    InvalidName { name: String },

    #[error("unknown attribute: '{path}' ({resource_type}) has no attribute '{attribute}'")]
    UnknownAttribute {
        path: String,
        resource_type: String,
        attribute: String,
    },

    #[error("unknown output: '{path}' ({resource_type}) has no output '{output}'")]
    UnknownOutput {
        path: String,
        resource_type: String,
        output: String,
    },

    /// A literal attribute value does not match the schema's primitive kind.
    #[error("attribute type: '{path}.{attribute}' expects {expected}, got {found}")]
    AttributeType {
        path: String,
        attribute: String,
        expected: String,
        found: String,
    },

    /// A deferred operand has the wrong shape for where it is used.
    #[error("shape mismatch: {context} expects {expected}, got {found}")]
    ShapeMismatch {
        context: String,
        expected: String,
        found: Shape,
    },

    #[error("invalid template: \"{template}\": {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("unresolved required attribute: '{path}' ({resource_type}) is missing '{attribute}'")]
    UnresolvedRequiredAttribute {
        path: String,
        resource_type: String,
        attribute: String,
    },

    /// A deferred value names a producer that was never declared.
    #[error("dangling reference: '{path}' references undeclared resource '{producer}'")]
    DanglingReference { path: String, producer: String },

    #[error("cyclic reference: {}", cycle.join(" -> "))]
    CyclicReference { cycle: Vec<String> },

    #[error("config error: {0}")]
    Config(String),

    #[error("serialize error: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for SynthError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialize(e.to_string())
    }
}

impl From<serde_yaml_ng::Error> for SynthError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        Self::Serialize(e.to_string())
    }
}

/// Result alias for composition and synthesis.
pub type Result<T> = std::result::Result<T, SynthError>;
