//! Schema Error Types

use crate::mdml::schema::types::SchemaType;

/// Errors raised by schema registries and the registry-backed codec
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The registry could not be reached at all
    #[error("Schema registry at {url} unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    /// No schema is registered under this id
    #[error("Schema with id {0} not found")]
    NotFound(u32),

    /// The registry refused to register the document
    #[error("Schema rejected for subject '{subject}': {reason}")]
    Rejected { subject: String, reason: String },

    /// Any other non-success registry response
    #[error("Schema registry returned HTTP {status}: {message}")]
    Registry { status: u16, message: String },

    /// The schema document is not a usable JSON Schema
    #[error("Invalid JSON Schema document: {0}")]
    InvalidDocument(String),

    #[error("Schema type {0} is not supported by the JSON codec")]
    UnsupportedType(SchemaType),

    /// Payload failed validation against the registered schema
    #[error("Payload does not match schema {schema_id}: {}", .violations.join("; "))]
    Validation {
        schema_id: u32,
        violations: Vec<String>,
    },

    /// Bytes do not carry the registry wire header
    #[error("Malformed message frame: {0}")]
    Frame(String),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid schema registry client configuration: {0}")]
    Configuration(String),
}

impl SchemaError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, SchemaError::Unreachable { .. })
    }

    /// True when the registry itself is failing rather than the payload or schema
    pub fn is_registry_failure(&self) -> bool {
        matches!(
            self,
            SchemaError::Unreachable { .. }
                | SchemaError::Registry { .. }
                | SchemaError::Configuration(_)
        )
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;
