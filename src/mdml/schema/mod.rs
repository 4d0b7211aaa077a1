//! Schema registry clients and the registry-framed JSON codec

pub mod client;
pub mod error;
pub mod json_schema;
pub mod serde;
pub mod types;
pub mod wire;

pub use client::{
    AuthConfig, InMemorySchemaRegistry, RegistryClientConfig, SchemaRegistry,
    SchemaRegistryClient,
};
pub use error::{SchemaError, SchemaResult};
pub use json_schema::JsonSchemaValidator;
pub use self::serde::RegistrySerde;
pub use types::{topic_value_subject, RegisteredSchema, SchemaType};
