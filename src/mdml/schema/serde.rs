//! Registry-backed JSON codec
//!
//! Encoding validates a payload against the schema registered under an id and frames
//! it with that id; decoding reads the id back out of the frame, fetches the schema and
//! validates the payload before returning it.

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::mdml::schema::client::SchemaRegistry;
use crate::mdml::schema::error::{SchemaError, SchemaResult};
use crate::mdml::schema::json_schema::JsonSchemaValidator;
use crate::mdml::schema::types::SchemaType;
use crate::mdml::schema::wire;

pub struct RegistrySerde<R> {
    registry: R,
    validators: RwLock<HashMap<u32, Arc<JsonSchemaValidator>>>,
}

impl<R: SchemaRegistry> RegistrySerde<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            validators: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a JSON Schema document under `subject`
    pub async fn register(&self, subject: &str, schema: &str) -> SchemaResult<u32> {
        self.registry.register(SchemaType::Json, schema, subject).await
    }

    async fn validator(&self, schema_id: u32) -> SchemaResult<Arc<JsonSchemaValidator>> {
        if let Some(validator) = self
            .validators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&schema_id)
        {
            return Ok(Arc::clone(validator));
        }

        let registered = self.registry.get_schema(schema_id).await?;
        if registered.schema_type != SchemaType::Json {
            return Err(SchemaError::UnsupportedType(registered.schema_type));
        }
        let validator = Arc::new(JsonSchemaValidator::compile(&registered.schema)?);
        debug!("Compiled JSON schema {}", schema_id);

        self.validators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(schema_id, Arc::clone(&validator));
        Ok(validator)
    }

    /// Validates `payload` against schema `schema_id` and frames it for the wire
    pub async fn encode<T: Serialize + ?Sized>(
        &self,
        schema_id: u32,
        payload: &T,
    ) -> SchemaResult<Vec<u8>> {
        let validator = self.validator(schema_id).await?;
        let value = serde_json::to_value(payload)?;
        validator
            .validate(&value)
            .map_err(|violations| SchemaError::Validation {
                schema_id,
                violations,
            })?;
        let body = serde_json::to_vec(&value)?;
        Ok(wire::frame(schema_id, &body).to_vec())
    }

    /// Unframes `data`, resolving its embedded schema id, and validates the payload
    pub async fn decode(&self, data: &[u8]) -> SchemaResult<Value> {
        let (schema_id, body) = wire::unframe(data)?;
        let validator = self.validator(schema_id).await?;
        let value: Value = serde_json::from_slice(body)?;
        validator
            .validate(&value)
            .map_err(|violations| SchemaError::Validation {
                schema_id,
                violations,
            })?;
        Ok(value)
    }

    pub async fn decode_as<T: DeserializeOwned>(&self, data: &[u8]) -> SchemaResult<T> {
        let value = self.decode(data).await?;
        Ok(serde_json::from_value(value)?)
    }
}
