//! In-Memory Schema Registry
//!
//! Suitable for tests and for running the flows without a registry service.
//! Ids are global and content-addressed the way Confluent registries assign them:
//! the same document registered under any subject always gets the same id.

use async_trait::async_trait;
use log::{debug, info};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::mdml::schema::client::registry_client::SchemaRegistry;
use crate::mdml::schema::error::{SchemaError, SchemaResult};
use crate::mdml::schema::json_schema::JsonSchemaValidator;
use crate::mdml::schema::types::{RegisteredSchema, SchemaType};

const MEMORY_URL: &str = "memory://registry";

#[derive(Default)]
struct RegistryState {
    by_id: HashMap<u32, RegisteredSchema>,
    // (type, canonical document) -> id
    by_content: HashMap<(SchemaType, String), u32>,
    // subject -> ids, oldest version first
    subjects: HashMap<String, Vec<u32>>,
    next_id: u32,
}

pub struct InMemorySchemaRegistry {
    state: RwLock<RegistryState>,
    reachable: AtomicBool,
}

impl Default for InMemorySchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySchemaRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState {
                next_id: 1,
                ..RegistryState::default()
            }),
            reachable: AtomicBool::new(true),
        }
    }

    /// Simulates the registry going down; every call fails as unreachable while down
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn ensure_reachable(&self) -> SchemaResult<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SchemaError::Unreachable {
                url: MEMORY_URL.to_string(),
                reason: "registry is down".to_string(),
            })
        }
    }

    /// Schema ids registered under `subject`, in version order
    pub fn subject_versions(&self, subject: &str) -> Vec<u32> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .subjects
            .get(subject)
            .cloned()
            .unwrap_or_default()
    }

    /// Normalizes a document so formatting differences do not produce new ids
    fn canonical_content(
        schema_type: SchemaType,
        schema: &str,
        subject: &str,
    ) -> SchemaResult<String> {
        match schema_type {
            SchemaType::Json => {
                let validator = JsonSchemaValidator::compile(schema).map_err(|e| {
                    SchemaError::Rejected {
                        subject: subject.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(canonical_json(validator.document()))
            }
            SchemaType::Avro | SchemaType::Protobuf => Ok(schema.trim().to_string()),
        }
    }
}

/// Compact JSON text with object keys sorted at every level
fn canonical_json(document: &Value) -> String {
    match document {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let fields: Vec<String> = entries
                .into_iter()
                .map(|(key, value)| {
                    format!("{}:{}", Value::from(key.as_str()), canonical_json(value))
                })
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        scalar => scalar.to_string(),
    }
}

#[async_trait]
impl SchemaRegistry for InMemorySchemaRegistry {
    async fn register(
        &self,
        schema_type: SchemaType,
        schema: &str,
        subject: &str,
    ) -> SchemaResult<u32> {
        self.ensure_reachable()?;
        let content = Self::canonical_content(schema_type, schema, subject)?;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let id = match state.by_content.get(&(schema_type, content.clone())) {
            Some(id) => *id,
            None => {
                let id = state.next_id;
                state.next_id += 1;
                state.by_id.insert(
                    id,
                    RegisteredSchema {
                        id,
                        schema_type,
                        schema: schema.to_string(),
                    },
                );
                state.by_content.insert((schema_type, content), id);
                info!("Registered new {} schema with id {}", schema_type, id);
                id
            }
        };

        let versions = state.subjects.entry(subject.to_string()).or_default();
        if !versions.contains(&id) {
            versions.push(id);
            debug!("Subject '{}' is now at version {}", subject, versions.len());
        }
        Ok(id)
    }

    async fn get_schema(&self, id: u32) -> SchemaResult<RegisteredSchema> {
        self.ensure_reachable()?;
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .get(&id)
            .cloned()
            .ok_or(SchemaError::NotFound(id))
    }
}
