use jsonschema::JSONSchema;
use serde_json::Value;

use crate::mdml::schema::error::{SchemaError, SchemaResult};

/// Most violations reported for one payload
const MAX_VIOLATIONS: usize = 5;

/// A compiled JSON Schema document
pub struct JsonSchemaValidator {
    document: Value,
    compiled: JSONSchema,
}

impl JsonSchemaValidator {
    /// Parses and compiles a schema document given as JSON text
    pub fn compile(document: &str) -> SchemaResult<Self> {
        let document: Value = serde_json::from_str(document)
            .map_err(|e| SchemaError::InvalidDocument(format!("not valid JSON: {}", e)))?;
        Self::compile_value(document)
    }

    pub fn compile_value(document: Value) -> SchemaResult<Self> {
        if !(document.is_object() || document.is_boolean()) {
            return Err(SchemaError::InvalidDocument(
                "a schema must be a JSON object or boolean".to_string(),
            ));
        }
        let compiled = JSONSchema::compile(&document)
            .map_err(|e| SchemaError::InvalidDocument(e.to_string()))?;
        Ok(Self { document, compiled })
    }

    /// The parsed document, e.g. for content comparison
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Checks `instance`, returning the violations when it does not conform
    pub fn validate(&self, instance: &Value) -> Result<(), Vec<String>> {
        self.compiled.validate(instance).map_err(|errors| {
            errors
                .take(MAX_VIOLATIONS)
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{} (at {})", e, path)
                    }
                })
                .collect()
        })
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.compiled.is_valid(instance)
    }
}
