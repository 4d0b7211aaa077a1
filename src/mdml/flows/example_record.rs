//! The tutorial record, its schema and the names the flows use by default

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::mdml::kafka::utils::now_millis;

/// Topic of the schema-registered flows
pub const EXAMPLE_TOPIC: &str = "mdml-example-kafkajs";
/// Subject the example schema is registered under (`<topic>-value`)
pub const EXAMPLE_SUBJECT: &str = "mdml-example-kafkajs-value";
/// Topic of the schemaless flows
pub const SCHEMALESS_TOPIC: &str = "mdml-kafkajs-test-topic";
pub const DEFAULT_GROUP_ID: &str = "test-group";

/// JSON Schema for [`ExampleRecord`]
pub const EXAMPLE_SCHEMA: &str = r##"{
  "definitions" : {
    "record:examples.Test" : {
      "type" : "object",
      "required" : [ "description_string", "some_value" ],
      "additionalProperties" : false,
      "properties" : {
        "time" : {
          "type": "number"
        },
        "description_string" : {
          "type": "string"
        },
        "some_value" : {
          "type" : "number"
        }
      }
    }
  },
  "$ref" : "#/definitions/record:examples.Test"
}"##;

/// Payload described by [`EXAMPLE_SCHEMA`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleRecord {
    /// Timestamp; any JSON number, the producers here use milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    pub description_string: String,
    pub some_value: f64,
}

impl ExampleRecord {
    /// A record stamped with the current time
    pub fn new(description: impl Into<String>, some_value: f64) -> Self {
        Self {
            time: Some(now_millis() as f64),
            description_string: description.into(),
            some_value,
        }
    }

    pub fn hello_world() -> Self {
        Self::new("Hello, World!", 12.345)
    }
}

/// The object the schemaless producer publishes
pub fn schemaless_example() -> Value {
    json!({
        "string": "Hello world",
        "number": 12.345
    })
}
