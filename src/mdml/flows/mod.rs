//! The producer and consumer flows
//!
//! Every flow takes its broker client and registry as arguments, so the same code
//! runs against rdkafka and the Confluent registry or against the in-memory doubles.

pub mod consumer;
pub mod example_record;
pub mod producer;

pub use consumer::{
    consume, consume_schemaless, consume_with_schema, ConsumeOptions, ConsumeSummary,
    DecodeFailurePolicy, JsonTextDecoder, ValueDecoder,
};
pub use example_record::{
    schemaless_example, ExampleRecord, DEFAULT_GROUP_ID, EXAMPLE_SCHEMA, EXAMPLE_SUBJECT,
    EXAMPLE_TOPIC, SCHEMALESS_TOPIC,
};
pub use producer::{produce_schemaless, produce_with_schema, ProduceSummary, SchemaProducerJob};
