//! # mdml-streams
//!
//! Kafka producer and consumer flows for MDML experiment data, with optional
//! JSON Schema validation through a Confluent-compatible schema registry.
//!
//! ## Features
//!
//! - **Schemaless publishing**: plain JSON text values
//! - **Schema-registered publishing**: payloads are validated against a registered
//!   JSON Schema and framed with its id (`0x00`, 4-byte big-endian id, JSON bytes)
//! - **Schema-aware consuming**: the embedded id is resolved through the registry and
//!   each decoded record is handed to a handler in delivery order
//! - **Swappable backends**: flows run against rdkafka and the registry REST API, or
//!   against [`MemoryBroker`] and [`InMemorySchemaRegistry`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mdml_streams::{
//!     produce_with_schema, ClientSettings, ExampleRecord, KafkaProducer, RegistrySerde,
//!     SchemaProducerJob, SchemaRegistryClient,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ClientSettings::load(None)?;
//!     let serde = RegistrySerde::new(SchemaRegistryClient::new(&settings.registry_url())?);
//!     let mut producer = KafkaProducer::new(settings.kafka_config());
//!
//!     let summary = produce_with_schema(
//!         &mut producer,
//!         &serde,
//!         &SchemaProducerJob::default(),
//!         &[ExampleRecord::hello_world()],
//!     )
//!     .await?;
//!     println!("published with schema id {:?}", summary.schema_id);
//!     Ok(())
//! }
//! ```

pub mod mdml;

pub use mdml::config::ClientSettings;
pub use mdml::error::{MdmlError, MdmlResult};
pub use mdml::flows::{
    consume, consume_schemaless, consume_with_schema, produce_schemaless, produce_with_schema,
    schemaless_example, ConsumeOptions, ConsumeSummary, DecodeFailurePolicy, ExampleRecord,
    JsonTextDecoder, ProduceSummary, SchemaProducerJob, ValueDecoder, DEFAULT_GROUP_ID,
    EXAMPLE_SCHEMA, EXAMPLE_SUBJECT, EXAMPLE_TOPIC, SCHEMALESS_TOPIC,
};
pub use mdml::kafka::{
    BrokerConsumer, BrokerEndpoints, BrokerProducer, CommonKafkaConfig, ConsumedRecord,
    DeliveryReport, Headers, KafkaClientError, KafkaConsumer, KafkaProducer, MemoryBroker,
    Message, OffsetReset, OutgoingMessage,
};
pub use mdml::schema::{
    InMemorySchemaRegistry, RegisteredSchema, RegistrySerde, SchemaError, SchemaRegistry,
    SchemaRegistryClient, SchemaType,
};
