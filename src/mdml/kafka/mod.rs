pub mod broker;
pub mod common_config;
pub mod context;
pub mod headers;
pub mod kafka_consumer;
pub mod kafka_error;
pub mod kafka_producer;
pub mod memory_broker;
pub mod message;
pub mod utils;

pub use broker::{BrokerConsumer, BrokerProducer};
pub use common_config::{BrokerEndpoints, CommonKafkaConfig, EndpointError, OffsetReset};
pub use context::LoggingClientContext;
pub use headers::Headers;
pub use kafka_consumer::KafkaConsumer;
pub use kafka_error::KafkaClientError;
pub use kafka_producer::KafkaProducer;
pub use memory_broker::{MemoryBroker, MemoryConsumer, MemoryProducer};
pub use message::{ConsumedRecord, DeliveryReport, Message, OutgoingMessage};
pub use utils::convert_kafka_log_level;
