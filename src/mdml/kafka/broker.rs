//! Broker client seam
//!
//! The flows talk to a broker only through these two traits. [`KafkaProducer`] and
//! [`KafkaConsumer`] implement them on top of rdkafka; [`MemoryBroker`] implements them
//! in-process.
//!
//! [`KafkaProducer`]: super::KafkaProducer
//! [`KafkaConsumer`]: super::KafkaConsumer
//! [`MemoryBroker`]: super::MemoryBroker

use async_trait::async_trait;
use std::time::Duration;

use crate::mdml::kafka::kafka_error::KafkaClientError;
use crate::mdml::kafka::message::{ConsumedRecord, DeliveryReport, OutgoingMessage};

#[async_trait]
pub trait BrokerProducer: Send {
    /// Establishes the broker connection; must precede `send`
    async fn connect(&mut self) -> Result<(), KafkaClientError>;

    /// Appends `messages` to `topic`, in order, returning one report per message
    async fn send(
        &mut self,
        topic: &str,
        messages: Vec<OutgoingMessage>,
    ) -> Result<Vec<DeliveryReport>, KafkaClientError>;

    /// Flushes outstanding messages and releases the connection
    ///
    /// Calling it on a client that never connected is a no-op.
    async fn disconnect(&mut self) -> Result<(), KafkaClientError>;
}

#[async_trait]
pub trait BrokerConsumer: Send {
    async fn connect(&mut self) -> Result<(), KafkaClientError>;

    async fn subscribe(&mut self, topics: &[String]) -> Result<(), KafkaClientError>;

    /// Waits for the next record
    ///
    /// Returns `Ok(None)` when `timeout` elapses first. With no timeout it waits
    /// until a record arrives.
    async fn next_record(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<ConsumedRecord>, KafkaClientError>;

    /// Leaves the group and releases the connection; a no-op when not connected
    async fn disconnect(&mut self) -> Result<(), KafkaClientError>;
}
