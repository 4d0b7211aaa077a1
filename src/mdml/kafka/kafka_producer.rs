use async_trait::async_trait;
use log::{debug, error, info};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;

use crate::mdml::kafka::broker::BrokerProducer;
use crate::mdml::kafka::common_config::CommonKafkaConfig;
use crate::mdml::kafka::context::LoggingClientContext;
use crate::mdml::kafka::kafka_error::KafkaClientError;
use crate::mdml::kafka::message::{DeliveryReport, OutgoingMessage};

/// A wrapper around rdkafka's `FutureProducer`
///
/// The underlying client is created by [`connect`](BrokerProducer::connect), which also
/// probes the cluster metadata so an unreachable broker fails fast instead of on the
/// first send. [`disconnect`](BrokerProducer::disconnect) flushes and drops it.
pub struct KafkaProducer {
    config: CommonKafkaConfig,
    producer: Option<FutureProducer<LoggingClientContext>>,
}

impl KafkaProducer {
    pub fn new(config: CommonKafkaConfig) -> Self {
        Self {
            config,
            producer: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.producer.is_some()
    }

    fn unreachable(&self, reason: impl ToString) -> KafkaClientError {
        KafkaClientError::Unreachable {
            brokers: self.config.brokers.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl BrokerProducer for KafkaProducer {
    async fn connect(&mut self) -> Result<(), KafkaClientError> {
        if self.producer.is_some() {
            return Ok(());
        }

        let producer: FutureProducer<LoggingClientContext> = self
            .config
            .producer_client_config()
            .create_with_context(LoggingClientContext::producer())?;

        // fetch_metadata blocks the calling thread
        let probe = producer.clone();
        let timeout = self.config.request_timeout;
        tokio::task::spawn_blocking(move || {
            probe
                .client()
                .fetch_metadata(None, Timeout::After(timeout))
        })
        .await
        .map_err(|e| self.unreachable(e))?
        .map_err(|e| self.unreachable(e))?;

        info!("Created KafkaProducer connected to {}", self.config.brokers);
        self.producer = Some(producer);
        Ok(())
    }

    async fn send(
        &mut self,
        topic: &str,
        messages: Vec<OutgoingMessage>,
    ) -> Result<Vec<DeliveryReport>, KafkaClientError> {
        let producer = self.producer.as_ref().ok_or(KafkaClientError::NotConnected)?;
        let queue_timeout = Timeout::After(self.config.request_timeout);
        let mut reports = Vec::with_capacity(messages.len());

        for message in &messages {
            let mut record: FutureRecord<'_, [u8], [u8]> =
                FutureRecord::to(topic).payload(message.value.as_slice());
            if let Some(key) = message.key.as_deref() {
                record = record.key(key);
            }
            if !message.headers.is_empty() {
                record = record.headers(message.headers.to_rdkafka_headers());
            }
            if let Some(ts) = message.timestamp {
                record = record.timestamp(ts);
            }

            match producer.send(record, queue_timeout).await {
                Ok((partition, offset)) => {
                    debug!(
                        "Message sent to topic '{}' partition {} offset {}",
                        topic, partition, offset
                    );
                    reports.push(DeliveryReport {
                        topic: topic.to_string(),
                        partition,
                        offset,
                    });
                }
                Err((err, _)) => {
                    error!("Failed to send message to topic '{}': {}", topic, err);
                    return Err(KafkaClientError::Delivery {
                        topic: topic.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(reports)
    }

    async fn disconnect(&mut self) -> Result<(), KafkaClientError> {
        let Some(producer) = self.producer.take() else {
            return Ok(());
        };

        let timeout = self.config.request_timeout;
        let flushed = tokio::task::spawn_blocking(move || producer.flush(Timeout::After(timeout)))
            .await
            .map_err(|e| self.unreachable(e))?;
        info!("KafkaProducer disconnected from {}", self.config.brokers);
        flushed.map_err(KafkaClientError::from)
    }
}
