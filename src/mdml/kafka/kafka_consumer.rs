use async_trait::async_trait;
use log::{debug, info};
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message as KafkaMessage;
use rdkafka::util::Timeout;
use std::sync::Arc;
use std::time::Duration;

use crate::mdml::kafka::broker::BrokerConsumer;
use crate::mdml::kafka::common_config::{CommonKafkaConfig, OffsetReset};
use crate::mdml::kafka::context::LoggingClientContext;
use crate::mdml::kafka::headers::Headers;
use crate::mdml::kafka::kafka_error::KafkaClientError;
use crate::mdml::kafka::message::ConsumedRecord;

/// A wrapper around rdkafka's `StreamConsumer` joined to a single consumer group
///
/// ```rust,no_run
/// use mdml_streams::{
///     BrokerConsumer, BrokerEndpoints, CommonKafkaConfig, KafkaConsumer, OffsetReset,
/// };
/// use std::time::Duration;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CommonKafkaConfig::new(BrokerEndpoints::parse("localhost:9092")?);
/// let mut consumer = KafkaConsumer::new(config, "test-group", OffsetReset::Earliest);
/// consumer.connect().await?;
/// consumer.subscribe(&["mdml-example-kafkajs".to_string()]).await?;
/// if let Some(record) = consumer.next_record(Some(Duration::from_secs(5))).await? {
///     println!("{}[{}]@{}", record.topic, record.partition, record.offset);
/// }
/// consumer.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub struct KafkaConsumer {
    config: CommonKafkaConfig,
    group_id: String,
    offset_reset: OffsetReset,
    consumer: Option<Arc<StreamConsumer<LoggingClientContext>>>,
}

impl KafkaConsumer {
    pub fn new(
        config: CommonKafkaConfig,
        group_id: impl Into<String>,
        offset_reset: OffsetReset,
    ) -> Self {
        Self {
            config,
            group_id: group_id.into(),
            offset_reset,
            consumer: None,
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn is_connected(&self) -> bool {
        self.consumer.is_some()
    }

    fn unreachable(&self, reason: impl ToString) -> KafkaClientError {
        KafkaClientError::Unreachable {
            brokers: self.config.brokers.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl BrokerConsumer for KafkaConsumer {
    async fn connect(&mut self) -> Result<(), KafkaClientError> {
        if self.consumer.is_some() {
            return Ok(());
        }

        let consumer: StreamConsumer<LoggingClientContext> = self
            .config
            .consumer_client_config(&self.group_id, self.offset_reset)
            .create_with_context(LoggingClientContext::consumer())?;
        let consumer = Arc::new(consumer);

        let probe = Arc::clone(&consumer);
        let timeout = self.config.request_timeout;
        tokio::task::spawn_blocking(move || probe.fetch_metadata(None, Timeout::After(timeout)))
            .await
            .map_err(|e| self.unreachable(e))?
            .map_err(|e| self.unreachable(e))?;

        info!(
            "Created KafkaConsumer for group '{}' connected to {}",
            self.group_id, self.config.brokers
        );
        self.consumer = Some(consumer);
        Ok(())
    }

    async fn subscribe(&mut self, topics: &[String]) -> Result<(), KafkaClientError> {
        let consumer = self.consumer.as_ref().ok_or(KafkaClientError::NotConnected)?;
        let topics: Vec<&str> = topics.iter().map(String::as_str).collect();
        consumer.subscribe(&topics)?;
        info!("Group '{}' subscribed to {:?}", self.group_id, topics);
        Ok(())
    }

    async fn next_record(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<ConsumedRecord>, KafkaClientError> {
        let consumer = self.consumer.as_ref().ok_or(KafkaClientError::NotConnected)?;

        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, consumer.recv()).await {
                Ok(received) => received,
                Err(_) => return Ok(None),
            },
            None => consumer.recv().await,
        };
        let message = received?;

        let record = ConsumedRecord {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            key: message.key().map(<[u8]>::to_vec),
            // a tombstone surfaces as an empty value and fails decoding downstream
            value: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            headers: message
                .headers()
                .map(Headers::from_rdkafka_headers)
                .unwrap_or_default(),
            timestamp: message.timestamp().to_millis(),
        };
        debug!(
            "Received message from {}[{}] at offset {}",
            record.topic, record.partition, record.offset
        );
        Ok(Some(record))
    }

    async fn disconnect(&mut self) -> Result<(), KafkaClientError> {
        let Some(consumer) = self.consumer.take() else {
            return Ok(());
        };
        consumer.unsubscribe();
        info!("KafkaConsumer for group '{}' disconnected", self.group_id);
        Ok(())
    }
}
