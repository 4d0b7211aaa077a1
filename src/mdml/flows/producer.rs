//! Producer flows
//!
//! Both flows connect, publish every payload in order and disconnect, on the
//! failure path as well as the success path. Nothing is retried.

use log::{debug, error, info, warn};
use serde::Serialize;
use std::time::Duration;

use crate::mdml::error::{MdmlError, MdmlResult};
use crate::mdml::flows::example_record::{EXAMPLE_SCHEMA, EXAMPLE_TOPIC};
use crate::mdml::kafka::broker::BrokerProducer;
use crate::mdml::kafka::kafka_error::KafkaClientError;
use crate::mdml::kafka::message::{DeliveryReport, OutgoingMessage};
use crate::mdml::schema::client::SchemaRegistry;
use crate::mdml::schema::error::SchemaError;
use crate::mdml::schema::serde::RegistrySerde;
use crate::mdml::schema::types::topic_value_subject;

/// What a producer flow published
#[derive(Debug, Clone, PartialEq)]
pub struct ProduceSummary {
    /// Id the payloads were encoded with; `None` for schemaless publishing
    pub schema_id: Option<u32>,
    pub deliveries: Vec<DeliveryReport>,
}

/// Parameters of the schema-registered producer
#[derive(Debug, Clone)]
pub struct SchemaProducerJob {
    pub topic: String,
    pub subject: String,
    pub schema: String,
    /// Pause between consecutive sends
    pub interval: Duration,
}

impl SchemaProducerJob {
    /// Publishes to `topic` with the example schema under `<topic>-value`
    pub fn new(topic: impl Into<String>) -> Self {
        let topic = topic.into();
        Self {
            subject: topic_value_subject(&topic),
            topic,
            schema: EXAMPLE_SCHEMA.to_string(),
            interval: Duration::ZERO,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for SchemaProducerJob {
    fn default() -> Self {
        Self::new(EXAMPLE_TOPIC)
    }
}

/// Registers the job's schema, then publishes each payload encoded against it
pub async fn produce_with_schema<P, R, T>(
    producer: &mut P,
    serde: &RegistrySerde<R>,
    job: &SchemaProducerJob,
    payloads: &[T],
) -> MdmlResult<ProduceSummary>
where
    P: BrokerProducer + ?Sized,
    R: SchemaRegistry,
    T: Serialize,
{
    let outcome = async {
        let schema_id = serde
            .register(&job.subject, &job.schema)
            .await
            .map_err(|e| MdmlError::registration(&job.subject, e))?;
        info!(
            "Schema for subject '{}' registered with id {}",
            job.subject, schema_id
        );

        producer.connect().await.map_err(MdmlError::broker)?;

        let mut deliveries = Vec::with_capacity(payloads.len());
        for (index, payload) in payloads.iter().enumerate() {
            if index > 0 && !job.interval.is_zero() {
                tokio::time::sleep(job.interval).await;
            }
            let value = serde
                .encode(schema_id, payload)
                .await
                .map_err(|e| MdmlError::encoding(Some(schema_id), e))?;
            deliveries.push(send_one(producer, &job.topic, OutgoingMessage::new(value)).await?);
        }
        Ok::<_, MdmlError>(ProduceSummary {
            schema_id: Some(schema_id),
            deliveries,
        })
    }
    .await;

    finish(producer, outcome).await
}

/// Publishes each payload as JSON text without any schema
pub async fn produce_schemaless<P, T>(
    producer: &mut P,
    topic: &str,
    payloads: &[T],
    interval: Duration,
) -> MdmlResult<ProduceSummary>
where
    P: BrokerProducer + ?Sized,
    T: Serialize,
{
    let outcome = async {
        producer.connect().await.map_err(MdmlError::broker)?;

        let mut deliveries = Vec::with_capacity(payloads.len());
        for (index, payload) in payloads.iter().enumerate() {
            if index > 0 && !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
            let text = serde_json::to_string(payload)
                .map_err(|e| MdmlError::encoding(None, SchemaError::Json(e)))?;
            deliveries.push(send_one(producer, topic, OutgoingMessage::new(text)).await?);
        }
        Ok::<_, MdmlError>(ProduceSummary {
            schema_id: None,
            deliveries,
        })
    }
    .await;

    finish(producer, outcome).await
}

async fn send_one<P>(
    producer: &mut P,
    topic: &str,
    message: OutgoingMessage,
) -> MdmlResult<DeliveryReport>
where
    P: BrokerProducer + ?Sized,
{
    let mut reports = producer.send(topic, vec![message]).await.map_err(|e| {
        error!("Failed to publish to '{}': {}", topic, e);
        MdmlError::publish(topic, e)
    })?;
    let report = reports.pop().ok_or_else(|| {
        MdmlError::publish(
            topic,
            KafkaClientError::Delivery {
                topic: topic.to_string(),
                reason: "no delivery report returned".to_string(),
            },
        )
    })?;
    debug!(
        "Delivered to {}[{}]@{}",
        report.topic, report.partition, report.offset
    );
    Ok(report)
}

/// Disconnects whatever the outcome; a disconnect failure only surfaces when nothing else failed
async fn finish<P>(
    producer: &mut P,
    outcome: MdmlResult<ProduceSummary>,
) -> MdmlResult<ProduceSummary>
where
    P: BrokerProducer + ?Sized,
{
    let disconnected = producer.disconnect().await;
    match (outcome, disconnected) {
        (Ok(summary), Ok(())) => {
            info!("Published {} message(s)", summary.deliveries.len());
            Ok(summary)
        }
        (Ok(_), Err(e)) => Err(MdmlError::broker(e)),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(disconnect_error)) => {
            warn!("Disconnect after failure also failed: {}", disconnect_error);
            Err(e)
        }
    }
}
