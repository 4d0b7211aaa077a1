//! Consumer flows
//!
//! A consumer connects, subscribes and hands every delivered record to a handler,
//! one at a time in delivery order, until it goes idle for longer than the configured
//! timeout or has received the configured number of records. It always disconnects
//! before returning.

use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::mdml::error::{MdmlError, MdmlResult};
use crate::mdml::flows::example_record::EXAMPLE_TOPIC;
use crate::mdml::kafka::broker::BrokerConsumer;
use crate::mdml::kafka::message::Message;
use crate::mdml::schema::client::SchemaRegistry;
use crate::mdml::schema::error::SchemaResult;
use crate::mdml::schema::serde::RegistrySerde;

/// Turns raw record values into JSON
#[async_trait]
pub trait ValueDecoder: Send + Sync {
    async fn decode_value(&self, data: &[u8]) -> SchemaResult<Value>;
}

#[async_trait]
impl<R: SchemaRegistry> ValueDecoder for RegistrySerde<R> {
    async fn decode_value(&self, data: &[u8]) -> SchemaResult<Value> {
        self.decode(data).await
    }
}

/// Parses values as plain JSON text
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTextDecoder;

#[async_trait]
impl ValueDecoder for JsonTextDecoder {
    async fn decode_value(&self, data: &[u8]) -> SchemaResult<Value> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// What to do with a record whose value cannot be decoded
///
/// A registry that is unreachable or failing stops the consumer under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeFailurePolicy {
    /// Log the record and continue with the next one
    #[default]
    SkipAndLog,
    /// Stop consuming and return the decoding error
    FailFast,
}

impl FromStr for DecodeFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" | "skip-and-log" => Ok(Self::SkipAndLog),
            "fail" | "fail-fast" => Ok(Self::FailFast),
            other => Err(format!(
                "unknown decode failure policy '{}', expected 'skip' or 'fail'",
                other
            )),
        }
    }
}

impl fmt::Display for DecodeFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SkipAndLog => "skip",
            Self::FailFast => "fail",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsumeOptions {
    pub topics: Vec<String>,
    /// Stop after this long without a record; `None` waits forever
    pub idle_timeout: Option<Duration>,
    /// Stop after receiving this many records, decoded or skipped
    pub max_messages: Option<usize>,
    pub on_decode_error: DecodeFailurePolicy,
}

impl ConsumeOptions {
    pub fn new<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: topics.into_iter().map(Into::into).collect(),
            idle_timeout: None,
            max_messages: None,
            on_decode_error: DecodeFailurePolicy::default(),
        }
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    pub fn with_max_messages(mut self, max: usize) -> Self {
        self.max_messages = Some(max);
        self
    }

    pub fn with_decode_failure_policy(mut self, policy: DecodeFailurePolicy) -> Self {
        self.on_decode_error = policy;
        self
    }
}

impl Default for ConsumeOptions {
    fn default() -> Self {
        Self::new([EXAMPLE_TOPIC])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumeSummary {
    /// Records handed to the handler
    pub delivered: usize,
    /// Records dropped because their value could not be decoded
    pub skipped: usize,
}

impl ConsumeSummary {
    pub fn received(&self) -> usize {
        self.delivered + self.skipped
    }
}

/// Pre-registers `schema` under `subject`, then consumes with registry decoding
///
/// Registration guarantees the schema the producer uses is resolvable before the
/// first record arrives.
pub async fn consume_with_schema<C, R, F>(
    consumer: &mut C,
    serde: &RegistrySerde<R>,
    subject: &str,
    schema: &str,
    options: &ConsumeOptions,
    handler: F,
) -> MdmlResult<ConsumeSummary>
where
    C: BrokerConsumer + ?Sized,
    R: SchemaRegistry,
    F: FnMut(&str, i32, Message<Value>),
{
    // registration runs before connect, so a failure leaves nothing to release
    let schema_id = serde
        .register(subject, schema)
        .await
        .map_err(|e| MdmlError::registration(subject, e))?;
    info!("Schema for subject '{}' registered with id {}", subject, schema_id);

    consume(consumer, serde, options, handler).await
}

/// Consumes records whose values are plain JSON text
pub async fn consume_schemaless<C, F>(
    consumer: &mut C,
    options: &ConsumeOptions,
    handler: F,
) -> MdmlResult<ConsumeSummary>
where
    C: BrokerConsumer + ?Sized,
    F: FnMut(&str, i32, Message<Value>),
{
    consume(consumer, &JsonTextDecoder, options, handler).await
}

/// Runs the consume loop with any decoder
pub async fn consume<C, D, F>(
    consumer: &mut C,
    decoder: &D,
    options: &ConsumeOptions,
    mut handler: F,
) -> MdmlResult<ConsumeSummary>
where
    C: BrokerConsumer + ?Sized,
    D: ValueDecoder + ?Sized,
    F: FnMut(&str, i32, Message<Value>),
{
    let outcome = async {
        consumer.connect().await.map_err(MdmlError::broker)?;
        consumer
            .subscribe(&options.topics)
            .await
            .map_err(|e| MdmlError::subscribe(&options.topics, e))?;
        info!("Subscribed to {}", options.topics.join(", "));

        let mut summary = ConsumeSummary::default();
        while options
            .max_messages
            .map_or(true, |max| summary.received() < max)
        {
            let record = match consumer
                .next_record(options.idle_timeout)
                .await
                .map_err(MdmlError::receive)?
            {
                Some(record) => record,
                None => {
                    info!(
                        "No message for {:?}, stopping",
                        options.idle_timeout.unwrap_or_default()
                    );
                    break;
                }
            };

            match decoder.decode_value(&record.value).await {
                Ok(value) => {
                    debug!(
                        "Decoded {}[{}]@{}",
                        record.topic, record.partition, record.offset
                    );
                    let topic = record.topic.clone();
                    let partition = record.partition;
                    handler(&topic, partition, Message::from_record(record, value));
                    summary.delivered += 1;
                }
                Err(e) => {
                    // a failing registry would fail every later record too
                    let skippable = !e.is_registry_failure()
                        && options.on_decode_error == DecodeFailurePolicy::SkipAndLog;
                    let err =
                        MdmlError::decoding(&record.topic, record.partition, record.offset, e);
                    if !skippable {
                        return Err(err);
                    }
                    warn!("Skipping message: {}", err.report());
                    summary.skipped += 1;
                }
            }
        }
        Ok::<_, MdmlError>(summary)
    }
    .await;

    let disconnected = consumer.disconnect().await;
    match (outcome, disconnected) {
        (Ok(summary), Ok(())) => {
            info!(
                "Consumer stopped after {} message(s), {} skipped",
                summary.delivered, summary.skipped
            );
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
