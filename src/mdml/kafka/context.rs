use crate::mdml::kafka::utils::convert_kafka_log_level;
use log::{debug, error, warn};
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::consumer::ConsumerContext;
use rdkafka::error::{KafkaError, KafkaResult};
use rdkafka::{ClientContext, TopicPartitionList};

/// Client context that forwards librdkafka's internal logging to the `log` facade
///
/// Shared by the producer and the consumer; the consumer side additionally logs
/// offset commit outcomes.
#[derive(Debug, Clone, Default)]
pub struct LoggingClientContext {
    role: &'static str,
}

impl LoggingClientContext {
    pub fn producer() -> Self {
        Self { role: "producer" }
    }

    pub fn consumer() -> Self {
        Self { role: "consumer" }
    }
}

impl ClientContext for LoggingClientContext {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, message: &str) {
        // fac is librdkafka's facility, e.g. "BROKER" or "TOPIC"
        log::log!(
            convert_kafka_log_level(level),
            "Kafka {} log ({}): {}",
            self.role,
            fac,
            message
        );
    }

    fn error(&self, error: KafkaError, reason: &str) {
        error!("Kafka {} client error: {:?}, reason: {}", self.role, error, reason);
    }
}

impl ConsumerContext for LoggingClientContext {
    fn commit_callback(&self, result: KafkaResult<()>, offsets: &TopicPartitionList) {
        match result {
            Ok(()) => debug!("Committed offsets: {:?}", offsets),
            Err(e) => warn!("Offset commit failed: {}", e),
        }
    }
}
