use rdkafka::error::KafkaError;

/// Unified error type for broker producer and consumer operations
///
/// Both the rdkafka-backed clients and the in-process [`MemoryBroker`](super::MemoryBroker)
/// report failures through this type so the flows can treat every broker the same way.
#[derive(Debug)]
pub enum KafkaClientError {
    /// Underlying rdkafka error
    KafkaError(KafkaError),
    /// The broker could not be reached while connecting
    Unreachable { brokers: String, reason: String },
    /// An operation was attempted before `connect` or after `disconnect`
    NotConnected,
    /// A message was produced but the broker rejected it
    Delivery { topic: String, reason: String },
}

impl std::fmt::Display for KafkaClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KafkaClientError::KafkaError(e) => write!(f, "Kafka error: {}", e),
            KafkaClientError::Unreachable { brokers, reason } => {
                write!(f, "Broker {} unreachable: {}", brokers, reason)
            }
            KafkaClientError::NotConnected => write!(f, "Client is not connected"),
            KafkaClientError::Delivery { topic, reason } => {
                write!(f, "Delivery to topic '{}' failed: {}", topic, reason)
            }
        }
    }
}

impl std::error::Error for KafkaClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KafkaClientError::KafkaError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<KafkaError> for KafkaClientError {
    fn from(err: KafkaError) -> Self {
        KafkaClientError::KafkaError(err)
    }
}

impl KafkaClientError {
    /// True when the failure happened before any request reached a broker
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            KafkaClientError::Unreachable { .. } | KafkaClientError::NotConnected
        )
    }
}
