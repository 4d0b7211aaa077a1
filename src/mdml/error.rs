/*!
# Flow Error Types

Every flow returns [`MdmlError`]. Broker and registry failures arrive as
[`KafkaClientError`] and [`SchemaError`] and are sorted into the flow taxonomy
here; a broker or registry that cannot be reached is always `Connection`, and
so is a registry that answers with a server-side failure while decoding.
*/

use crate::mdml::kafka::kafka_error::KafkaClientError;
use crate::mdml::schema::error::SchemaError;
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum MdmlError {
    /// The broker or schema registry could not be reached
    #[error("Connection to {target} failed")]
    Connection {
        target: String,
        #[source]
        source: BoxedSource,
    },

    #[error("Schema registration for subject '{subject}' failed")]
    SchemaRegistration {
        subject: String,
        #[source]
        source: SchemaError,
    },

    #[error("Encoding failed{}", .schema_id.map(|id| format!(" for schema {}", id)).unwrap_or_default())]
    Encoding {
        schema_id: Option<u32>,
        #[source]
        source: SchemaError,
    },

    #[error("Decoding message {topic}[{partition}]@{offset} failed")]
    Decoding {
        topic: String,
        partition: i32,
        offset: i64,
        #[source]
        source: SchemaError,
    },

    #[error("Publishing to topic '{topic}' failed")]
    Publish {
        topic: String,
        #[source]
        source: KafkaClientError,
    },

    #[error("Subscribing to {topics} failed")]
    Subscribe {
        topics: String,
        #[source]
        source: KafkaClientError,
    },

    #[error("Receiving messages failed")]
    Receive {
        #[source]
        source: KafkaClientError,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl MdmlError {
    /// Helper for failures while establishing or releasing a broker connection
    pub fn broker(source: KafkaClientError) -> Self {
        let target = match &source {
            KafkaClientError::Unreachable { brokers, .. } => format!("broker {}", brokers),
            _ => "broker".to_string(),
        };
        Self::Connection {
            target,
            source: Box::new(source),
        }
    }

    /// Helper for registry failures outside encode/decode, e.g. registration
    pub fn registration(subject: impl Into<String>, source: SchemaError) -> Self {
        match source {
            SchemaError::Unreachable { .. } => Self::registry_connection(source),
            source => Self::SchemaRegistration {
                subject: subject.into(),
                source,
            },
        }
    }

    pub fn encoding(schema_id: Option<u32>, source: SchemaError) -> Self {
        match source {
            SchemaError::Unreachable { .. } => Self::registry_connection(source),
            source => Self::Encoding { schema_id, source },
        }
    }

    /// Registry failures become `Connection`: they say nothing about the message itself
    pub fn decoding(
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
        source: SchemaError,
    ) -> Self {
        if source.is_registry_failure() {
            return Self::registry_connection(source);
        }
        Self::Decoding {
            topic: topic.into(),
            partition,
            offset,
            source,
        }
    }

    pub fn publish(topic: impl Into<String>, source: KafkaClientError) -> Self {
        if source.is_connection_failure() {
            Self::broker(source)
        } else {
            Self::Publish {
                topic: topic.into(),
                source,
            }
        }
    }

    pub fn subscribe(topics: &[String], source: KafkaClientError) -> Self {
        Self::Subscribe {
            topics: topics.join(", "),
            source,
        }
    }

    pub fn receive(source: KafkaClientError) -> Self {
        Self::Receive { source }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    fn registry_connection(source: SchemaError) -> Self {
        let target = match &source {
            SchemaError::Unreachable { url, .. } => format!("schema registry {}", url),
            _ => "schema registry".to_string(),
        };
        Self::Connection {
            target,
            source: Box::new(source),
        }
    }

    /// True for errors caused by a failed or lost connection
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// The message followed by every underlying cause, for logging at the entry points
    pub fn report(&self) -> String {
        let mut report = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            report.push_str(": ");
            report.push_str(&cause.to_string());
            source = cause.source();
        }
        report
    }
}

pub type MdmlResult<T> = Result<T, MdmlError>;
